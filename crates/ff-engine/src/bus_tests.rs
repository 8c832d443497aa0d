// SPDX-License-Identifier: MIT

use super::*;
use ff_core::{AgentId, EventKind};
use std::sync::atomic::{AtomicUsize, Ordering};

fn event(kind: EventKind) -> Event {
    Event::new(kind, chrono::Utc::now())
}

#[tokio::test]
async fn publish_before_start_is_an_error() {
    let bus = EventBus::new();
    let result = bus.publish(event(EventKind::SystemStatus { message: "hi".into() })).await;
    assert!(matches!(result, Err(BusError::NotStarted)));
}

#[tokio::test]
async fn subscriber_receives_events_in_publication_order() {
    let bus = EventBus::new();
    let (subscriber, mut rx) = ChannelSubscriber::new();
    bus.subscribe(None, subscriber);
    bus.start().unwrap();

    bus.publish(event(EventKind::SystemStatus { message: "first".into() })).await.unwrap();
    bus.publish(event(EventKind::SystemStatus { message: "second".into() })).await.unwrap();

    let first = rx.recv().await.unwrap();
    let second = rx.recv().await.unwrap();
    assert_eq!(first.kind, EventKind::SystemStatus { message: "first".into() });
    assert_eq!(second.kind, EventKind::SystemStatus { message: "second".into() });
}

#[tokio::test]
async fn kind_filtered_subscriber_only_sees_matching_events() {
    let bus = EventBus::new();
    let (subscriber, mut rx) = ChannelSubscriber::new();
    bus.subscribe(Some("system-status"), subscriber);
    bus.start().unwrap();

    bus.publish(event(EventKind::JobCreated { job_id: ff_core::JobId::new() })).await.unwrap();
    bus.publish(event(EventKind::SystemStatus { message: "only this one".into() })).await.unwrap();

    let received = rx.recv().await.unwrap();
    assert_eq!(received.kind, EventKind::SystemStatus { message: "only this one".into() });
}

struct CountingSubscriber(Arc<AtomicUsize>);

#[async_trait]
impl EventSubscriber for CountingSubscriber {
    async fn on_event(&self, _event: &Event) -> bool {
        self.0.fetch_add(1, Ordering::SeqCst);
        true
    }
}

#[tokio::test]
async fn every_subscriber_sees_every_matching_event_at_most_once() {
    let bus = EventBus::new();
    let count_a = Arc::new(AtomicUsize::new(0));
    let count_b = Arc::new(AtomicUsize::new(0));
    bus.subscribe(None, Arc::new(CountingSubscriber(count_a.clone())));
    bus.subscribe(None, Arc::new(CountingSubscriber(count_b.clone())));
    bus.start().unwrap();

    for _ in 0..5 {
        bus.publish(event(EventKind::AgentStarted { agent_id: AgentId::new() })).await.unwrap();
    }
    bus.stop().await.unwrap();

    assert_eq!(count_a.load(Ordering::SeqCst), 5);
    assert_eq!(count_b.load(Ordering::SeqCst), 5);
}

#[tokio::test]
async fn publish_sync_delivers_from_a_blocking_thread() {
    let bus = EventBus::new();
    let (subscriber, mut rx) = ChannelSubscriber::new();
    bus.subscribe(None, subscriber);
    bus.start().unwrap();

    let bus_clone = bus.clone();
    tokio::task::spawn_blocking(move || {
        bus_clone.publish_sync(event(EventKind::SystemStatus { message: "from sync".into() }))
    })
    .await
    .unwrap()
    .unwrap();

    let received = rx.recv().await.unwrap();
    assert_eq!(received.kind, EventKind::SystemStatus { message: "from sync".into() });
}

#[tokio::test]
async fn starting_twice_is_an_error() {
    let bus = EventBus::new();
    bus.start().unwrap();
    assert!(matches!(bus.start(), Err(BusError::AlreadyStarted)));
}

#[tokio::test]
async fn stop_returns_even_when_other_handles_are_still_held() {
    let bus = EventBus::new();
    let kept_clone = bus.clone();
    bus.start().unwrap();

    tokio::time::timeout(std::time::Duration::from_secs(1), bus.stop()).await.expect("stop() must not hang").unwrap();

    drop(kept_clone);
}

#[tokio::test]
async fn a_subscriber_whose_receiver_was_dropped_is_purged_after_one_failed_delivery() {
    let bus = EventBus::new();
    let (subscriber, rx) = ChannelSubscriber::new();
    drop(rx);
    bus.subscribe(None, subscriber);
    bus.start().unwrap();

    bus.publish(event(EventKind::SystemStatus { message: "first".into() })).await.unwrap();
    bus.publish(event(EventKind::SystemStatus { message: "second".into() })).await.unwrap();
    bus.stop().await.unwrap();

    assert_eq!(bus.shared.subscriptions.lock().len(), 0);
}
