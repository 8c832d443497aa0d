// SPDX-License-Identifier: MIT

//! Process-wide event bus (C6): a bounded queue feeding a single
//! dispatcher, which fans published events out to registered subscribers.
//! Modeled on the teacher's `EventBus` — a channel wrapped so that
//! mutation handlers can `emit()` without knowing whether the caller is
//! sync or async — generalized here to support many subscribers instead
//! of one WAL writer.

use async_trait::async_trait;
use ff_core::Event;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

const QUEUE_CAPACITY: usize = 1024;
const SUBSCRIBER_CAPACITY: usize = 256;

#[derive(Debug, thiserror::Error)]
pub enum BusError {
    #[error("event bus has not been started")]
    NotStarted,
    #[error("event bus has already been started")]
    AlreadyStarted,
    #[error("event bus queue is closed")]
    Closed,
}

/// Registered to receive events. `kind_tag` filters delivery to events
/// whose `EventKind::tag()` matches; `None` subscribes to every kind (the
/// shape the WebSocket hub needs to rebroadcast everything).
#[async_trait]
pub trait EventSubscriber: Send + Sync {
    /// Returns `false` once this subscriber can never receive another
    /// event — the dispatcher purges it from the subscription list rather
    /// than retrying delivery to it forever.
    async fn on_event(&self, event: &Event) -> bool;
}

struct Subscription {
    kind_tag: Option<&'static str>,
    subscriber: Arc<dyn EventSubscriber>,
}

enum DispatcherState {
    NotStarted(mpsc::Receiver<Event>),
    Running(JoinHandle<()>),
    Stopped,
}

struct Shared {
    tx: Mutex<Option<mpsc::Sender<Event>>>,
    subscriptions: Mutex<Vec<Subscription>>,
    state: Mutex<DispatcherState>,
}

/// Handle to the bus. Cheap to clone; every clone shares the same queue
/// and subscriber list. The sender lives behind the shared `Arc` (not one
/// per clone) so that `stop()` can actually close the channel by dropping
/// the single shared sender, rather than one of several still-live clones.
#[derive(Clone)]
pub struct EventBus {
    shared: Arc<Shared>,
}

impl EventBus {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel(QUEUE_CAPACITY);
        Self {
            shared: Arc::new(Shared {
                tx: Mutex::new(Some(tx)),
                subscriptions: Mutex::new(Vec::new()),
                state: Mutex::new(DispatcherState::NotStarted(rx)),
            }),
        }
    }

    /// Register a subscriber for every event, or only events whose tag
    /// matches `kind_tag`. Call before `start()` is typical but not
    /// required — new subscriptions take effect for the next event.
    pub fn subscribe(&self, kind_tag: Option<&'static str>, subscriber: Arc<dyn EventSubscriber>) {
        self.shared.subscriptions.lock().push(Subscription { kind_tag, subscriber });
    }

    /// Spawn the dispatcher. Errors if called twice.
    pub fn start(&self) -> Result<(), BusError> {
        let mut state = self.shared.state.lock();
        let rx = match std::mem::replace(&mut *state, DispatcherState::Stopped) {
            DispatcherState::NotStarted(rx) => rx,
            other => {
                *state = other;
                return Err(BusError::AlreadyStarted);
            }
        };
        let shared = self.shared.clone();
        let handle = tokio::spawn(dispatch_loop(rx, shared));
        *state = DispatcherState::Running(handle);
        Ok(())
    }

    /// Drain remaining queued events and halt the dispatcher.
    pub async fn stop(&self) -> Result<(), BusError> {
        let handle = {
            let mut state = self.shared.state.lock();
            match std::mem::replace(&mut *state, DispatcherState::Stopped) {
                DispatcherState::Running(handle) => Some(handle),
                DispatcherState::NotStarted(rx) => {
                    *state = DispatcherState::NotStarted(rx);
                    None
                }
                DispatcherState::Stopped => None,
            }
        };
        self.shared.tx.lock().take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }
        Ok(())
    }

    /// Publish from an async context. Blocks (backpressures the caller)
    /// when the queue is saturated; never drops.
    pub async fn publish(&self, event: Event) -> Result<(), BusError> {
        if matches!(*self.shared.state.lock(), DispatcherState::NotStarted(_)) {
            return Err(BusError::NotStarted);
        }
        let tx = self.shared.tx.lock().clone().ok_or(BusError::Closed)?;
        tx.send(event).await.map_err(|_| BusError::Closed)
    }

    /// Publish from a non-async context without deadlocking the runtime.
    /// Must not be called from within an async task on a current-thread
    /// runtime — it blocks the calling OS thread until queue space frees.
    pub fn publish_sync(&self, event: Event) -> Result<(), BusError> {
        if matches!(*self.shared.state.lock(), DispatcherState::NotStarted(_)) {
            return Err(BusError::NotStarted);
        }
        let tx = self.shared.tx.lock().clone().ok_or(BusError::Closed)?;
        tx.blocking_send(event).map_err(|_| BusError::Closed)
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

async fn dispatch_loop(mut rx: mpsc::Receiver<Event>, shared: Arc<Shared>) {
    while let Some(event) = rx.recv().await {
        let tag = event.kind.tag();
        let targets: Vec<Arc<dyn EventSubscriber>> = shared
            .subscriptions
            .lock()
            .iter()
            .filter(|sub| sub.kind_tag.map_or(true, |t| t == tag))
            .map(|sub| sub.subscriber.clone())
            .collect();

        let mut dead: Vec<*const ()> = Vec::new();
        for subscriber in &targets {
            if !subscriber.on_event(&event).await {
                dead.push(Arc::as_ptr(subscriber) as *const ());
            }
        }
        if !dead.is_empty() {
            shared.subscriptions.lock().retain(|sub| !dead.contains(&(Arc::as_ptr(&sub.subscriber) as *const ())));
        }
    }
}

/// Fan-out adapter used by tests and by `/ws` to observe every event
/// through a bounded mpsc channel instead of implementing the trait.
pub struct ChannelSubscriber {
    tx: mpsc::Sender<Event>,
}

impl ChannelSubscriber {
    pub fn new() -> (Arc<Self>, mpsc::Receiver<Event>) {
        let (tx, rx) = mpsc::channel(SUBSCRIBER_CAPACITY);
        (Arc::new(Self { tx }), rx)
    }
}

#[async_trait]
impl EventSubscriber for ChannelSubscriber {
    async fn on_event(&self, event: &Event) -> bool {
        match self.tx.send(event.clone()).await {
            Ok(()) => true,
            Err(_) => {
                tracing::warn!(kind = event.kind.tag(), "subscriber channel closed, dropping forwarder");
                false
            }
        }
    }
}

#[cfg(test)]
#[path = "bus_tests.rs"]
mod tests;
