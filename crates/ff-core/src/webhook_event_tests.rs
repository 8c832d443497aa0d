// SPDX-License-Identifier: MIT

use super::*;
use serde_json::json;

#[test]
fn push_always_triggers() {
    let ev = WebhookEvent::new("d1", WebhookEventType::Push, json!({}), Utc::now());
    assert!(ev.should_trigger_build());
}

#[test]
fn ping_never_triggers() {
    let ev = WebhookEvent::new("d1", WebhookEventType::Ping, json!({}), Utc::now());
    assert!(!ev.should_trigger_build());
}

#[test]
fn pull_request_triggers_only_on_relevant_actions() {
    for action in ["opened", "synchronize", "reopened"] {
        let ev = WebhookEvent::new(
            "d1",
            WebhookEventType::PullRequest,
            json!({ "action": action }),
            Utc::now(),
        );
        assert!(ev.should_trigger_build(), "expected {action} to trigger");
    }
    for action in ["closed", "labeled", "assigned"] {
        let ev = WebhookEvent::new(
            "d1",
            WebhookEventType::PullRequest,
            json!({ "action": action }),
            Utc::now(),
        );
        assert!(!ev.should_trigger_build(), "expected {action} not to trigger");
    }
}

#[test]
fn event_type_from_header_falls_back_to_other() {
    assert_eq!(WebhookEventType::from_header("push"), WebhookEventType::Push);
    assert_eq!(
        WebhookEventType::from_header("issue_comment"),
        WebhookEventType::Other("issue_comment".into())
    );
}

#[test]
fn mark_rejected_records_reason_and_timestamp() {
    let mut ev = WebhookEvent::new("d1", WebhookEventType::Push, json!({}), Utc::now());
    let now = Utc::now();
    ev.mark_rejected("bad signature", now);
    assert_eq!(ev.state, ProcessingState::Failed);
    assert_eq!(ev.error.as_deref(), Some("bad signature"));
    assert_eq!(ev.processed_at, Some(now));
}

#[test]
fn processing_state_round_trips_through_str() {
    for s in ["pending", "processing", "success", "failed"] {
        let parsed: ProcessingState = s.parse().unwrap();
        assert_eq!(parsed.to_string(), s);
    }
}
