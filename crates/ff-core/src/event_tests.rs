// SPDX-License-Identifier: MIT

use super::*;
use crate::agent::AgentId;
use crate::job::JobId;

#[test]
fn event_kind_tag_is_stable() {
    let kind = EventKind::JobCreated { job_id: JobId::new() };
    assert_eq!(kind.tag(), "job-created");
}

#[test]
fn event_wraps_kind_with_timestamp() {
    let now = Utc::now();
    let event = Event::new(EventKind::AgentStarted { agent_id: AgentId::new() }, now);
    assert_eq!(event.published_at, now);
    assert_eq!(event.kind.tag(), "agent-started");
}

#[test]
fn event_kind_serializes_with_kebab_case_tag() {
    let kind = EventKind::WorkflowPhaseCompleted {
        job_id: JobId::new(),
        phase: "build_firmware".into(),
        success: true,
    };
    let json = serde_json::to_value(&kind).unwrap();
    assert_eq!(json["kind"], "workflow-phase-completed");
    assert_eq!(json["success"], true);
}

#[test]
fn job_progress_carries_percent_complete() {
    let kind = EventKind::JobProgress { job_id: JobId::new(), task_name: "flash_device".into(), progress: 100 };
    assert_eq!(kind.tag(), "job-progress");
}
