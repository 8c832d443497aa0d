// SPDX-License-Identifier: MIT

//! The closed set of events carried on the in-process event bus and
//! fanned out to `/ws` subscribers. Adding a new kind is a deliberate,
//! reviewed change — consumers are expected to exhaustively match.

use crate::agent::AgentId;
use crate::job::JobId;
use crate::log::LogLevel;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Discriminant for [`Event`], closed by design: the bus promises
/// at-most-once delivery per subscriber for exactly this set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum EventKind {
    AgentStatusChanged { agent_id: AgentId },
    AgentStarted { agent_id: AgentId },
    AgentStopped { agent_id: AgentId },
    JobCreated { job_id: JobId },
    JobStarted { job_id: JobId },
    JobProgress { job_id: JobId, task_name: String, progress: u8 },
    JobCompleted { job_id: JobId },
    JobFailed { job_id: JobId, error: String },
    JobCancelled { job_id: JobId },
    WorkflowPhaseStarted { job_id: JobId, phase: String },
    WorkflowPhaseCompleted { job_id: JobId, phase: String, success: bool },
    LogEntry { level: LogLevel, message: String },
    MetricUpdate { metric_type: String, value: f64 },
    SystemStatus { message: String },
}

impl EventKind {
    /// Stable string tag, used for WebSocket client-side filtering and
    /// structured log fields.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::AgentStatusChanged { .. } => "agent-status-changed",
            Self::AgentStarted { .. } => "agent-started",
            Self::AgentStopped { .. } => "agent-stopped",
            Self::JobCreated { .. } => "job-created",
            Self::JobStarted { .. } => "job-started",
            Self::JobProgress { .. } => "job-progress",
            Self::JobCompleted { .. } => "job-completed",
            Self::JobFailed { .. } => "job-failed",
            Self::JobCancelled { .. } => "job-cancelled",
            Self::WorkflowPhaseStarted { .. } => "workflow-phase-started",
            Self::WorkflowPhaseCompleted { .. } => "workflow-phase-completed",
            Self::LogEntry { .. } => "log-entry",
            Self::MetricUpdate { .. } => "metric-update",
            Self::SystemStatus { .. } => "system-status",
        }
    }
}

/// An envelope wrapping an [`EventKind`] with the instant it was published.
/// Sequence numbers are assigned by the bus itself, not here, so
/// construction never requires bus access.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub kind: EventKind,
    pub published_at: DateTime<Utc>,
}

impl Event {
    pub fn new(kind: EventKind, now: DateTime<Utc>) -> Self {
        Self { kind, published_at: now }
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
