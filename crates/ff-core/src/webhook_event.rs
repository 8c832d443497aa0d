// SPDX-License-Identifier: MIT

//! Raw inbound webhook deliveries, persisted before processing.

use crate::project::ProjectId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

crate::define_id! {
    /// Unique identifier for a stored webhook delivery.
    pub struct WebhookEventId("whe-");
}

/// Where the webhook processing pipeline left off for this delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingState {
    Pending,
    Processing,
    Success,
    Failed,
}

crate::simple_display! {
    ProcessingState {
        Pending => "pending",
        Processing => "processing",
        Success => "success",
        Failed => "failed",
    }
}

#[derive(Debug, Error)]
#[error("invalid processing state: {0}")]
pub struct ParseProcessingStateError(pub String);

impl FromStr for ProcessingState {
    type Err = ParseProcessingStateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "processing" => Ok(Self::Processing),
            "success" => Ok(Self::Success),
            "failed" => Ok(Self::Failed),
            other => Err(ParseProcessingStateError(other.to_string())),
        }
    }
}

/// The event category as reported by the `X-GitHub-Event` header (or
/// equivalent on other forges).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WebhookEventType {
    Push,
    PullRequest,
    Ping,
    Other(String),
}

impl WebhookEventType {
    pub fn from_header(value: &str) -> Self {
        match value {
            "push" => Self::Push,
            "pull_request" => Self::PullRequest,
            "ping" => Self::Ping,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Push => "push",
            Self::PullRequest => "pull_request",
            Self::Ping => "ping",
            Self::Other(s) => s.as_str(),
        }
    }
}

/// One raw webhook delivery, persisted verbatim before any processing so
/// a bad signature or crash mid-dispatch never loses the payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookEvent {
    pub id: WebhookEventId,
    /// The forge's own delivery identifier (e.g. GitHub's `X-GitHub-Delivery`).
    /// Unique — enforced by the storage layer — so replays are rejected.
    pub delivery_id: String,
    pub event_type: WebhookEventType,
    pub project_id: Option<ProjectId>,
    pub payload: serde_json::Value,
    pub signature_valid: bool,
    pub state: ProcessingState,
    pub triggered_build_id: Option<crate::build::BuildId>,
    pub received_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
    pub error: Option<String>,
}

impl WebhookEvent {
    pub fn new(
        delivery_id: impl Into<String>,
        event_type: WebhookEventType,
        payload: serde_json::Value,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: WebhookEventId::new(),
            delivery_id: delivery_id.into(),
            event_type,
            project_id: None,
            payload,
            signature_valid: false,
            state: ProcessingState::Pending,
            triggered_build_id: None,
            received_at: now,
            processed_at: None,
            error: None,
        }
    }

    /// True if this delivery's event type warrants a build: pushes always,
    /// pull requests only on `opened`/`synchronize`/`reopened` actions
    /// (read from the payload's `action` field), pings never.
    pub fn should_trigger_build(&self) -> bool {
        match &self.event_type {
            WebhookEventType::Push => true,
            WebhookEventType::PullRequest => matches!(
                self.payload.get("action").and_then(|v| v.as_str()),
                Some("opened") | Some("synchronize") | Some("reopened")
            ),
            WebhookEventType::Ping | WebhookEventType::Other(_) => false,
        }
    }

    /// A delivery the pipeline decided not to act on (no matching project,
    /// or an event type/action that never triggers a build) is still a
    /// successfully processed delivery.
    pub fn mark_ignored(&mut self, now: DateTime<Utc>) {
        self.state = ProcessingState::Success;
        self.processed_at = Some(now);
    }

    pub fn mark_rejected(&mut self, reason: impl Into<String>, now: DateTime<Utc>) {
        self.state = ProcessingState::Failed;
        self.error = Some(reason.into());
        self.processed_at = Some(now);
    }

    pub fn mark_dispatched(&mut self, build_id: crate::build::BuildId, now: DateTime<Utc>) {
        self.state = ProcessingState::Success;
        self.triggered_build_id = Some(build_id);
        self.processed_at = Some(now);
    }
}

#[cfg(test)]
#[path = "webhook_event_tests.rs"]
mod tests;
