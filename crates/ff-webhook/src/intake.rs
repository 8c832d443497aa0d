// SPDX-License-Identifier: MIT

//! The inbound delivery pipeline: verify, persist, decide, dispatch.

use crate::payload::{self, CommitInfo};
use crate::signature;
use ff_adapters::RepositoryManager;
use ff_core::build::{Build, TriggerOrigin};
use ff_core::webhook_event::{WebhookEvent, WebhookEventType};
use ff_core::{Clock, Project};
use ff_engine::Orchestrator;
use ff_storage::{Store, StorageError};

#[derive(Debug, thiserror::Error)]
pub enum IntakeError {
    #[error("signature verification failed")]
    InvalidSignature,
    #[error("missing delivery id")]
    MissingDeliveryId,
    #[error("duplicate delivery")]
    DuplicateDelivery,
    #[error("repository sync failed: {0}")]
    RepositorySync(String),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// One inbound HTTP request, already stripped of everything but the bytes
/// the pipeline needs.
pub struct Delivery {
    pub event_type_header: String,
    pub delivery_id: String,
    pub signature_header: Option<String>,
    pub raw_body: Vec<u8>,
}

/// What the caller (the HTTP handler) reports back to the sender.
#[derive(Debug, Clone)]
pub struct IntakeOutcome {
    pub event_id: ff_core::WebhookEventId,
    pub event_type: String,
    pub triggered_build: bool,
}

/// Everything `handle_delivery` needs: where deliveries are recorded, and
/// where a triggered build gets handed off to run.
#[derive(Clone)]
pub struct WebhookIntake {
    store: Store,
    orchestrator: Orchestrator,
}

impl WebhookIntake {
    pub fn new(store: Store, orchestrator: Orchestrator) -> Self {
        Self { store, orchestrator }
    }

    /// Runs the full C9 pipeline for one delivery. Returns after the
    /// WebhookEvent is persisted and, on a build-triggering decision, after
    /// the repository sync — the build itself runs on a spawned task so the
    /// caller is never blocked on C8.
    pub async fn handle_delivery(&self, clock: &impl Clock, delivery: Delivery) -> Result<IntakeOutcome, IntakeError> {
        if delivery.delivery_id.trim().is_empty() {
            return Err(IntakeError::MissingDeliveryId);
        }
        if self.store.webhook_events.exists(&delivery.delivery_id).await? {
            return Err(IntakeError::DuplicateDelivery);
        }

        let now = clock.utc_now();
        let payload: serde_json::Value = serde_json::from_slice(&delivery.raw_body).unwrap_or(serde_json::Value::Null);
        let event_type = WebhookEventType::from_header(&delivery.event_type_header);
        let mut event = WebhookEvent::new(delivery.delivery_id.clone(), event_type.clone(), payload.clone(), now);

        let slug = payload::extract_slug(&payload);
        let project = match &slug {
            Some(slug) => self.store.projects.get_by_slug(slug).await?,
            None => None,
        };
        event.project_id = project.as_ref().map(|p| p.id);

        let secret = project.as_ref().and_then(|p| p.webhook_secret.as_deref());
        event.signature_valid = signature::verify(secret, delivery.signature_header.as_deref(), &delivery.raw_body);

        if !event.signature_valid {
            event.mark_rejected("signature verification failed", now);
            self.store.webhook_events.insert(&event).await?;
            return Err(IntakeError::InvalidSignature);
        }

        self.store.webhook_events.insert(&event).await?;
        let outcome_base = IntakeOutcome { event_id: event.id, event_type: event_type.as_str().to_string(), triggered_build: false };

        let Some(project) = project else {
            event.mark_ignored(now);
            self.store.webhook_events.update_state(&event).await?;
            return Ok(outcome_base);
        };

        if !event.should_trigger_build() {
            event.mark_ignored(now);
            self.store.webhook_events.update_state(&event).await?;
            return Ok(outcome_base);
        }

        let commit = match &event_type {
            WebhookEventType::Push => payload::extract_push_commit(&payload),
            WebhookEventType::PullRequest => payload::extract_pull_request_commit(&payload),
            WebhookEventType::Ping | WebhookEventType::Other(_) => None,
        };

        match self.trigger_build(clock, &project, commit, event_type.as_str()).await {
            Ok(build_id) => event.mark_dispatched(build_id, clock.utc_now()),
            Err(e) => event.mark_rejected(e.to_string(), clock.utc_now()),
        }
        self.store.webhook_events.update_state(&event).await?;

        Ok(IntakeOutcome { triggered_build: event.triggered_build_id.is_some(), ..outcome_base })
    }

    /// Syncs the project's clone to the delivered commit, records a Build
    /// row, and dispatches it to the orchestrator off the request path.
    async fn trigger_build(
        &self,
        clock: &impl Clock,
        project: &Project,
        commit: Option<CommitInfo>,
        event_type: &str,
    ) -> Result<ff_core::BuildId, IntakeError> {
        let repo = RepositoryManager::new();
        let update = repo.update(&project.clone_path, Some(&project.branch)).await;
        if !update.success {
            return Err(IntakeError::RepositorySync(update.error.unwrap_or_else(|| "update failed".to_string())));
        }
        let commit_sha = commit.as_ref().map(|c| c.sha.clone()).or(update.current_commit).unwrap_or_default();
        self.store.projects.record_sync(project.id, &commit_sha, clock.utc_now()).await?;

        let branch = commit.as_ref().map(|c| c.branch.clone()).unwrap_or_else(|| project.branch.clone());
        let mut build = Build::new(project.id, commit_sha, branch, TriggerOrigin::Webhook);
        build.commit_message = commit.as_ref().and_then(|c| c.message.clone());
        build.commit_author = commit.as_ref().and_then(|c| c.author.clone());
        build.webhook_event_type = Some(event_type.to_string());
        self.store.builds.insert(&build).await?;

        let orchestrator = self.orchestrator.clone();
        let clock = clock.clone();
        let build_id = build.id;
        tokio::spawn(async move {
            if let Err(e) = orchestrator.execute_build(&clock, build_id, false, false).await {
                tracing::error!(build_id = %build_id, error = %e, "webhook-triggered build failed to run");
            }
        });

        Ok(build_id)
    }
}

#[cfg(test)]
#[path = "intake_tests.rs"]
mod tests;
