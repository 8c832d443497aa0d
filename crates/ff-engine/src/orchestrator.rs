// SPDX-License-Identifier: MIT

//! Build orchestrator (C8): the one entrypoint that turns a persisted
//! [`Build`] row into a driven-to-completion workflow run, bridging the
//! in-memory C7 engine to the SQLite-backed [`Store`].

use crate::bus::EventBus;
use crate::handlers::{self, HandlerContext};
use crate::workflow::{self, WorkflowResult};
use ff_core::build::{BuildId, BuildStatus};
use ff_core::job::{Job, JobStatus};
use ff_core::{Clock, Event, EventKind};
use ff_storage::{Store, StorageError};
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum OrchestratorError {
    #[error("build {0} is not in a failed state")]
    NotFailed(BuildId),
    #[error("workflow run panicked: {0}")]
    WorkflowPanicked(String),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Owns everything `execute_build` needs to drive one run: the storage
/// handle, the shared event bus, the adapter bundle handed to every
/// handler, and the repair-loop bound.
#[derive(Clone)]
pub struct Orchestrator {
    pub store: Store,
    pub bus: EventBus,
    pub ctx: HandlerContext,
    pub max_repair_iterations: u32,
}

impl Orchestrator {
    pub fn new(store: Store, bus: EventBus, ctx: HandlerContext, max_repair_iterations: u32) -> Self {
        Self { store, bus, ctx, max_repair_iterations }
    }

    /// Drives `build_id` through validation, the C7 workflow, and
    /// persistence of the outcome. Never leaves the build row in `running`
    /// — every exit path (fail-fast validation, a storage error mid-run,
    /// or a settled workflow result) stamps a terminal status and
    /// `completed_at` before returning.
    pub async fn execute_build(
        &self,
        clock: &impl Clock,
        build_id: BuildId,
        flash_device: bool,
        run_qemu: bool,
    ) -> Result<(), OrchestratorError> {
        let mut build = self.store.builds.get(build_id).await?;
        let project = self.store.projects.get(build.project_id).await?;

        if let Some(reason) = unbuildable_reason(&project) {
            build.build_output = Some(reason);
            build.finish(clock.utc_now(), false);
            self.store.builds.update(&build).await?;
            return Ok(());
        }

        let now = clock.utc_now();
        build.start(now);
        self.store.builds.update(&build).await?;

        let mut job = Job::new(build.id, "firmware_build", self.max_repair_iterations, now);
        self.store.jobs.insert(&job).await?;
        job.start(now);
        self.store.jobs.update(&job).await?;
        self.emit(EventKind::JobStarted { job_id: job.id.clone() }, clock).await;

        let run = self
            .run_workflow(clock, project.clone_path.clone(), project.target_chip.clone(), flash_device, run_qemu, job.id)
            .await;

        let completed_at = clock.utc_now();
        match run {
            Ok(result) => {
                build.test_results = serde_json::to_string(&result.artifacts).ok();
                build.artifacts_path = artifacts_path(&result);
                build.build_output = Some(result.phases.join(" -> "));
                build.finish(completed_at, result.success);
                self.store.builds.update(&build).await?;

                // Every repair iteration C7 actually ran called the
                // language model once via `fix_issues`; reflect that here
                // since the engine itself is storage-agnostic and never
                // touches the `Job` row mid-run.
                for _ in 0..result.qa_iterations {
                    job.begin_repair();
                }
                if result.qa_iterations > 0 {
                    job.model_tag = Some(self.ctx.llm.model().to_string());
                }

                let job_status = if result.success { JobStatus::Success } else { JobStatus::Failed };
                job.finish(job_status, None, completed_at);
                self.store.jobs.update(&job).await?;
                if result.success {
                    self.emit(EventKind::JobCompleted { job_id: job.id.clone() }, clock).await;
                } else {
                    self.emit(
                        EventKind::JobFailed { job_id: job.id.clone(), error: "workflow did not complete".to_string() },
                        clock,
                    )
                    .await;
                }
            }
            Err(error) => {
                build.build_output = Some(error.to_string());
                build.finish(completed_at, false);
                self.store.builds.update(&build).await?;

                job.finish(JobStatus::Failed, Some(error.to_string()), completed_at);
                self.store.jobs.update(&job).await?;
                self.emit(EventKind::JobFailed { job_id: job.id.clone(), error: error.to_string() }, clock).await;
            }
        }

        Ok(())
    }

    /// Rejects anything but a `failed` build, resets it to `pending`, and
    /// re-enters [`Self::execute_build`].
    pub async fn retry_failed_build(
        &self,
        clock: &impl Clock,
        build_id: BuildId,
        flash_device: bool,
        run_qemu: bool,
    ) -> Result<(), OrchestratorError> {
        let mut build = self.store.builds.get(build_id).await?;
        if build.status != BuildStatus::Failed {
            return Err(OrchestratorError::NotFailed(build_id));
        }
        build.reset_for_retry();
        self.store.builds.update(&build).await?;
        self.execute_build(clock, build_id, flash_device, run_qemu).await
    }

    /// Runs C7 on a spawned task so a handler panic surfaces as a
    /// `JoinError` instead of unwinding through the orchestrator — the
    /// nearest Rust equivalent of the "raised exception" case this
    /// function's callers need to turn into a failed build.
    async fn run_workflow(
        &self,
        clock: &impl Clock,
        project_path: PathBuf,
        target_chip: String,
        flash_device: bool,
        run_qemu: bool,
        job_id: ff_core::JobId,
    ) -> Result<WorkflowResult, OrchestratorError> {
        let ctx = self.ctx.clone();
        let bus = self.bus.clone();
        let clock = clock.clone();
        let max_repair_iterations = self.max_repair_iterations;
        let handle = tokio::spawn(async move {
            workflow::execute_workflow(ctx, bus, clock, project_path, target_chip, flash_device, run_qemu, job_id, max_repair_iterations)
                .await
        });
        handle.await.map_err(|e| OrchestratorError::WorkflowPanicked(e.to_string()))
    }

    async fn emit(&self, kind: EventKind, clock: &impl Clock) {
        if self.bus.publish(Event::new(kind, clock.utc_now())).await.is_err() {
            tracing::warn!("event bus rejected publish; dispatcher may not have started");
        }
    }
}

/// Why a project currently can't host a build, or `None` if it can.
/// `Project::is_buildable` already covers `status == active` and the clone
/// path existing; the build-manifest check lives here because only this
/// module (not `ff_core`) knows the manifest's filename.
fn unbuildable_reason(project: &ff_core::Project) -> Option<String> {
    if !project.is_buildable() {
        return Some(format!(
            "project {} is not buildable (status={}, clone_path_exists={})",
            project.id,
            project.status,
            project.clone_path.exists()
        ));
    }
    if !project.clone_path.join(handlers::BUILD_MANIFEST).exists() {
        return Some(format!("missing build manifest {}", handlers::BUILD_MANIFEST));
    }
    None
}

fn artifacts_path(result: &WorkflowResult) -> Option<String> {
    result.artifacts.get("build").and_then(|v| v.get("artifacts_path")).and_then(|v| v.as_str()).map(str::to_string)
}

#[cfg(test)]
#[path = "orchestrator_tests.rs"]
mod tests;
