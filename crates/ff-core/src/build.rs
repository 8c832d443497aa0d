// SPDX-License-Identifier: MIT

//! One execution of the workflow against one commit.

use crate::project::ProjectId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

crate::define_id! {
    /// Unique identifier for a build run.
    pub struct BuildId("bld-");
}

/// Lifecycle state of a build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildStatus {
    Pending,
    Running,
    Success,
    Failed,
}

impl BuildStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Success | Self::Failed)
    }
}

crate::simple_display! {
    BuildStatus {
        Pending => "pending",
        Running => "running",
        Success => "success",
        Failed => "failed",
    }
}

#[derive(Debug, Error)]
#[error("invalid build status: {0}")]
pub struct ParseBuildStatusError(pub String);

impl FromStr for BuildStatus {
    type Err = ParseBuildStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "running" => Ok(Self::Running),
            "success" => Ok(Self::Success),
            "failed" => Ok(Self::Failed),
            other => Err(ParseBuildStatusError(other.to_string())),
        }
    }
}

/// What caused this build to be scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerOrigin {
    Webhook,
    Manual,
    Scheduled,
}

crate::simple_display! {
    TriggerOrigin {
        Webhook => "webhook",
        Manual => "manual",
        Scheduled => "scheduled",
    }
}

#[derive(Debug, Error)]
#[error("invalid trigger origin: {0}")]
pub struct ParseTriggerOriginError(pub String);

impl FromStr for TriggerOrigin {
    type Err = ParseTriggerOriginError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "webhook" => Ok(Self::Webhook),
            "manual" => Ok(Self::Manual),
            "scheduled" => Ok(Self::Scheduled),
            other => Err(ParseTriggerOriginError(other.to_string())),
        }
    }
}

/// One execution of the workflow against one commit.
///
/// Invariant (enforced by the storage layer, not this type): at most one
/// non-terminal build per `(project_id, commit_sha)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Build {
    pub id: BuildId,
    pub project_id: ProjectId,
    pub commit_sha: String,
    pub commit_message: Option<String>,
    pub commit_author: Option<String>,
    pub branch: String,
    pub status: BuildStatus,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub duration_seconds: Option<f64>,
    pub build_output: Option<String>,
    pub test_results: Option<String>,
    pub artifacts_path: Option<String>,
    pub triggered_by: TriggerOrigin,
    pub webhook_event_type: Option<String>,
}

impl Build {
    pub fn new(
        project_id: ProjectId,
        commit_sha: impl Into<String>,
        branch: impl Into<String>,
        triggered_by: TriggerOrigin,
    ) -> Self {
        Self {
            id: BuildId::new(),
            project_id,
            commit_sha: commit_sha.into(),
            commit_message: None,
            commit_author: None,
            branch: branch.into(),
            status: BuildStatus::Pending,
            started_at: None,
            completed_at: None,
            duration_seconds: None,
            build_output: None,
            test_results: None,
            artifacts_path: None,
            triggered_by,
            webhook_event_type: None,
        }
    }

    /// Mark the build running and stamp `started_at`.
    pub fn start(&mut self, now: DateTime<Utc>) {
        self.status = BuildStatus::Running;
        self.started_at = Some(now);
    }

    /// Stamp completion, compute duration, and set the terminal status.
    pub fn finish(&mut self, now: DateTime<Utc>, success: bool) {
        self.completed_at = Some(now);
        if let Some(started) = self.started_at {
            self.duration_seconds = Some((now - started).num_milliseconds() as f64 / 1000.0);
        }
        self.status = if success { BuildStatus::Success } else { BuildStatus::Failed };
    }

    /// Reset a failed build back to its pre-run state so it can be retried.
    ///
    /// Rejects anything but a `failed` build — callers must check
    /// `status == BuildStatus::Failed` first if they want a typed error.
    pub fn reset_for_retry(&mut self) {
        self.status = BuildStatus::Pending;
        self.started_at = None;
        self.completed_at = None;
        self.duration_seconds = None;
        self.build_output = None;
        self.test_results = None;
    }
}

/// Aggregate build statistics for a project or the whole fleet.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct BuildStats {
    pub total: u64,
    pub successful: u64,
    pub failed: u64,
    pub average_duration_seconds: f64,
}

impl BuildStats {
    /// Compute stats from a set of builds. Average duration is computed
    /// only over builds that recorded a duration; success rate is zero
    /// when `total` is zero.
    pub fn from_builds<'a>(builds: impl Iterator<Item = &'a Build>) -> Self {
        let mut total = 0u64;
        let mut successful = 0u64;
        let mut failed = 0u64;
        let mut duration_sum = 0.0;
        let mut duration_count = 0u64;

        for build in builds {
            total += 1;
            match build.status {
                BuildStatus::Success => successful += 1,
                BuildStatus::Failed => failed += 1,
                _ => {}
            }
            if let Some(d) = build.duration_seconds {
                duration_sum += d;
                duration_count += 1;
            }
        }

        Self {
            total,
            successful,
            failed,
            average_duration_seconds: if duration_count > 0 {
                duration_sum / duration_count as f64
            } else {
                0.0
            },
        }
    }

    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.successful as f64 / self.total as f64 * 100.0
        }
    }
}

#[cfg(test)]
#[path = "build_tests.rs"]
mod tests;
