// SPDX-License-Identifier: MIT

//! Engine-run records surfaced to the UI: one `Job` per workflow execution
//! (one per [`crate::build::Build`]).

use crate::build::BuildId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

crate::define_id! {
    /// Unique identifier for a workflow engine run.
    pub struct JobId("job-");
}

/// Lifecycle state of an engine run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Running,
    Success,
    Failed,
    Cancelled,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Success | Self::Failed | Self::Cancelled)
    }
}

crate::simple_display! {
    JobStatus {
        Pending => "pending",
        Running => "running",
        Success => "success",
        Failed => "failed",
        Cancelled => "cancelled",
    }
}

#[derive(Debug, Error)]
#[error("invalid job status: {0}")]
pub struct ParseJobStatusError(pub String);

impl FromStr for JobStatus {
    type Err = ParseJobStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "running" => Ok(Self::Running),
            "success" => Ok(Self::Success),
            "failed" => Ok(Self::Failed),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(ParseJobStatusError(other.to_string())),
        }
    }
}

/// One execution of the workflow DAG against a single [`crate::build::Build`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub build_id: BuildId,
    pub job_type: String,
    pub status: JobStatus,
    pub model_tag: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub duration_seconds: Option<f64>,
    pub error_message: Option<String>,
    /// Number of fix→rebuild→retest repair cycles attempted so far.
    pub repair_attempts: u32,
    pub max_repair_attempts: u32,
    pub created_at: DateTime<Utc>,
}

impl Job {
    pub fn new(build_id: BuildId, job_type: impl Into<String>, max_repair_attempts: u32, now: DateTime<Utc>) -> Self {
        Self {
            id: JobId::new(),
            build_id,
            job_type: job_type.into(),
            status: JobStatus::Pending,
            model_tag: None,
            started_at: None,
            completed_at: None,
            duration_seconds: None,
            error_message: None,
            repair_attempts: 0,
            max_repair_attempts,
            created_at: now,
        }
    }

    pub fn start(&mut self, now: DateTime<Utc>) {
        self.status = JobStatus::Running;
        self.started_at = Some(now);
    }

    pub fn finish(&mut self, status: JobStatus, error_message: Option<String>, now: DateTime<Utc>) {
        debug_assert!(status.is_terminal());
        self.completed_at = Some(now);
        if let Some(started) = self.started_at {
            self.duration_seconds = Some((now - started).num_milliseconds() as f64 / 1000.0);
        }
        self.status = status;
        self.error_message = error_message;
    }

    /// True if another repair cycle is allowed.
    pub fn can_repair(&self) -> bool {
        self.repair_attempts < self.max_repair_attempts
    }

    /// Record the start of one more repair cycle. Callers must check
    /// [`Self::can_repair`] first.
    pub fn begin_repair(&mut self) {
        self.repair_attempts += 1;
    }
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
