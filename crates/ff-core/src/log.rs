// SPDX-License-Identifier: MIT

//! Persisted log lines attributed to a build/job, surfaced to the UI and
//! the `/ws` event stream independent of the process's own `tracing` output.

use crate::build::BuildId;
use crate::job::JobId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

crate::define_id! {
    /// Unique identifier for a stored log line.
    pub struct LogId("log-");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
    Success,
}

crate::simple_display! {
    LogLevel {
        Debug => "debug",
        Info => "info",
        Warning => "warning",
        Error => "error",
        Success => "success",
    }
}

#[derive(Debug, Error)]
#[error("invalid log level: {0}")]
pub struct ParseLogLevelError(pub String);

impl FromStr for LogLevel {
    type Err = ParseLogLevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warning" => Ok(Self::Warning),
            "error" => Ok(Self::Error),
            "success" => Ok(Self::Success),
            other => Err(ParseLogLevelError(other.to_string())),
        }
    }
}

/// One append-only log line, optionally attributed to a build and/or job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Log {
    pub id: LogId,
    pub build_id: Option<BuildId>,
    pub job_id: Option<JobId>,
    pub level: LogLevel,
    pub message: String,
    pub metadata: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

impl Log {
    pub fn new(level: LogLevel, message: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: LogId::new(),
            build_id: None,
            job_id: None,
            level,
            message: message.into(),
            metadata: None,
            created_at: now,
        }
    }

    pub fn with_build(mut self, build_id: BuildId) -> Self {
        self.build_id = Some(build_id);
        self
    }

    pub fn with_job(mut self, job_id: JobId) -> Self {
        self.job_id = Some(job_id);
        self
    }

    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

#[cfg(test)]
#[path = "log_tests.rs"]
mod tests;
