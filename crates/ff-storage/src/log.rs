// SPDX-License-Identifier: MIT

//! Persistence for [`ff_core::Log`].

use crate::error::{Result, StorageError};
use ff_core::build::BuildId;
use ff_core::job::JobId;
use ff_core::log::{Log, LogId, LogLevel};
use sqlx::{FromRow, SqlitePool};
use std::str::FromStr;

#[derive(FromRow)]
struct LogRow {
    id: String,
    build_id: Option<String>,
    job_id: Option<String>,
    level: String,
    message: String,
    metadata: Option<String>,
    created_at: String,
}

impl LogRow {
    fn into_log(self) -> Result<Log> {
        Ok(Log {
            id: LogId::from_string(&self.id),
            build_id: self.build_id.map(BuildId::from_string),
            job_id: self.job_id.map(JobId::from_string),
            level: LogLevel::from_str(&self.level)
                .map_err(|_| StorageError::InvalidValue { field: "level", value: self.level })?,
            message: self.message,
            metadata: self.metadata.and_then(|m| serde_json::from_str(&m).ok()),
            created_at: parse_ts(&self.created_at)?,
        })
    }
}

fn parse_ts(s: &str) -> Result<chrono::DateTime<chrono::Utc>> {
    chrono::DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&chrono::Utc))
        .map_err(|_| StorageError::InvalidValue { field: "timestamp", value: s.to_string() })
}

#[derive(Clone)]
pub struct LogRepository {
    pool: SqlitePool,
}

impl LogRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn insert(&self, log: &Log) -> Result<()> {
        sqlx::query(
            "INSERT INTO logs (id, build_id, job_id, level, message, metadata, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(log.id.to_string())
        .bind(log.build_id.map(|b| b.to_string()))
        .bind(log.job_id.map(|j| j.to_string()))
        .bind(log.level.to_string())
        .bind(&log.message)
        .bind(log.metadata.as_ref().map(|m| m.to_string()))
        .bind(log.created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn list_for_build(&self, build_id: BuildId) -> Result<Vec<Log>> {
        let rows: Vec<LogRow> = sqlx::query_as(
            "SELECT id, build_id, job_id, level, message, metadata, created_at
             FROM logs WHERE build_id = ? ORDER BY rowid ASC",
        )
        .bind(build_id.to_string())
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(LogRow::into_log).collect()
    }

    pub async fn list_recent(&self, limit: i64) -> Result<Vec<Log>> {
        let rows: Vec<LogRow> = sqlx::query_as(
            "SELECT id, build_id, job_id, level, message, metadata, created_at
             FROM logs ORDER BY rowid DESC LIMIT ?",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(LogRow::into_log).collect()
    }

    /// Delete every log older than `older_than_hours` relative to `now`.
    /// Returns the number of rows removed.
    pub async fn delete_older_than(&self, older_than_hours: i64, now: chrono::DateTime<chrono::Utc>) -> Result<u64> {
        let cutoff = now - chrono::Duration::hours(older_than_hours);
        let result = sqlx::query("DELETE FROM logs WHERE created_at < ?").bind(cutoff.to_rfc3339()).execute(&self.pool).await?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
#[path = "log_tests.rs"]
mod tests;
