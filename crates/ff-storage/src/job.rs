// SPDX-License-Identifier: MIT

//! Persistence for [`ff_core::Job`].

use crate::error::{Result, StorageError};
use ff_core::build::BuildId;
use ff_core::job::{Job, JobId, JobStatus};
use sqlx::{FromRow, SqlitePool};
use std::str::FromStr;

#[derive(FromRow)]
struct JobRow {
    id: String,
    build_id: String,
    job_type: String,
    status: String,
    model_tag: Option<String>,
    started_at: Option<String>,
    completed_at: Option<String>,
    duration_seconds: Option<f64>,
    error_message: Option<String>,
    repair_attempts: i64,
    max_repair_attempts: i64,
    created_at: String,
}

impl JobRow {
    fn into_job(self) -> Result<Job> {
        Ok(Job {
            id: JobId::from_string(&self.id),
            build_id: BuildId::from_string(&self.build_id),
            job_type: self.job_type,
            status: JobStatus::from_str(&self.status)
                .map_err(|_| StorageError::InvalidValue { field: "status", value: self.status })?,
            model_tag: self.model_tag,
            started_at: self.started_at.as_deref().map(parse_ts).transpose()?,
            completed_at: self.completed_at.as_deref().map(parse_ts).transpose()?,
            duration_seconds: self.duration_seconds,
            error_message: self.error_message,
            repair_attempts: self.repair_attempts as u32,
            max_repair_attempts: self.max_repair_attempts as u32,
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
pub struct JobRepository {
    pool: SqlitePool,
}

impl JobRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn insert(&self, job: &Job) -> Result<()> {
        sqlx::query(
            "INSERT INTO jobs (id, build_id, job_type, status, model_tag, started_at, completed_at,
             duration_seconds, error_message, repair_attempts, max_repair_attempts, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(job.id.to_string())
        .bind(job.build_id.to_string())
        .bind(&job.job_type)
        .bind(job.status.to_string())
        .bind(&job.model_tag)
        .bind(job.started_at.map(|t| t.to_rfc3339()))
        .bind(job.completed_at.map(|t| t.to_rfc3339()))
        .bind(job.duration_seconds)
        .bind(&job.error_message)
        .bind(job.repair_attempts as i64)
        .bind(job.max_repair_attempts as i64)
        .bind(job.created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn update(&self, job: &Job) -> Result<()> {
        sqlx::query(
            "UPDATE jobs SET status = ?, started_at = ?, completed_at = ?, duration_seconds = ?,
             error_message = ?, repair_attempts = ? WHERE id = ?",
        )
        .bind(job.status.to_string())
        .bind(job.started_at.map(|t| t.to_rfc3339()))
        .bind(job.completed_at.map(|t| t.to_rfc3339()))
        .bind(job.duration_seconds)
        .bind(&job.error_message)
        .bind(job.repair_attempts as i64)
        .bind(job.id.to_string())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn get(&self, id: JobId) -> Result<Job> {
        let row: JobRow = sqlx::query_as("SELECT * FROM jobs WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StorageError::NotFound(format!("job {id}")))?;
        row.into_job()
    }

    pub async fn get_for_build(&self, build_id: BuildId) -> Result<Option<Job>> {
        let row: Option<JobRow> = sqlx::query_as("SELECT * FROM jobs WHERE build_id = ? ORDER BY rowid DESC LIMIT 1")
            .bind(build_id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        row.map(JobRow::into_job).transpose()
    }

    pub async fn list(&self) -> Result<Vec<Job>> {
        let rows: Vec<JobRow> = sqlx::query_as("SELECT * FROM jobs ORDER BY created_at DESC").fetch_all(&self.pool).await?;
        rows.into_iter().map(JobRow::into_job).collect()
    }

    pub async fn delete(&self, id: JobId) -> Result<()> {
        let deleted = sqlx::query("DELETE FROM jobs WHERE id = ?").bind(id.to_string()).execute(&self.pool).await?;
        if deleted.rows_affected() == 0 {
            return Err(StorageError::NotFound(format!("job {id}")));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
