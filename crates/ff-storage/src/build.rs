// SPDX-License-Identifier: MIT

//! Persistence for [`ff_core::Build`].

use crate::error::{Result, StorageError};
use chrono::{DateTime, Utc};
use ff_core::build::{Build, BuildId, BuildStatus, TriggerOrigin};
use ff_core::project::ProjectId;
use sqlx::{FromRow, SqlitePool};
use std::str::FromStr;

#[derive(FromRow)]
struct BuildRow {
    id: String,
    project_id: String,
    commit_sha: String,
    commit_message: Option<String>,
    commit_author: Option<String>,
    branch: String,
    status: String,
    started_at: Option<String>,
    completed_at: Option<String>,
    duration_seconds: Option<f64>,
    build_output: Option<String>,
    test_results: Option<String>,
    artifacts_path: Option<String>,
    triggered_by: String,
    webhook_event_type: Option<String>,
}

impl BuildRow {
    fn into_build(self) -> Result<Build> {
        Ok(Build {
            id: BuildId::from_string(&self.id),
            project_id: ProjectId::from_str(&self.project_id)
                .map_err(|_| StorageError::InvalidValue { field: "project_id", value: self.project_id })?,
            commit_sha: self.commit_sha,
            commit_message: self.commit_message,
            commit_author: self.commit_author,
            branch: self.branch,
            status: BuildStatus::from_str(&self.status)
                .map_err(|_| StorageError::InvalidValue { field: "status", value: self.status })?,
            started_at: self.started_at.as_deref().map(parse_ts).transpose()?,
            completed_at: self.completed_at.as_deref().map(parse_ts).transpose()?,
            duration_seconds: self.duration_seconds,
            build_output: self.build_output,
            test_results: self.test_results,
            artifacts_path: self.artifacts_path,
            triggered_by: TriggerOrigin::from_str(&self.triggered_by)
                .map_err(|_| StorageError::InvalidValue { field: "triggered_by", value: self.triggered_by })?,
            webhook_event_type: self.webhook_event_type,
        })
    }
}

fn parse_ts(s: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| StorageError::InvalidValue { field: "timestamp", value: s.to_string() })
}

const SELECT_COLUMNS: &str = "id, project_id, commit_sha, commit_message, commit_author, branch, status,
     started_at, completed_at, duration_seconds, build_output, test_results, artifacts_path,
     triggered_by, webhook_event_type";

#[derive(Clone)]
pub struct BuildRepository {
    pool: SqlitePool,
}

impl BuildRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a new build. Fails if a non-terminal build already exists
    /// for `(project_id, commit_sha)` — enforced by the partial unique index.
    pub async fn insert(&self, build: &Build) -> Result<()> {
        sqlx::query(
            "INSERT INTO builds (id, project_id, commit_sha, commit_message, commit_author, branch,
             status, started_at, completed_at, duration_seconds, build_output, test_results,
             artifacts_path, triggered_by, webhook_event_type)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(build.id.to_string())
        .bind(build.project_id.to_string())
        .bind(&build.commit_sha)
        .bind(&build.commit_message)
        .bind(&build.commit_author)
        .bind(&build.branch)
        .bind(build.status.to_string())
        .bind(build.started_at.map(|t| t.to_rfc3339()))
        .bind(build.completed_at.map(|t| t.to_rfc3339()))
        .bind(build.duration_seconds)
        .bind(&build.build_output)
        .bind(&build.test_results)
        .bind(&build.artifacts_path)
        .bind(build.triggered_by.to_string())
        .bind(&build.webhook_event_type)
        .execute(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                StorageError::DuplicateDelivery(format!("non-terminal build exists for {}", build.commit_sha))
            }
            _ => StorageError::Database(e),
        })?;
        Ok(())
    }

    pub async fn get(&self, id: BuildId) -> Result<Build> {
        let sql = format!("SELECT {SELECT_COLUMNS} FROM builds WHERE id = ?");
        let row: BuildRow =
            sqlx::query_as(&sql).bind(id.to_string()).fetch_optional(&self.pool).await?.ok_or_else(|| {
                StorageError::NotFound(format!("build {id}"))
            })?;
        row.into_build()
    }

    pub async fn list_for_project(&self, project_id: ProjectId) -> Result<Vec<Build>> {
        let sql = format!("SELECT {SELECT_COLUMNS} FROM builds WHERE project_id = ? ORDER BY rowid DESC");
        let rows: Vec<BuildRow> = sqlx::query_as(&sql).bind(project_id.to_string()).fetch_all(&self.pool).await?;
        rows.into_iter().map(BuildRow::into_build).collect()
    }

    /// Every build across every project, most recent first.
    pub async fn list_all(&self) -> Result<Vec<Build>> {
        let sql = format!("SELECT {SELECT_COLUMNS} FROM builds ORDER BY rowid DESC");
        let rows: Vec<BuildRow> = sqlx::query_as(&sql).fetch_all(&self.pool).await?;
        rows.into_iter().map(BuildRow::into_build).collect()
    }

    pub async fn update(&self, build: &Build) -> Result<()> {
        sqlx::query(
            "UPDATE builds SET status = ?, started_at = ?, completed_at = ?, duration_seconds = ?,
             build_output = ?, test_results = ?, artifacts_path = ? WHERE id = ?",
        )
        .bind(build.status.to_string())
        .bind(build.started_at.map(|t| t.to_rfc3339()))
        .bind(build.completed_at.map(|t| t.to_rfc3339()))
        .bind(build.duration_seconds)
        .bind(&build.build_output)
        .bind(&build.test_results)
        .bind(&build.artifacts_path)
        .bind(build.id.to_string())
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "build_tests.rs"]
mod tests;
