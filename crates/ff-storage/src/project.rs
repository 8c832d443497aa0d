// SPDX-License-Identifier: MIT

//! Persistence for [`ff_core::Project`].

use crate::error::{Result, StorageError};
use chrono::{DateTime, Utc};
use ff_core::{Project, ProjectId, ProjectStatus};
use sqlx::{FromRow, Row, SqlitePool};
use std::path::PathBuf;
use std::str::FromStr;

#[derive(FromRow)]
struct ProjectRow {
    id: String,
    name: String,
    remote_url: String,
    slug: String,
    branch: String,
    clone_path: String,
    last_commit: Option<String>,
    last_synced_at: Option<String>,
    target_chip: String,
    build_system: String,
    webhook_secret: Option<String>,
    status: String,
    created_at: String,
    updated_at: String,
}

impl ProjectRow {
    fn into_project(self) -> Result<Project> {
        Ok(Project {
            id: parse_id(&self.id)?,
            name: self.name,
            remote_url: self.remote_url,
            slug: self.slug,
            branch: self.branch,
            clone_path: PathBuf::from(self.clone_path),
            last_commit: self.last_commit,
            last_synced_at: self.last_synced_at.as_deref().map(parse_ts).transpose()?,
            target_chip: self.target_chip,
            build_system: self.build_system,
            webhook_secret: self.webhook_secret,
            status: ProjectStatus::from_str(&self.status)
                .map_err(|_| StorageError::InvalidValue { field: "status", value: self.status })?,
            created_at: parse_ts(&self.created_at)?,
            updated_at: parse_ts(&self.updated_at)?,
        })
    }
}

fn parse_id(s: &str) -> Result<ProjectId> {
    ProjectId::from_str(s).map_err(|_| StorageError::InvalidValue { field: "id", value: s.to_string() })
}

fn parse_ts(s: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| StorageError::InvalidValue { field: "timestamp", value: s.to_string() })
}

/// Repository for tracked projects.
#[derive(Clone)]
pub struct ProjectRepository {
    pool: SqlitePool,
}

impl ProjectRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn insert(&self, project: &Project) -> Result<()> {
        sqlx::query(
            "INSERT INTO projects (id, name, remote_url, slug, branch, clone_path, last_commit,
             last_synced_at, target_chip, build_system, webhook_secret, status, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(project.id.to_string())
        .bind(&project.name)
        .bind(&project.remote_url)
        .bind(&project.slug)
        .bind(&project.branch)
        .bind(project.clone_path.to_string_lossy().to_string())
        .bind(&project.last_commit)
        .bind(project.last_synced_at.map(|t| t.to_rfc3339()))
        .bind(&project.target_chip)
        .bind(&project.build_system)
        .bind(&project.webhook_secret)
        .bind(project.status.to_string())
        .bind(project.created_at.to_rfc3339())
        .bind(project.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn get(&self, id: ProjectId) -> Result<Project> {
        let row: ProjectRow = sqlx::query_as("SELECT * FROM projects WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StorageError::NotFound(format!("project {id}")))?;
        row.into_project()
    }

    pub async fn get_by_slug(&self, slug: &str) -> Result<Option<Project>> {
        let row: Option<ProjectRow> =
            sqlx::query_as("SELECT * FROM projects WHERE slug = ?").bind(slug).fetch_optional(&self.pool).await?;
        row.map(ProjectRow::into_project).transpose()
    }

    pub async fn list(&self) -> Result<Vec<Project>> {
        let rows: Vec<ProjectRow> =
            sqlx::query_as("SELECT * FROM projects ORDER BY created_at DESC").fetch_all(&self.pool).await?;
        rows.into_iter().map(ProjectRow::into_project).collect()
    }

    pub async fn update_status(&self, id: ProjectId, status: ProjectStatus, now: DateTime<Utc>) -> Result<()> {
        sqlx::query("UPDATE projects SET status = ?, updated_at = ? WHERE id = ?")
            .bind(status.to_string())
            .bind(now.to_rfc3339())
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn record_sync(&self, id: ProjectId, commit: &str, now: DateTime<Utc>) -> Result<()> {
        sqlx::query("UPDATE projects SET last_commit = ?, last_synced_at = ?, updated_at = ? WHERE id = ?")
            .bind(commit)
            .bind(now.to_rfc3339())
            .bind(now.to_rfc3339())
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn delete(&self, id: ProjectId) -> Result<()> {
        let deleted = sqlx::query("DELETE FROM projects WHERE id = ?").bind(id.to_string()).execute(&self.pool).await?;
        if deleted.rows_affected() == 0 {
            return Err(StorageError::NotFound(format!("project {id}")));
        }
        Ok(())
    }

    pub async fn count(&self) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) as c FROM projects").fetch_one(&self.pool).await?;
        Ok(row.get("c"))
    }
}

#[cfg(test)]
#[path = "project_tests.rs"]
mod tests;
