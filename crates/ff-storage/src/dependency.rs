// SPDX-License-Identifier: MIT

//! Persistence for [`ff_core::Dependency`].

use crate::error::{Result, StorageError};
use chrono::{DateTime, Utc};
use ff_core::dependency::{Dependency, DependencyId, DependencySource};
use ff_core::project::ProjectId;
use sqlx::{FromRow, SqlitePool};
use std::str::FromStr;

#[derive(FromRow)]
struct DependencyRow {
    id: String,
    project_id: String,
    component_name: String,
    version_spec: String,
    source_tag: String,
    installed: bool,
    installed_at: Option<String>,
    last_install_error: Option<String>,
}

impl DependencyRow {
    fn into_dependency(self) -> Result<Dependency> {
        Ok(Dependency {
            id: DependencyId::from_string(&self.id),
            project_id: ProjectId::from_str(&self.project_id)
                .map_err(|_| StorageError::InvalidValue { field: "project_id", value: self.project_id })?,
            component_name: self.component_name,
            version_spec: self.version_spec,
            source: DependencySource::parse_tag(&self.source_tag),
            installed: self.installed,
            installed_at: self.installed_at.as_deref().map(parse_ts).transpose()?,
            last_install_error: self.last_install_error,
        })
    }
}

fn parse_ts(s: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| StorageError::InvalidValue { field: "timestamp", value: s.to_string() })
}

fn source_kind(source: &DependencySource) -> &'static str {
    match source {
        DependencySource::Registry { .. } => "registry",
        DependencySource::Git { .. } => "git",
        DependencySource::Path { .. } => "path",
    }
}

#[derive(Clone)]
pub struct DependencyRepository {
    pool: SqlitePool,
}

impl DependencyRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn insert(&self, dep: &Dependency) -> Result<()> {
        sqlx::query(
            "INSERT INTO dependencies (id, project_id, component_name, version_spec, source_kind,
             source_tag, installed, installed_at, last_install_error)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(dep.id.to_string())
        .bind(dep.project_id.to_string())
        .bind(&dep.component_name)
        .bind(&dep.version_spec)
        .bind(source_kind(&dep.source))
        .bind(dep.source.as_tag())
        .bind(dep.installed)
        .bind(dep.installed_at.map(|t| t.to_rfc3339()))
        .bind(&dep.last_install_error)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn list_for_project(&self, project_id: ProjectId) -> Result<Vec<Dependency>> {
        let rows: Vec<DependencyRow> = sqlx::query_as(
            "SELECT id, project_id, component_name, version_spec, source_tag, installed,
             installed_at, last_install_error FROM dependencies WHERE project_id = ? ORDER BY component_name",
        )
        .bind(project_id.to_string())
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(DependencyRow::into_dependency).collect()
    }

    pub async fn mark_installed(&self, id: DependencyId, now: DateTime<Utc>) -> Result<()> {
        sqlx::query("UPDATE dependencies SET installed = 1, installed_at = ?, last_install_error = NULL WHERE id = ?")
            .bind(now.to_rfc3339())
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn mark_install_failed(&self, id: DependencyId, error: &str) -> Result<()> {
        sqlx::query("UPDATE dependencies SET installed = 0, last_install_error = ? WHERE id = ?")
            .bind(error)
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Clears every prior row for `project_id` — the overwrite half of
    /// scan-dependencies' overwrite-on-scan semantics.
    pub async fn delete_for_project(&self, project_id: ProjectId) -> Result<()> {
        sqlx::query("DELETE FROM dependencies WHERE project_id = ?").bind(project_id.to_string()).execute(&self.pool).await?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "dependency_tests.rs"]
mod tests;
