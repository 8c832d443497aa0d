// SPDX-License-Identifier: MIT

//! Tracked repository projects.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

/// Unique identifier for a tracked project.
///
/// Project identity is a UUID (not the nanoid-prefixed [`crate::id::IdBuf`]
/// scheme used elsewhere) because it is the one entity the data model calls
/// out explicitly as UUID-keyed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectId(pub Uuid);

impl ProjectId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ProjectId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ProjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ProjectId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Lifecycle state of a tracked project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    Pending,
    Active,
    Error,
    Archived,
}

crate::simple_display! {
    ProjectStatus {
        Pending => "pending",
        Active => "active",
        Error => "error",
        Archived => "archived",
    }
}

#[derive(Debug, Error)]
#[error("invalid project status: {0}")]
pub struct ParseProjectStatusError(pub String);

impl FromStr for ProjectStatus {
    type Err = ParseProjectStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "active" => Ok(Self::Active),
            "error" => Ok(Self::Error),
            "archived" => Ok(Self::Archived),
            other => Err(ParseProjectStatusError(other.to_string())),
        }
    }
}

/// A repository tracked by the orchestrator.
///
/// Owns its [`crate::dependency::Dependency`] rows and [`crate::build::Build`]
/// rows; deleting a project cascades to both at the storage layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
    pub remote_url: String,
    /// Canonical "owner/repo" slug, used to match inbound webhook payloads.
    pub slug: String,
    pub branch: String,
    pub clone_path: PathBuf,
    pub last_commit: Option<String>,
    pub last_synced_at: Option<DateTime<Utc>>,
    pub target_chip: String,
    pub build_system: String,
    pub webhook_secret: Option<String>,
    pub status: ProjectStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Project {
    /// Construct a brand-new project in the `pending` lifecycle state.
    pub fn new(
        name: impl Into<String>,
        remote_url: impl Into<String>,
        slug: impl Into<String>,
        branch: impl Into<String>,
        clone_path: PathBuf,
        target_chip: impl Into<String>,
        build_system: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: ProjectId::new(),
            name: name.into(),
            remote_url: remote_url.into(),
            slug: slug.into(),
            branch: branch.into(),
            clone_path,
            last_commit: None,
            last_synced_at: None,
            target_chip: target_chip.into(),
            build_system: build_system.into(),
            webhook_secret: None,
            status: ProjectStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_buildable(&self) -> bool {
        self.status == ProjectStatus::Active && self.clone_path.exists()
    }
}

#[cfg(test)]
#[path = "project_tests.rs"]
mod tests;
