// SPDX-License-Identifier: MIT

//! Declared component dependencies, as scanned from project manifests.

use crate::project::ProjectId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

crate::define_id! {
    /// Unique identifier for a dependency row.
    pub struct DependencyId("dep-");
}

/// Where a declared component comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DependencySource {
    /// A named component registry (e.g. the ESP component registry).
    Registry { registry: String },
    /// A VCS URL pinned to a ref.
    Git { url: String, git_ref: String },
    /// A filesystem path relative to the project root.
    Path { path: String },
}

impl DependencySource {
    /// Parse the `source` tag as emitted by the resolver: a bare registry
    /// name, `git:<url>[#<ref>]`, or `path:<local>`.
    pub fn parse_tag(tag: &str) -> Self {
        if let Some(rest) = tag.strip_prefix("git:") {
            match rest.split_once('#') {
                Some((url, git_ref)) => {
                    Self::Git { url: url.to_string(), git_ref: git_ref.to_string() }
                }
                None => Self::Git { url: rest.to_string(), git_ref: "HEAD".to_string() },
            }
        } else if let Some(rest) = tag.strip_prefix("path:") {
            Self::Path { path: rest.to_string() }
        } else {
            Self::Registry { registry: tag.to_string() }
        }
    }

    pub fn as_tag(&self) -> String {
        match self {
            Self::Registry { registry } => registry.clone(),
            Self::Git { url, git_ref } => format!("git:{url}#{git_ref}"),
            Self::Path { path } => format!("path:{path}"),
        }
    }
}

/// A component requirement declared by a project's manifest.
///
/// Invariant: `(project_id, component_name)` is unique — enforced by the
/// storage layer, not this type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dependency {
    pub id: DependencyId,
    pub project_id: ProjectId,
    pub component_name: String,
    pub version_spec: String,
    pub source: DependencySource,
    pub installed: bool,
    pub installed_at: Option<DateTime<Utc>>,
    pub last_install_error: Option<String>,
}

impl Dependency {
    pub fn new(
        project_id: ProjectId,
        component_name: impl Into<String>,
        version_spec: impl Into<String>,
        source: DependencySource,
    ) -> Self {
        Self {
            id: DependencyId::new(),
            project_id,
            component_name: component_name.into(),
            version_spec: version_spec.into(),
            source,
            installed: false,
            installed_at: None,
            last_install_error: None,
        }
    }
}

#[cfg(test)]
#[path = "dependency_tests.rs"]
mod tests;
