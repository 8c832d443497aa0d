// SPDX-License-Identifier: MIT

//! Dependency resolver (C11): walks a cloned project tree for
//! `idf_component.yml` manifests and turns their `dependencies` mapping
//! into `Dependency` records. Does not install anything — installation is
//! a declared future extension.

use ff_core::{Dependency, DependencySource, ProjectId};
use serde::Deserialize;
use std::path::Path;
use walkdir::{DirEntry, WalkDir};

const MANIFEST_FILE_NAME: &str = "idf_component.yml";
const SKIPPED_DIR_NAMES: &[&str] = &["build", "managed_components", "target", "node_modules"];

#[derive(Debug, Deserialize)]
struct ComponentManifest {
    #[serde(default)]
    dependencies: indexmap::IndexMap<String, DependencySpec>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum DependencySpec {
    Version(String),
    Detailed {
        version: Option<String>,
        #[serde(default)]
        source: Option<String>,
    },
}

fn is_skipped(entry: &DirEntry) -> bool {
    let name = entry.file_name().to_string_lossy();
    entry.file_type().is_dir() && (name.starts_with('.') || SKIPPED_DIR_NAMES.contains(&name.as_ref()))
}

/// Scans `root` for component manifests belonging to `project_id`.
///
/// Returns the fresh dependency set in declaration order; the caller is
/// responsible for deleting the project's prior rows before persisting
/// these (overwrite-on-scan semantics).
pub fn scan(root: &Path, project_id: ProjectId) -> Result<Vec<Dependency>, String> {
    let mut dependencies = Vec::new();

    let walker = WalkDir::new(root).into_iter().filter_entry(|e| !is_skipped(e));
    for entry in walker {
        let entry = entry.map_err(|e| e.to_string())?;
        if entry.file_type().is_file() && entry.file_name() == MANIFEST_FILE_NAME {
            dependencies.extend(parse_manifest(entry.path(), project_id)?);
        }
    }

    Ok(dependencies)
}

fn parse_manifest(path: &Path, project_id: ProjectId) -> Result<Vec<Dependency>, String> {
    let contents = std::fs::read_to_string(path).map_err(|e| format!("{}: {e}", path.display()))?;
    let manifest: ComponentManifest =
        serde_yaml::from_str(&contents).map_err(|e| format!("{}: {e}", path.display()))?;

    Ok(manifest
        .dependencies
        .into_iter()
        .map(|(name, spec)| {
            let (version_spec, source_tag) = match spec {
                DependencySpec::Version(v) => (v, None),
                DependencySpec::Detailed { version, source } => (version.unwrap_or_default(), source),
            };
            let source = source_tag.as_deref().map(DependencySource::parse_tag).unwrap_or(DependencySource::Registry {
                registry: "component-registry".to_string(),
            });
            Dependency::new(project_id, name, version_spec, source)
        })
        .collect())
}

#[cfg(test)]
#[path = "dependency_resolver_tests.rs"]
mod tests;
