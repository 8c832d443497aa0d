// SPDX-License-Identifier: MIT

//! Repository manager (C3): clone/update/checkout/diff against a remote
//! VCS. Every operation returns a uniform `{success, ...}` shape — no
//! exceptions escape this module, matching the adapter boundary contract.

use crate::subprocess::{run_with_timeout, SubprocessError, GIT_TIMEOUT};
use std::path::Path;
use tokio::process::Command;

#[derive(Debug, Clone)]
pub struct CloneResult {
    pub success: bool,
    pub commit: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateResult {
    pub success: bool,
    pub previous_commit: Option<String>,
    pub current_commit: Option<String>,
    pub commits_pulled: u32,
    pub files_changed: u32,
    pub insertions: u32,
    pub deletions: u32,
    pub error: Option<String>,
}

#[derive(Debug, Clone)]
pub struct DiffEntry {
    pub path: String,
    pub change_type: String,
    pub insertions: u32,
    pub deletions: u32,
}

#[derive(Debug, Clone, Default)]
pub struct DiffResult {
    pub success: bool,
    pub entries: Vec<DiffEntry>,
    pub error: Option<String>,
}

/// Thin wrapper over the `git` CLI. Stateless — every method takes the
/// paths/refs it needs, so one instance can be shared across projects.
#[derive(Debug, Clone, Default)]
pub struct RepositoryManager;

impl RepositoryManager {
    pub fn new() -> Self {
        Self
    }

    fn git(args: &[&str], cwd: Option<&Path>) -> Command {
        let mut cmd = Command::new("git");
        cmd.args(args);
        if let Some(cwd) = cwd {
            cmd.current_dir(cwd);
        }
        cmd
    }

    async fn run(&self, args: &[&str], cwd: Option<&Path>, label: &str) -> Result<std::process::Output, String> {
        run_with_timeout(Self::git(args, cwd), GIT_TIMEOUT, label).await.map_err(format_subprocess_error)
    }

    /// Shallow-clone `remote_url` into `local_path`. If `local_path` already
    /// exists it is removed first — the caller must guarantee ownership.
    pub async fn clone(&self, remote_url: &str, local_path: &Path, branch: &str) -> CloneResult {
        if local_path.exists() {
            if let Err(e) = tokio::fs::remove_dir_all(local_path).await {
                return CloneResult { success: false, commit: None, error: Some(format!("no such path: {e}")) };
            }
        }
        let path_str = local_path.to_string_lossy().to_string();
        let args = ["clone", "--depth", "1", "--branch", branch, remote_url, &path_str];
        match self.run(&args, None, "git clone").await {
            Ok(output) if output.status.success() => match self.latest_commit(local_path).await {
                Some(commit) => CloneResult { success: true, commit: Some(commit), error: None },
                None => CloneResult { success: true, commit: None, error: None },
            },
            Ok(output) => CloneResult {
                success: false,
                commit: None,
                error: Some(stderr_or(&output, "remote command failed")),
            },
            Err(e) => CloneResult { success: false, commit: None, error: Some(e) },
        }
    }

    /// Fetch and fast-forward `branch` (or the current branch if `None`).
    pub async fn update(&self, local_path: &Path, branch: Option<&str>) -> UpdateResult {
        if !local_path.join(".git").exists() {
            return UpdateResult { error: Some("not a repository".into()), ..Default::default() };
        }
        let previous_commit = self.latest_commit(local_path).await;

        let fetch_args = ["fetch", "--depth", "1", "origin"];
        if let Err(e) = self.run(&fetch_args, Some(local_path), "git fetch").await {
            return UpdateResult { previous_commit, error: Some(e), ..Default::default() };
        }

        let target = branch.unwrap_or("HEAD");
        let reset_args = ["reset", "--hard", &format!("origin/{target}")];
        match self.run(&reset_args, Some(local_path), "git reset").await {
            Ok(output) if !output.status.success() => {
                return UpdateResult { previous_commit, error: Some(stderr_or(&output, "remote command failed")), ..Default::default() };
            }
            Err(e) => return UpdateResult { previous_commit, error: Some(e), ..Default::default() },
            _ => {}
        }

        let current_commit = self.latest_commit(local_path).await;
        if previous_commit == current_commit {
            return UpdateResult { success: true, previous_commit, current_commit, ..Default::default() };
        }

        let (commits_pulled, files_changed, insertions, deletions) =
            self.pull_stats(local_path, previous_commit.as_deref(), current_commit.as_deref()).await;
        UpdateResult {
            success: true,
            previous_commit,
            current_commit,
            commits_pulled,
            files_changed,
            insertions,
            deletions,
            error: None,
        }
    }

    async fn pull_stats(&self, local_path: &Path, from: Option<&str>, to: Option<&str>) -> (u32, u32, u32, u32) {
        let (Some(from), Some(to)) = (from, to) else { return (0, 0, 0, 0) };
        let range = format!("{from}..{to}");
        let commits_pulled = match self.run(&["rev-list", "--count", &range], Some(local_path), "git rev-list").await
        {
            Ok(output) if output.status.success() => {
                String::from_utf8_lossy(&output.stdout).trim().parse().unwrap_or(0)
            }
            _ => 0,
        };
        let diff = self.diff(local_path, from, to).await;
        let files_changed = diff.entries.len() as u32;
        let insertions = diff.entries.iter().map(|e| e.insertions).sum();
        let deletions = diff.entries.iter().map(|e| e.deletions).sum();
        (commits_pulled, files_changed, insertions, deletions)
    }

    pub async fn checkout(&self, local_path: &Path, commit_hash: &str) -> CloneResult {
        match self.run(&["checkout", commit_hash], Some(local_path), "git checkout").await {
            Ok(output) if output.status.success() => {
                CloneResult { success: true, commit: Some(commit_hash.to_string()), error: None }
            }
            Ok(output) => {
                CloneResult { success: false, commit: None, error: Some(stderr_or(&output, "remote command failed")) }
            }
            Err(e) => CloneResult { success: false, commit: None, error: Some(e) },
        }
    }

    pub async fn latest_commit(&self, local_path: &Path) -> Option<String> {
        let output = self.run(&["rev-parse", "HEAD"], Some(local_path), "git rev-parse").await.ok()?;
        if output.status.success() {
            Some(String::from_utf8_lossy(&output.stdout).trim().to_string())
        } else {
            None
        }
    }

    /// Per-file change type and added/removed line counts between two refs.
    pub async fn diff(&self, local_path: &Path, from: &str, to: &str) -> DiffResult {
        let range = format!("{from}..{to}");
        let output = match self.run(&["diff", "--numstat", &range], Some(local_path), "git diff").await {
            Ok(output) if output.status.success() => output,
            Ok(output) => return DiffResult { error: Some(stderr_or(&output, "remote command failed")), ..Default::default() },
            Err(e) => return DiffResult { error: Some(e), ..Default::default() },
        };

        let entries = String::from_utf8_lossy(&output.stdout)
            .lines()
            .filter_map(|line| {
                let mut parts = line.split_whitespace();
                let insertions: u32 = parts.next()?.parse().unwrap_or(0);
                let deletions: u32 = parts.next()?.parse().unwrap_or(0);
                let path = parts.next()?.to_string();
                let change_type = if insertions > 0 && deletions == 0 {
                    "added"
                } else if insertions == 0 && deletions > 0 {
                    "deleted"
                } else {
                    "modified"
                };
                Some(DiffEntry { path, change_type: change_type.to_string(), insertions, deletions })
            })
            .collect();

        DiffResult { success: true, entries, error: None }
    }
}

fn stderr_or(output: &std::process::Output, fallback: &str) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let trimmed = stderr.trim();
    if trimmed.is_empty() {
        fallback.to_string()
    } else {
        trimmed.to_string()
    }
}

fn format_subprocess_error(e: SubprocessError) -> String {
    e.to_string()
}

#[cfg(test)]
#[path = "repository_tests.rs"]
mod tests;
