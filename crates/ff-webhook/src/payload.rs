// SPDX-License-Identifier: MIT

//! Pulls the handful of fields the build decision needs out of a GitHub-
//! shaped webhook payload. Deliberately tolerant: any missing field just
//! leaves the corresponding `Option` empty rather than failing the delivery.

use serde_json::Value;

/// The repository's canonical `owner/name` slug, read from
/// `repository.full_name` — present on every GitHub event type we handle.
pub fn extract_slug(payload: &Value) -> Option<String> {
    payload.get("repository")?.get("full_name")?.as_str().map(str::to_string)
}

/// The commit/branch details a triggered build is stamped with.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitInfo {
    pub branch: String,
    pub sha: String,
    pub message: Option<String>,
    pub author: Option<String>,
}

/// Extract branch/commit/author/message for a `push` event: `ref` is
/// `refs/heads/<branch>`, `after` is the resulting commit, the rest comes
/// from `head_commit`.
pub fn extract_push_commit(payload: &Value) -> Option<CommitInfo> {
    let branch = payload.get("ref")?.as_str()?.strip_prefix("refs/heads/")?.to_string();
    let sha = payload.get("after")?.as_str()?.to_string();
    let head_commit = payload.get("head_commit");
    let message = head_commit.and_then(|c| c.get("message")).and_then(|v| v.as_str()).map(str::to_string);
    let author = head_commit
        .and_then(|c| c.get("author"))
        .and_then(|a| a.get("name"))
        .and_then(|v| v.as_str())
        .map(str::to_string);
    Some(CommitInfo { branch, sha, message, author })
}

/// Extract branch/commit/author/message for a `pull_request` event from
/// its `pull_request.head` and top-level fields.
pub fn extract_pull_request_commit(payload: &Value) -> Option<CommitInfo> {
    let pr = payload.get("pull_request")?;
    let head = pr.get("head")?;
    let branch = head.get("ref")?.as_str()?.to_string();
    let sha = head.get("sha")?.as_str()?.to_string();
    let message = pr.get("title").and_then(|v| v.as_str()).map(str::to_string);
    let author = pr.get("user").and_then(|u| u.get("login")).and_then(|v| v.as_str()).map(str::to_string);
    Some(CommitInfo { branch, sha, message, author })
}
