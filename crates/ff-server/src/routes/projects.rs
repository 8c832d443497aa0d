// SPDX-License-Identifier: MIT

use axum::extract::{Path, State};
use axum::Json;
use ff_adapters::{dependency_resolver, RepositoryManager};
use ff_core::build::{Build, TriggerOrigin};
use ff_core::{Clock, Dependency, Project, ProjectId, ProjectStatus};
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateProjectRequest {
    pub name: String,
    pub remote_url: String,
    pub slug: String,
    pub branch: String,
    pub target_chip: String,
    pub build_system: String,
    pub webhook_secret: Option<String>,
}

/// Clones the repository and scans it for dependencies before persisting,
/// so a freshly created project is immediately queryable via its
/// dependency list.
pub async fn create(State(state): State<AppState>, Json(req): Json<CreateProjectRequest>) -> ApiResult<Json<Project>> {
    let now = state.clock.utc_now();
    let clone_path = state.config.projects_base_dir.join(&req.slug);
    let mut project =
        Project::new(req.name, req.remote_url, req.slug, req.branch.clone(), clone_path, req.target_chip, req.build_system, now);
    project.webhook_secret = req.webhook_secret;

    let repo = RepositoryManager::new();
    let clone = repo.clone(&project.remote_url, &project.clone_path, &project.branch).await;
    if clone.success {
        project.last_commit = clone.commit;
        project.last_synced_at = Some(now);
        project.status = ProjectStatus::Active;
    } else {
        project.status = ProjectStatus::Error;
    }

    state.store.projects.insert(&project).await?;

    if project.status == ProjectStatus::Active {
        if let Ok(deps) = dependency_resolver::scan(&project.clone_path, project.id) {
            for dep in deps {
                state.store.dependencies.insert(&dep).await?;
            }
        }
    }

    Ok(Json(project))
}

pub async fn list(State(state): State<AppState>) -> ApiResult<Json<Vec<Project>>> {
    Ok(Json(state.store.projects.list().await?))
}

pub async fn get(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<Project>> {
    let project_id = parse_id(&id)?;
    Ok(Json(state.store.projects.get(project_id).await?))
}

#[derive(Debug, Deserialize)]
pub struct UpdateProjectRequest {
    pub status: ProjectStatus,
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateProjectRequest>,
) -> ApiResult<Json<Project>> {
    let project_id = parse_id(&id)?;
    state.store.projects.update_status(project_id, req.status, state.clock.utc_now()).await?;
    Ok(Json(state.store.projects.get(project_id).await?))
}

pub async fn delete(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<()> {
    let project_id = parse_id(&id)?;
    state.store.projects.delete(project_id).await?;
    Ok(())
}

#[derive(Debug, Serialize)]
pub struct SyncResult {
    pub success: bool,
    pub previous_commit: Option<String>,
    pub current_commit: Option<String>,
    pub commits_pulled: u32,
}

pub async fn sync(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<SyncResult>> {
    let project_id = parse_id(&id)?;
    let project = state.store.projects.get(project_id).await?;
    let repo = RepositoryManager::new();
    let result = repo.update(&project.clone_path, Some(&project.branch)).await;
    if let Some(commit) = result.current_commit.clone() {
        state.store.projects.record_sync(project_id, &commit, state.clock.utc_now()).await?;
    }
    Ok(Json(SyncResult {
        success: result.success,
        previous_commit: result.previous_commit,
        current_commit: result.current_commit,
        commits_pulled: result.commits_pulled,
    }))
}

/// Schedules a manual build for the project's current head commit.
pub async fn build(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<Build>> {
    let project_id = parse_id(&id)?;
    let project = state.store.projects.get(project_id).await?;
    let commit_sha = project.last_commit.clone().unwrap_or_default();
    let build = Build::new(project_id, commit_sha, project.branch.clone(), TriggerOrigin::Manual);
    state.store.builds.insert(&build).await?;

    let orchestrator = state.orchestrator.clone();
    let clock = state.clock.clone();
    let build_id = build.id;
    tokio::spawn(async move {
        if let Err(e) = orchestrator.execute_build(&clock, build_id, false, false).await {
            tracing::error!(build_id = %build_id, error = %e, "manually triggered build failed to run");
        }
    });

    Ok(Json(build))
}

pub async fn scan_dependencies(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<Vec<Dependency>>> {
    let project_id = parse_id(&id)?;
    let project = state.store.projects.get(project_id).await?;
    let deps =
        dependency_resolver::scan(&project.clone_path, project_id).map_err(ApiError::BadRequest)?;
    state.store.dependencies.delete_for_project(project_id).await?;
    for dep in &deps {
        state.store.dependencies.insert(dep).await?;
    }
    Ok(Json(deps))
}

pub async fn dependencies(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<Vec<Dependency>>> {
    let project_id = parse_id(&id)?;
    Ok(Json(state.store.dependencies.list_for_project(project_id).await?))
}

/// The dependency tree is flat in this data model — one row per declared
/// component, with no nested transitive edges tracked — so this returns
/// the same rows as [`dependencies`] under the external name the interface
/// calls for.
pub async fn dependency_tree(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<Vec<Dependency>>> {
    dependencies(State(state), Path(id)).await
}

fn parse_id(id: &str) -> Result<ProjectId, ApiError> {
    id.parse().map_err(|_| ApiError::BadRequest(format!("invalid project id: {id}")))
}
