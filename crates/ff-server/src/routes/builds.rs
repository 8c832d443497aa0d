// SPDX-License-Identifier: MIT

use axum::extract::{Path, State};
use axum::Json;
use ff_core::build::{Build, BuildId};

use crate::error::ApiResult;
use crate::state::AppState;

pub async fn list_all(State(state): State<AppState>) -> ApiResult<Json<Vec<Build>>> {
    Ok(Json(state.store.builds.list_all().await?))
}

pub async fn get(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<Build>> {
    Ok(Json(state.store.builds.get(BuildId::from_string(id)).await?))
}

pub async fn retry(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<Build>> {
    let build_id = BuildId::from_string(id);
    let build = state.store.builds.get(build_id).await?;
    if build.status != ff_core::build::BuildStatus::Failed {
        return Err(ff_engine::OrchestratorError::NotFailed(build_id).into());
    }

    let orchestrator = state.orchestrator.clone();
    let clock = state.clock.clone();
    tokio::spawn(async move {
        if let Err(e) = orchestrator.retry_failed_build(&clock, build_id, false, false).await {
            tracing::error!(build_id = %build_id, error = %e, "build retry failed to run");
        }
    });

    Ok(Json(build))
}
