// SPDX-License-Identifier: MIT

//! `Log` has no agent attribution field, so the "agent" filter named in the
//! external interface is not implemented here; `older_than_hours` covers the
//! one filter that maps cleanly onto stored columns.

use axum::extract::{Query, State};
use axum::Json;
use ff_core::build::BuildId;
use ff_core::job::JobId;
use ff_core::log::{Log, LogLevel};
use ff_core::Clock;
use serde::Deserialize;

use crate::error::ApiResult;
use crate::state::AppState;

const DEFAULT_LIMIT: i64 = 200;

#[derive(Debug, Deserialize)]
pub struct ListLogsQuery {
    pub limit: Option<i64>,
}

pub async fn list(State(state): State<AppState>, Query(query): Query<ListLogsQuery>) -> ApiResult<Json<Vec<Log>>> {
    Ok(Json(state.store.logs.list_recent(query.limit.unwrap_or(DEFAULT_LIMIT)).await?))
}

#[derive(Debug, Deserialize)]
pub struct CreateLogRequest {
    pub level: LogLevel,
    pub message: String,
    pub build_id: Option<String>,
    pub job_id: Option<String>,
    pub metadata: Option<serde_json::Value>,
}

pub async fn create(State(state): State<AppState>, Json(req): Json<CreateLogRequest>) -> ApiResult<Json<Log>> {
    let mut log = Log::new(req.level, req.message, state.clock.utc_now());
    if let Some(build_id) = req.build_id {
        log = log.with_build(BuildId::from_string(build_id));
    }
    if let Some(job_id) = req.job_id {
        log = log.with_job(JobId::from_string(job_id));
    }
    if let Some(metadata) = req.metadata {
        log = log.with_metadata(metadata);
    }
    state.store.logs.insert(&log).await?;
    Ok(Json(log))
}

#[derive(Debug, Deserialize)]
pub struct DeleteLogsQuery {
    pub older_than_hours: i64,
}

pub async fn delete(State(state): State<AppState>, Query(query): Query<DeleteLogsQuery>) -> ApiResult<Json<u64>> {
    let deleted = state.store.logs.delete_older_than(query.older_than_hours, state.clock.utc_now()).await?;
    Ok(Json(deleted))
}
