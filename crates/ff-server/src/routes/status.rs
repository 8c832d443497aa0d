// SPDX-License-Identifier: MIT

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
    pub project_count: i64,
    pub websocket_connections: usize,
}

pub async fn get(State(state): State<AppState>) -> crate::error::ApiResult<Json<StatusResponse>> {
    let project_count = state.store.projects.count().await?;
    Ok(Json(StatusResponse { status: "ok", project_count, websocket_connections: state.ws_connected() }))
}
