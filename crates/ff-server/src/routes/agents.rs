// SPDX-License-Identifier: MIT

use axum::extract::{Path, State};
use axum::Json;
use ff_core::agent::{Agent, AgentId, AgentStatus, AgentType};
use ff_core::{Clock, Event, EventKind};
use serde::Deserialize;

use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateAgentRequest {
    pub name: String,
    pub agent_type: AgentType,
}

pub async fn list(State(state): State<AppState>) -> ApiResult<Json<Vec<Agent>>> {
    Ok(Json(state.store.agents.list().await?))
}

pub async fn create(State(state): State<AppState>, Json(req): Json<CreateAgentRequest>) -> ApiResult<Json<Agent>> {
    let agent = Agent::new(req.name, req.agent_type);
    state.store.agents.insert(&agent).await?;
    Ok(Json(agent))
}

pub async fn get(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<Agent>> {
    Ok(Json(state.store.agents.get(AgentId::from_string(id)).await?))
}

pub async fn delete(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<()> {
    state.store.agents.delete(AgentId::from_string(id)).await?;
    Ok(())
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: AgentStatus,
}

pub async fn update_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateStatusRequest>,
) -> ApiResult<Json<Agent>> {
    let agent_id = AgentId::from_string(id);
    state.store.agents.update_status(agent_id, req.status, state.clock.utc_now()).await?;
    let agent = state.store.agents.get(agent_id).await?;
    emit(&state, EventKind::AgentStatusChanged { agent_id }).await;
    Ok(Json(agent))
}

pub async fn start(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<Agent>> {
    let agent_id = AgentId::from_string(id);
    state.store.agents.update_status(agent_id, AgentStatus::Active, state.clock.utc_now()).await?;
    emit(&state, EventKind::AgentStarted { agent_id }).await;
    Ok(Json(state.store.agents.get(agent_id).await?))
}

pub async fn stop(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<Agent>> {
    let agent_id = AgentId::from_string(id);
    state.store.agents.update_status(agent_id, AgentStatus::Idle, state.clock.utc_now()).await?;
    emit(&state, EventKind::AgentStopped { agent_id }).await;
    Ok(Json(state.store.agents.get(agent_id).await?))
}

async fn emit(state: &AppState, kind: EventKind) {
    let _ = state.bus.publish(Event::new(kind, state.clock.utc_now())).await;
}
