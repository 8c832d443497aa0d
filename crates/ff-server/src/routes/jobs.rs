// SPDX-License-Identifier: MIT

use axum::extract::{Path, State};
use axum::Json;
use ff_core::build::BuildId;
use ff_core::job::{Job, JobId, JobStatus};
use ff_core::{Clock, Event, EventKind};
use serde::Deserialize;

use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateJobRequest {
    pub build_id: String,
    pub job_type: String,
}

pub async fn list(State(state): State<AppState>) -> ApiResult<Json<Vec<Job>>> {
    Ok(Json(state.store.jobs.list().await?))
}

pub async fn create(State(state): State<AppState>, Json(req): Json<CreateJobRequest>) -> ApiResult<Json<Job>> {
    let job = Job::new(BuildId::from_string(req.build_id), req.job_type, state.config.max_repair_iterations, state.clock.utc_now());
    state.store.jobs.insert(&job).await?;
    emit(&state, EventKind::JobCreated { job_id: job.id }).await;
    Ok(Json(job))
}

pub async fn get(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<Job>> {
    Ok(Json(state.store.jobs.get(JobId::from_string(id)).await?))
}

pub async fn delete(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<()> {
    state.store.jobs.delete(JobId::from_string(id)).await?;
    Ok(())
}

pub async fn start(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<Job>> {
    let mut job = state.store.jobs.get(JobId::from_string(id)).await?;
    job.start(state.clock.utc_now());
    state.store.jobs.update(&job).await?;
    emit(&state, EventKind::JobStarted { job_id: job.id }).await;
    Ok(Json(job))
}

#[derive(Debug, Deserialize, Default)]
pub struct CompleteJobRequest {
    pub error_message: Option<String>,
}

pub async fn complete(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Option<Json<CompleteJobRequest>>,
) -> ApiResult<Json<Job>> {
    let req = body.map(|Json(b)| b).unwrap_or_default();
    let mut job = state.store.jobs.get(JobId::from_string(id)).await?;
    let now = state.clock.utc_now();
    match req.error_message {
        Some(message) => {
            job.finish(JobStatus::Failed, Some(message.clone()), now);
            state.store.jobs.update(&job).await?;
            emit(&state, EventKind::JobFailed { job_id: job.id, error: message }).await;
        }
        None => {
            job.finish(JobStatus::Success, None, now);
            state.store.jobs.update(&job).await?;
            emit(&state, EventKind::JobCompleted { job_id: job.id }).await;
        }
    }
    Ok(Json(job))
}

pub async fn cancel(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<Job>> {
    let mut job = state.store.jobs.get(JobId::from_string(id)).await?;
    job.finish(JobStatus::Cancelled, None, state.clock.utc_now());
    state.store.jobs.update(&job).await?;
    emit(&state, EventKind::JobCancelled { job_id: job.id }).await;
    Ok(Json(job))
}

async fn emit(state: &AppState, kind: EventKind) {
    let _ = state.bus.publish(Event::new(kind, state.clock.utc_now())).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::test_app;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    #[tokio::test]
    async fn start_then_complete_transitions_a_job_to_success() {
        let app = test_app().await;
        let body = serde_json::to_vec(&serde_json::json!({ "build_id": "bld-0000000000000000000", "job_type": "build" })).unwrap();
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/jobs")
                    .header("content-type", "application/json")
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let job: Job = serde_json::from_slice(&body).unwrap();

        let response = app
            .clone()
            .oneshot(Request::builder().method("POST").uri(format!("/api/jobs/{}/start", job.id)).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .oneshot(Request::builder().method("POST").uri(format!("/api/jobs/{}/complete", job.id)).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let job: Job = serde_json::from_slice(&body).unwrap();
        assert_eq!(job.status, JobStatus::Success);
    }
}
