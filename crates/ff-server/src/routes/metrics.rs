// SPDX-License-Identifier: MIT

use axum::extract::{Query, State};
use axum::Json;
use ff_core::agent::AgentId;
use ff_core::metric::Metric;
use ff_core::Clock;
use ff_storage::MetricSummary;
use serde::Deserialize;

use crate::error::ApiResult;
use crate::state::AppState;

const DEFAULT_LIMIT: i64 = 200;
const DEFAULT_SINCE_HOURS: i64 = 24;

#[derive(Debug, Deserialize)]
pub struct ListMetricsQuery {
    pub limit: Option<i64>,
    pub metric_type: Option<String>,
}

pub async fn list(State(state): State<AppState>, Query(query): Query<ListMetricsQuery>) -> ApiResult<Json<Vec<Metric>>> {
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT);
    let metrics = match query.metric_type {
        Some(metric_type) => state.store.metrics.list_by_type(&metric_type, limit).await?,
        None => state.store.metrics.list_recent(limit).await?,
    };
    Ok(Json(metrics))
}

#[derive(Debug, Deserialize)]
pub struct CreateMetricRequest {
    pub metric_type: String,
    pub value: f64,
    pub agent_id: Option<String>,
}

pub async fn create(State(state): State<AppState>, Json(req): Json<CreateMetricRequest>) -> ApiResult<Json<Metric>> {
    let mut metric = Metric::new(req.metric_type, req.value, state.clock.utc_now());
    if let Some(agent_id) = req.agent_id {
        metric = metric.with_agent(AgentId::from_string(agent_id));
    }
    state.store.metrics.insert(&metric).await?;
    Ok(Json(metric))
}

#[derive(Debug, Deserialize)]
pub struct SummaryQuery {
    pub since_hours: Option<i64>,
}

pub async fn summary(State(state): State<AppState>, Query(query): Query<SummaryQuery>) -> ApiResult<Json<Vec<MetricSummary>>> {
    let since_hours = query.since_hours.unwrap_or(DEFAULT_SINCE_HOURS);
    Ok(Json(state.store.metrics.summary(since_hours, state.clock.utc_now()).await?))
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
    async fn recorded_metric_appears_in_the_summary() {
        let app = test_app().await;
        let body = serde_json::to_vec(&serde_json::json!({ "metric_type": "binary_size_kb", "value": 128.0 })).unwrap();
        app.clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/metrics")
                    .header("content-type", "application/json")
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();

        let response = app.oneshot(Request::builder().uri("/api/metrics/summary").body(Body::empty()).unwrap()).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let summaries: Vec<MetricSummary> = serde_json::from_slice(&body).unwrap();
        assert!(summaries.iter().any(|s| s.metric_type == "binary_size_kb"));
    }
}
