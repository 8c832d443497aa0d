// SPDX-License-Identifier: MIT

//! One `IntoResponse` impl translating every subsystem's error enum into
//! the taxonomy's status codes, per the propagation policy: subsystem
//! boundaries return `Result<T, E>`, this layer maps them to HTTP.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use ff_engine::OrchestratorError;
use ff_storage::StorageError;
use ff_webhook::IntakeError;
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Orchestrator(#[from] OrchestratorError),
    #[error(transparent)]
    Intake(#[from] IntakeError),
    #[error("invalid request: {0}")]
    BadRequest(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::Storage(StorageError::NotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::Storage(StorageError::DuplicateDelivery(_)) => StatusCode::CONFLICT,
            ApiError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Orchestrator(OrchestratorError::NotFailed(_)) => StatusCode::CONFLICT,
            ApiError::Orchestrator(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Intake(IntakeError::InvalidSignature) => StatusCode::UNAUTHORIZED,
            ApiError::Intake(IntakeError::MissingDeliveryId) => StatusCode::BAD_REQUEST,
            ApiError::Intake(IntakeError::DuplicateDelivery) => StatusCode::CONFLICT,
            ApiError::Intake(IntakeError::RepositorySync(_)) => StatusCode::BAD_GATEWAY,
            ApiError::Intake(IntakeError::Storage(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
        };
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
