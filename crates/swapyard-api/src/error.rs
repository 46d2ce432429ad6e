use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use tracing::error;

use swapyard_db::StoreError;

/// HTTP-facing error taxonomy. Validation rejects before any mutation;
/// NotFound/Forbidden/Conflict pass the storage layer's reasons through.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(&'static str),
    #[error("not found")]
    NotFound,
    #[error("{0}")]
    Forbidden(&'static str),
    #[error("{0}")]
    Conflict(&'static str),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => ApiError::NotFound,
            StoreError::Forbidden(reason) => ApiError::Forbidden(reason),
            StoreError::Conflict(reason) => ApiError::Conflict(reason),
            StoreError::Storage(e) => ApiError::Internal(e.into()),
            StoreError::Internal(msg) => ApiError::Internal(anyhow::anyhow!(msg)),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::Validation(reason) => (StatusCode::BAD_REQUEST, reason.to_string()),
            ApiError::NotFound => (StatusCode::NOT_FOUND, "not found".to_string()),
            ApiError::Forbidden(reason) => (StatusCode::FORBIDDEN, reason.to_string()),
            ApiError::Conflict(reason) => (StatusCode::CONFLICT, reason.to_string()),
            ApiError::Internal(e) => {
                error!("internal error: {e:#}");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal error".to_string())
            }
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}
