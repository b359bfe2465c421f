//! HTTP API errors

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    /// 404
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// 400
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// 503, the relational store is not configured for this router
    #[error("Relational store unavailable")]
    StoreUnavailable,

    #[error("Common error: {0}")]
    Common(#[from] jfai_common::Error),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            ApiError::StoreUnavailable => (StatusCode::SERVICE_UNAVAILABLE, "STORE_UNAVAILABLE"),
            ApiError::Common(e) => {
                tracing::error!(error = %e, "Media query failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "DATABASE_ERROR")
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": self.to_string(),
            }
        }));

        (status, body).into_response()
    }
}
