//! HTTP error responses

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Errors surfaced by the HTTP handlers. Internal detail is logged, never
/// returned to the client.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Internal server error")]
    Internal,
    #[error("Failed to get database stats")]
    Stats,
    #[error("Failed to get schema")]
    Schema,
    #[error("Failed to browse data")]
    Browse,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "detail": self.to_string() })),
        )
            .into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
