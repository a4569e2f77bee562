//! Response helpers shared by every route module.
//!
//! Handlers return `Response` built through these so the
//! `{ success, data, message }` envelope stays uniform across the API.

use crate::auth::guards::Empty;
use crate::response::ApiResponse;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

pub fn ok<T: Serialize>(data: T, message: impl Into<String>) -> Response {
    (StatusCode::OK, Json(ApiResponse::success(data, message))).into_response()
}

pub fn err(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(ApiResponse::<Empty>::error(message))).into_response()
}

/// Error response that still carries machine-readable detail
/// (reason codes, computed distances).
pub fn err_with<T: Serialize>(status: StatusCode, data: T, message: impl Into<String>) -> Response {
    (status, Json(ApiResponse::error_with(data, message))).into_response()
}

/// Maps an infrastructure failure to the HTTP taxonomy: timeouts are
/// retryable 503s, anything else a 500. The raw error is logged, never
/// surfaced to the caller.
pub fn store_failure(error: &db::StoreError, context: &str) -> Response {
    tracing::error!(error = %error, context, "store operation failed");
    match error {
        db::StoreError::Timeout => err(StatusCode::SERVICE_UNAVAILABLE, context),
        _ => err(StatusCode::INTERNAL_SERVER_ERROR, context),
    }
}
