use crate::routes::common::ok;
use crate::state::AppState;
use axum::{Router, response::Response, routing::get};
use chrono::Utc;
use serde_json::json;

pub fn health_routes() -> Router<AppState> {
    Router::new().route("/", get(health))
}

/// GET `/api/health`
///
/// Liveness probe; public, not rate limited.
async fn health() -> Response {
    ok(
        json!({ "status": "ok", "timestamp": Utc::now().to_rfc3339() }),
        "Service healthy",
    )
}
