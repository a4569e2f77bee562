use crate::routes::common::ok;
use crate::state::AppState;
use axum::{Router, extract::State, response::Response, routing::get};
use serde_json::json;

pub fn system_routes() -> Router<AppState> {
    Router::new().route("/cache-stats", get(cache_stats))
}

/// GET `/api/system/cache-stats`
///
/// Cache occupancy and rate-limiter pressure, for monitoring.
///
/// **Auth**: any authenticated user (router layer).
async fn cache_stats(State(state): State<AppState>) -> Response {
    let caches = state.caches();
    ok(
        json!({
            "caches": {
                "students": caches.students.stats(),
                "courses": caches.courses.stats(),
                "faculty": caches.faculty.stats(),
                "dashboards": caches.dashboards.stats(),
            },
            "rateLimiting": {
                "activeClients": state.limiter().active_clients(),
            },
        }),
        "Cache statistics",
    )
}
