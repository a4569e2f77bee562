//! HTTP route entry point for `/api/...`.
//!
//! Route groups:
//! - `/health` → liveness (public, outside the rate limiter)
//! - `/faculty` → course and session management (faculty role)
//! - `/student` → scan, join-course, history, dashboard (student role;
//!   device binding on the scan path)
//! - `/system` → cache statistics (any authenticated user)
//!
//! Everything except `/health` sits behind the fixed-window rate limiter.

use crate::auth::guards::{allow_authenticated, require_faculty, require_student};
use crate::auth::middleware::rate_limit;
use crate::state::AppState;
use axum::{
    Router,
    middleware::{from_fn, from_fn_with_state},
};

pub mod common;
pub mod faculty;
pub mod health;
pub mod student;
pub mod system;

/// Builds the complete application router for all HTTP endpoints.
pub fn routes(app_state: AppState) -> Router {
    let limited = Router::new()
        .nest(
            "/faculty",
            faculty::faculty_routes().route_layer(from_fn(require_faculty)),
        )
        .nest(
            "/student",
            student::student_routes(app_state.clone()).route_layer(from_fn(require_student)),
        )
        .nest(
            "/system",
            system::system_routes().route_layer(from_fn(allow_authenticated)),
        )
        .layer(from_fn_with_state(app_state.clone(), rate_limit));

    Router::new()
        .nest("/health", health::health_routes())
        .merge(limited)
        .with_state(app_state)
}
