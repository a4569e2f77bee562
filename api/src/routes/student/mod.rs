pub mod common;
pub mod get;
pub mod post;

use crate::auth::middleware::verify_device_binding;
use crate::state::AppState;
use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{get as get_route, post as post_route},
};

pub fn student_routes(app_state: AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/scan",
            post_route(post::scan)
                .layer(from_fn_with_state(app_state, verify_device_binding)),
        )
        .route("/verify-location", post_route(post::verify_location))
        .route("/join-course", post_route(post::join_course))
        .route("/attendance-history", get_route(get::attendance_history))
        .route("/dashboard", get_route(get::dashboard))
}
