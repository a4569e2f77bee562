pub mod common;
pub mod get;
pub mod post;

use crate::state::AppState;
use axum::{
    Router,
    routing::{get as get_route, post as post_route},
};

pub fn faculty_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/courses",
            post_route(post::create_course).get(get::list_courses),
        )
        .route("/courses/{course_id}/students", get_route(get::course_students))
        .route("/sessions", post_route(post::create_session))
        .route(
            "/sessions/{session_id}/refresh-qr",
            post_route(post::refresh_qr),
        )
        .route("/sessions/{session_id}/stop", post_route(post::stop_session))
        .route(
            "/sessions/{session_id}/attendance",
            get_route(get::session_attendance),
        )
        .route(
            "/sessions/{session_id}/manual-attendance",
            post_route(post::manual_attendance),
        )
}
