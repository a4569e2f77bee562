//! Test-app builder and request plumbing shared by the route suites.
//!
//! Every test gets its own in-memory store, caches, and rate limiter, so
//! suites cannot bleed state into each other.

use api::routes::routes;
use api::state::AppState;
use axum::{
    Router,
    body::Body,
    extract::ConnectInfo,
    http::{Request, StatusCode},
};
use db::MemoryStore;
use serde_json::Value;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use tower::ServiceExt;

pub async fn make_test_app() -> (Router, AppState) {
    let store = Arc::new(MemoryStore::new());
    let app_state = AppState::new(store);
    let router = Router::new().nest("/api", routes(app_state.clone()));
    (router, app_state)
}

/// Builds a JSON request with the bits nearly every test needs: bearer
/// token, client IP (the server normally gets it from connect info),
/// device header, body.
pub fn request(
    method: &str,
    uri: &str,
    token: Option<&str>,
    ip: [u8; 4],
    device_id: Option<&str>,
    body: Option<Value>,
) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("Content-Type", "application/json");
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {token}"));
    }
    if let Some(device_id) = device_id {
        builder = builder.header("x-device-id", device_id);
    }

    let body = match body {
        Some(value) => Body::from(value.to_string()),
        None => Body::empty(),
    };
    let mut req = builder.body(body).expect("request");

    let addr = SocketAddr::new(IpAddr::V4(Ipv4Addr::from(ip)), 43210);
    req.extensions_mut().insert(ConnectInfo(addr));
    req
}

/// Fires the request and returns status plus parsed JSON body.
pub async fn send(router: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let resp = router.clone().oneshot(req).await.expect("infallible");
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("body");
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("json body")
    };
    (status, json)
}
