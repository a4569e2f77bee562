use crate::auth::claims::AuthUser;
use crate::response::ApiResponse;
use crate::state::AppState;
use axum::{
    Json,
    body::Body,
    extract::{ConnectInfo, FromRequestParts, State},
    http::{Method, Request, StatusCode},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::TypedHeader;
use chrono::Utc;
use db::models::student::Student;
use headers::{Origin, UserAgent};
use serde_json::{Value, json};
use std::net::SocketAddr;
use tracing::info;
use util::rate_limit::Decision;

/// Logs method, path, IP address, subject (if authenticated), origin, and
/// user-agent for each incoming HTTP request. Automatically skips CORS
/// preflight `OPTIONS` requests.
pub async fn log_request(
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    let (mut parts, body) = req.into_parts();

    // Skip logging for preflight requests
    if parts.method == Method::OPTIONS {
        let req = Request::from_parts(parts, body);
        return Ok(next.run(req).await);
    }

    let subject = AuthUser::from_request_parts(&mut parts, &())
        .await
        .ok()
        .map(|AuthUser(c)| c.sub);

    let origin = TypedHeader::<Origin>::from_request_parts(&mut parts, &())
        .await
        .ok()
        .map(|TypedHeader(o)| o.to_string());

    let user_agent = TypedHeader::<UserAgent>::from_request_parts(&mut parts, &())
        .await
        .ok()
        .map(|TypedHeader(ua)| ua.to_string());

    info!(
        method = ?parts.method,
        path = %parts.uri.path(),
        ip = %addr.ip(),
        user = subject.as_deref().unwrap_or("anonymous"),
        origin = origin.unwrap_or_else(|| "unknown".into()),
        user_agent = user_agent.unwrap_or_else(|| "unknown".into()),
        "Incoming request"
    );

    let req = Request::from_parts(parts, body);
    Ok(next.run(req).await)
}

/// Fixed-window rate limiting keyed by client IP. Over-cap requests get a
/// 429 with a `retryAfter` hint computed from the window reset time.
pub async fn rate_limit(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, (StatusCode, Json<ApiResponse<Value>>)> {
    match state.limiter().check(&addr.ip().to_string()) {
        Decision::Allowed => Ok(next.run(req).await),
        Decision::Limited { retry_after_secs } => Err((
            StatusCode::TOO_MANY_REQUESTS,
            Json(ApiResponse::error_with(
                json!({ "retryAfter": retry_after_secs }),
                "Too many requests. Please try again later.",
            )),
        )),
    }
}

/// Device-binding gate for scan traffic.
///
/// Compares the `x-device-id` header against the student's bound device.
/// First use binds the device to the account; later mismatches reject. The
/// binding is sticky and only an administrative reset (outside this core)
/// can undo it.
pub async fn verify_device_binding(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, (StatusCode, Json<ApiResponse<Value>>)> {
    let Some(AuthUser(claims)) = req.extensions().get::<AuthUser>().cloned() else {
        return Err((
            StatusCode::UNAUTHORIZED,
            Json(ApiResponse::error("Authentication required")),
        ));
    };

    let device_id = req
        .headers()
        .get("x-device-id")
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);
    let Some(device_id) = device_id.filter(|d| !d.is_empty()) else {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::error("Device ID required")),
        ));
    };

    let student = state.student_cached(&claims.sub).await.map_err(|e| {
        tracing::error!(error = %e, "device verification failed");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiResponse::error("Device verification failed")),
        )
    })?;
    let Some(student) = student else {
        return Err((
            StatusCode::NOT_FOUND,
            Json(ApiResponse::error("Student profile not found")),
        ));
    };

    match &student.device_id {
        Some(bound) if *bound != device_id => {
            info!(
                student_id = %claims.sub,
                bound_device = %bound,
                current_device = %device_id,
                "device mismatch"
            );
            Err((
                StatusCode::FORBIDDEN,
                Json(ApiResponse::error_with(
                    json!({
                        "reason": "DEVICE_MISMATCH",
                        "boundDevice": bound,
                        "currentDevice": device_id,
                    }),
                    "This account is bound to a different device. Please contact your administrator.",
                )),
            ))
        }
        Some(_) => Ok(next.run(req).await),
        None => {
            Student::bind_device(state.store(), &claims.sub, &device_id, Utc::now())
                .await
                .map_err(|e| {
                    tracing::error!(error = %e, "device binding failed");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        Json(ApiResponse::error("Device verification failed")),
                    )
                })?;
            state.invalidate_student(&claims.sub);
            info!(student_id = %claims.sub, device_id = %device_id, "device bound");
            Ok(next.run(req).await)
        }
    }
}
