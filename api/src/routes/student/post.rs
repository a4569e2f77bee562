//! Student write routes. `scan` is the verification core's hot path: token
//! verify, session state, enrollment, geofence, ledger upsert, cache
//! invalidation — in that order, with each rejection mapped to its reason
//! code.

use axum::{
    Extension, Json,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::Response,
};
use chrono::Utc;

use crate::auth::AuthUser;
use crate::routes::common::{err, err_with, ok, store_failure};
use crate::routes::faculty::common::CourseDto;
use crate::state::AppState;

use super::common::{JoinCourseReq, LocationCheck, ScanReq, ScanResponse, VerifyLocationReq};
use db::AttendanceError;
use db::models::active_qr::ActiveQr;
use db::models::attendance_record::{AttendanceRecord, ScanEvidence};
use db::models::course::Course;
use db::models::enrollment::Enrollment;
use db::models::session::Session;
use util::geofence;
use util::qr::{self, QrError};

/// POST `/api/student/scan`
///
/// Redeems a QR payload as proof of presence.
///
/// **Auth**: student (router layer), device binding enforced by middleware.
///
/// Rejections carry a machine-readable `reason`:
/// `INVALID_SIGNATURE`/`EXPIRED` (400), `SESSION_NOT_FOUND`/
/// `SESSION_INACTIVE` (404), `NOT_ENROLLED` (403), `TOO_FAR` (400, with
/// `distance` and `maxDistance`), `ALREADY_MARKED` (400).
pub async fn scan(
    State(state): State<AppState>,
    Extension(AuthUser(claims)): Extension<AuthUser>,
    headers: HeaderMap,
    Json(body): Json<ScanReq>,
) -> Response {
    let payload = body.qr_payload;
    let now = Utc::now();

    // The stored active token supplies the current version for the advisory
    // version check; its absence is fine (session may have just rotated or
    // predate versioning).
    let current_version = match ActiveQr::find(state.store(), &payload.session_id).await {
        Ok(active) => active.map(|a| a.payload.qr_version),
        Err(e) => return store_failure(&e, "Failed to load active QR"),
    };

    if let Err(reason) = qr::verify(
        &payload,
        current_version,
        &util::config::qr_secret(),
        util::config::qr_grace_period_ms(),
        now,
    ) {
        return match reason {
            QrError::SignatureMismatch => err_with(
                StatusCode::BAD_REQUEST,
                ScanResponse::rejected("INVALID_SIGNATURE"),
                "Invalid QR signature",
            ),
            QrError::Expired => err_with(
                StatusCode::BAD_REQUEST,
                ScanResponse::rejected("EXPIRED"),
                "QR code has expired",
            ),
        };
    }

    let session = match Session::find(state.store(), &payload.session_id).await {
        Ok(Some(session)) => session,
        Ok(None) => {
            return err_with(
                StatusCode::NOT_FOUND,
                ScanResponse::rejected("SESSION_NOT_FOUND"),
                "Session not found",
            );
        }
        Err(e) => return store_failure(&e, "Failed to load session"),
    };
    if !session.is_active {
        return err_with(
            StatusCode::NOT_FOUND,
            ScanResponse::rejected("SESSION_INACTIVE"),
            "Session is no longer active",
        );
    }

    match Enrollment::is_active_for(state.store(), &claims.sub, &payload.course_id).await {
        Ok(true) => {}
        Ok(false) => {
            return err_with(
                StatusCode::FORBIDDEN,
                ScanResponse::rejected("NOT_ENROLLED"),
                "You are not enrolled in this course",
            );
        }
        Err(e) => return store_failure(&e, "Failed to check enrollment"),
    }

    // Geofence check only when the payload carries a fence and the client
    // supplied a location; callers are responsible for presence checks.
    let mut location_verified = true;
    let mut distance_from_class = 0.0;
    if let (Some(fence), Some(lat), Some(lng)) = (payload.location, body.latitude, body.longitude)
    {
        distance_from_class = fence.distance_to(lat, lng);
        location_verified = geofence::within_radius(distance_from_class, fence.radius_meters);
        if !location_verified {
            let distance = distance_from_class.round() as i64;
            let max_distance = fence.radius_meters.round() as i64;
            return err_with(
                StatusCode::BAD_REQUEST,
                ScanResponse::too_far(distance, max_distance),
                format!(
                    "You are too far from class location ({distance}m away, max {max_distance}m allowed)"
                ),
            );
        }
    }

    let student = match state.student_cached(&claims.sub).await {
        Ok(Some(student)) => student,
        Ok(None) => return err(StatusCode::NOT_FOUND, "Student profile not found"),
        Err(e) => return store_failure(&e, "Failed to load student profile"),
    };

    let evidence = ScanEvidence {
        location_verified,
        distance_from_class,
        qr_version: payload.qr_version,
        device_id: headers
            .get("x-device-id")
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned),
        student_latitude: body.latitude,
        student_longitude: body.longitude,
        accuracy: body.accuracy,
    };

    let record = match AttendanceRecord::upsert_present(
        state.store(),
        &session,
        &student,
        evidence,
        now,
    )
    .await
    {
        Ok(record) => record,
        Err(AttendanceError::AlreadyMarked) => {
            return err_with(
                StatusCode::BAD_REQUEST,
                ScanResponse::rejected("ALREADY_MARKED"),
                "Attendance already marked for this session",
            );
        }
        Err(AttendanceError::Store(e)) => return store_failure(&e, "Failed to mark attendance"),
        Err(AttendanceError::SessionInactive) => {
            return err_with(
                StatusCode::NOT_FOUND,
                ScanResponse::rejected("SESSION_INACTIVE"),
                "Session is no longer active",
            );
        }
    };

    // Synchronous, before the response: a dashboard read right after this
    // scan must not see pre-scan data.
    state.invalidate_student(&claims.sub);

    tracing::info!(
        session_id = %session.id,
        student_id = %claims.sub,
        distance = record.distance_from_class,
        "attendance marked"
    );

    ok(
        ScanResponse::present(distance_from_class.round() as i64),
        "Attendance marked successfully!",
    )
}

/// POST `/api/student/verify-location`
///
/// Pre-check against the campus geofence before opening the scanner. Does
/// not touch any session; purely advisory for the client.
pub async fn verify_location(
    Extension(AuthUser(claims)): Extension<AuthUser>,
    Json(body): Json<VerifyLocationReq>,
) -> Response {
    let (Some(latitude), Some(longitude)) = (body.latitude, body.longitude) else {
        return err(
            StatusCode::BAD_REQUEST,
            "Latitude and longitude are required",
        );
    };

    let distance = geofence::distance_meters(
        latitude,
        longitude,
        util::config::campus_latitude(),
        util::config::campus_longitude(),
    );
    let max_distance = util::config::campus_geofence_radius();
    let check = LocationCheck {
        valid: geofence::within_radius(distance, max_distance),
        distance: distance.round() as i64,
        max_distance: max_distance.round() as i64,
        accuracy: body.accuracy,
    };

    if !check.valid {
        return err_with(
            StatusCode::FORBIDDEN,
            check,
            format!(
                "You are too far from campus ({}m away, max {}m allowed)",
                distance.round(),
                max_distance.round()
            ),
        );
    }

    tracing::info!(
        student_id = %claims.sub,
        distance = check.distance,
        "location verified"
    );
    ok(check, "Location verified successfully")
}

/// POST `/api/student/join-course`
///
/// Redeems a join code: creates the enrollment, bumps the course's enrolled
/// count, and invalidates every cache namespace the write touches.
pub async fn join_course(
    State(state): State<AppState>,
    Extension(AuthUser(claims)): Extension<AuthUser>,
    Json(body): Json<JoinCourseReq>,
) -> Response {
    let Some(join_code) = body.join_code.filter(|c| !c.is_empty()) else {
        return err(StatusCode::BAD_REQUEST, "joinCode is required");
    };

    let course = match Course::find_by_join_code(state.store(), &join_code).await {
        Ok(Some(course)) => course,
        Ok(None) => return err(StatusCode::NOT_FOUND, "Invalid join code"),
        Err(e) => return store_failure(&e, "Failed to look up join code"),
    };

    match Enrollment::exists_for(state.store(), &claims.sub, &course.id).await {
        Ok(false) => {}
        Ok(true) => return err(StatusCode::BAD_REQUEST, "Already enrolled in this course"),
        Err(e) => return store_failure(&e, "Failed to check enrollment"),
    }

    if let Err(e) =
        Enrollment::create(state.store(), &claims.sub, &course.id, Some("join-code"), Utc::now())
            .await
    {
        return store_failure(&e, "Failed to join course");
    }
    if let Err(e) = Course::increment_enrolled(state.store(), &course.id, 1).await {
        return store_failure(&e, "Failed to join course");
    }

    state.invalidate_student(&claims.sub);
    state.invalidate_course(&course.id);

    ok(CourseDto::from(course), "Successfully joined course")
}
