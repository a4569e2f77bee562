//! Faculty write routes: course creation, session lifecycle, QR rotation,
//! and manual attendance overrides.

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::Response,
};
use chrono::Utc;
use validator::Validate;

use crate::auth::AuthUser;
use crate::routes::common::{err, ok, store_failure};
use crate::state::AppState;
use common::format_validation_errors;

use super::common::{
    AttendeeDto, CreateCourseReq, CreateCourseResponse, CreateSessionReq, RefreshQrResponse,
    StartSessionResponse,
};
use db::models::active_qr::ActiveQr;
use db::models::attendance_record::{AttendanceRecord, AttendanceStatus};
use db::models::course::Course;
use db::models::enrollment::Enrollment;
use db::models::faculty::Faculty;
use db::models::session::{Session, StartSession};
use db::models::student::Student;
use db::AttendanceError;
use util::geofence::Geofence;

/// POST `/api/faculty/courses`
///
/// Creates a course owned by the caller, with a unique join code. The
/// caller's faculty profile is auto-created on first use so the student app
/// always has a name to display.
pub async fn create_course(
    State(state): State<AppState>,
    Extension(AuthUser(claims)): Extension<AuthUser>,
    Json(body): Json<CreateCourseReq>,
) -> Response {
    if let Err(errors) = body.validate() {
        return err(StatusCode::BAD_REQUEST, format_validation_errors(&errors));
    }

    let now = Utc::now();
    match state.faculty_cached(&claims.sub).await {
        Ok(Some(_)) => {}
        Ok(None) => {
            let name = claims
                .email
                .as_deref()
                .and_then(|e| e.split('@').next())
                .unwrap_or("Faculty")
                .to_owned();
            let profile = Faculty {
                user_id: claims.sub.clone(),
                email: claims.email.clone(),
                name,
                department: Some(body.department.clone()),
                created_at: now,
                updated_at: now,
            };
            if let Err(e) = profile.save(state.store()).await {
                return store_failure(&e, "Failed to create faculty profile");
            }
        }
        Err(e) => return store_failure(&e, "Failed to load faculty profile"),
    }

    match Course::create(
        state.store(),
        &claims.sub,
        &body.code,
        &body.name,
        &body.department,
        body.academic_year.clone(),
        now,
    )
    .await
    {
        Ok(course) => ok(
            CreateCourseResponse {
                course_id: course.id.clone(),
                course: course.into(),
            },
            "Course created",
        ),
        Err(e) => store_failure(&e, "Failed to create course"),
    }
}

/// POST `/api/faculty/sessions`
///
/// Starts a session for a course the caller owns and issues the first QR
/// payload. Pre-creates an `absent` attendance row for every enrolled
/// student and stores the active token for the scan path's version check.
pub async fn create_session(
    State(state): State<AppState>,
    Extension(AuthUser(claims)): Extension<AuthUser>,
    Json(body): Json<CreateSessionReq>,
) -> Response {
    if let Err(errors) = body.validate() {
        return err(StatusCode::BAD_REQUEST, format_validation_errors(&errors));
    }
    let Some(location) = body.location else {
        return err(
            StatusCode::BAD_REQUEST,
            "location.latitude and location.longitude are required",
        );
    };

    let course = match state.course_cached(&body.course_id).await {
        Ok(Some(course)) => course,
        Ok(None) => return err(StatusCode::NOT_FOUND, "Course not found"),
        Err(e) => return store_failure(&e, "Failed to load course"),
    };
    if course.faculty_id != claims.sub {
        return err(
            StatusCode::FORBIDDEN,
            "You are not authorized to create sessions for this course",
        );
    }

    let radius = location.radius.unwrap_or(50.0).clamp(
        util::config::min_geofence_radius(),
        util::config::max_geofence_radius(),
    );
    let geofence = Geofence::new(location.latitude, location.longitude, radius);
    let refresh_interval = body.refresh_interval_seconds.unwrap_or(5).clamp(5, 300);

    let enrollments = match Enrollment::active_for_course(state.store(), &course.id).await {
        Ok(v) => v,
        Err(e) => return store_failure(&e, "Failed to load enrollments"),
    };
    let student_ids: Vec<String> = enrollments.iter().map(|e| e.student_id.clone()).collect();
    let roster = match Student::find_many(state.store(), &student_ids).await {
        Ok(v) => v,
        Err(e) => return store_failure(&e, "Failed to load enrolled students"),
    };

    let now = Utc::now();
    let session = match Session::start(
        state.store(),
        &course,
        StartSession {
            geofence,
            refresh_interval_seconds: refresh_interval,
            class_type: body.class_type.unwrap_or_else(|| "Theory".into()),
            room_number: body.room_number,
            scheduled_start: None,
        },
        &roster,
        now,
    )
    .await
    {
        Ok(session) => session,
        Err(e) => return store_failure(&e, "Failed to start session"),
    };

    let payload = util::qr::issue(
        &session.id,
        &course.id,
        &claims.sub,
        Some(geofence),
        refresh_interval * 1000,
        session.qr_version,
        &util::config::qr_secret(),
        now,
    );
    if let Err(e) = ActiveQr::put(state.store(), &payload, now).await {
        return store_failure(&e, "Failed to store active QR");
    }

    tracing::info!(
        session_id = %session.id,
        course_id = %course.id,
        total_students = session.total_students,
        "session started"
    );

    ok(
        StartSessionResponse {
            session_id: session.id.clone(),
            qr_payload: payload,
            expires_in: refresh_interval,
            session: session.into(),
        },
        "Session started",
    )
}

/// POST `/api/faculty/sessions/{session_id}/refresh-qr`
///
/// Rotates the session's QR: bumps `qrVersion`, issues a fresh payload, and
/// overwrites the active token. No lock spans rotation and scanning; a scan
/// carrying the previous version stays valid inside the grace window.
pub async fn refresh_qr(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Extension(AuthUser(claims)): Extension<AuthUser>,
) -> Response {
    let mut session = match Session::find(state.store(), &session_id).await {
        Ok(Some(session)) => session,
        Ok(None) => return err(StatusCode::NOT_FOUND, "Session not found"),
        Err(e) => return store_failure(&e, "Failed to load session"),
    };
    if session.faculty_id != claims.sub {
        return err(StatusCode::FORBIDDEN, "Not authorized for this session");
    }

    let version = match session.rotate_qr(state.store()).await {
        Ok(version) => version,
        Err(AttendanceError::SessionInactive) => {
            return err(StatusCode::BAD_REQUEST, "Session is not active");
        }
        Err(AttendanceError::Store(e)) => return store_failure(&e, "Failed to rotate QR"),
        Err(other) => {
            tracing::error!(error = %other, "unexpected rotation failure");
            return err(StatusCode::INTERNAL_SERVER_ERROR, "Failed to rotate QR");
        }
    };

    let now = Utc::now();
    let payload = util::qr::issue(
        &session.id,
        &session.course_id,
        &session.faculty_id,
        Some(session.geofence()),
        session.qr_refresh_interval_seconds * 1000,
        version,
        &util::config::qr_secret(),
        now,
    );
    if let Err(e) = ActiveQr::put(state.store(), &payload, now).await {
        return store_failure(&e, "Failed to store active QR");
    }

    ok(
        RefreshQrResponse {
            qr_payload: payload,
            qr_version: version,
            expires_in: session.qr_refresh_interval_seconds,
        },
        "QR refreshed",
    )
}

/// POST `/api/faculty/sessions/{session_id}/stop`
///
/// Stops the session and removes its active QR token. Terminal: no further
/// transitions, scans against it are rejected. Idempotent.
pub async fn stop_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Extension(AuthUser(claims)): Extension<AuthUser>,
) -> Response {
    let mut session = match Session::find(state.store(), &session_id).await {
        Ok(Some(session)) => session,
        Ok(None) => return err(StatusCode::NOT_FOUND, "Session not found"),
        Err(e) => return store_failure(&e, "Failed to load session"),
    };
    if session.faculty_id != claims.sub {
        return err(StatusCode::FORBIDDEN, "Not authorized for this session");
    }

    if let Err(e) = session.stop(state.store(), Utc::now()).await {
        return store_failure(&e, "Failed to stop session");
    }

    tracing::info!(session_id = %session.id, "session stopped");
    ok((), "Session stopped successfully")
}

/// POST `/api/faculty/sessions/{session_id}/manual-attendance`
///
/// Faculty override for one student's status. `presentCount` moves by the
/// signed delta between previous and new status, so repeated clicks cannot
/// drift the counter.
pub async fn manual_attendance(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Extension(AuthUser(claims)): Extension<AuthUser>,
    Json(body): Json<super::common::ManualAttendanceReq>,
) -> Response {
    let status = match body.status.as_str() {
        "present" => AttendanceStatus::Present,
        "absent" => AttendanceStatus::Absent,
        _ => {
            return err(
                StatusCode::BAD_REQUEST,
                "studentId and status (present/absent) are required",
            );
        }
    };
    if body.student_id.is_empty() {
        return err(
            StatusCode::BAD_REQUEST,
            "studentId and status (present/absent) are required",
        );
    }

    let session = match Session::find(state.store(), &session_id).await {
        Ok(Some(session)) => session,
        Ok(None) => return err(StatusCode::NOT_FOUND, "Session not found"),
        Err(e) => return store_failure(&e, "Failed to load session"),
    };
    if session.faculty_id != claims.sub {
        return err(StatusCode::FORBIDDEN, "Not authorized for this session");
    }

    let student = match Student::find(state.store(), &body.student_id).await {
        Ok(Some(student)) => student,
        Ok(None) => return err(StatusCode::NOT_FOUND, "Student not found"),
        Err(e) => return store_failure(&e, "Failed to load student"),
    };

    let record = match AttendanceRecord::manual_set(
        state.store(),
        &session,
        &student,
        status,
        Utc::now(),
    )
    .await
    {
        Ok(record) => record,
        Err(AttendanceError::Store(e)) => return store_failure(&e, "Failed to mark attendance"),
        Err(other) => {
            tracing::error!(error = %other, "unexpected manual attendance failure");
            return err(StatusCode::INTERNAL_SERVER_ERROR, "Failed to mark attendance");
        }
    };

    state.invalidate_student(&body.student_id);

    ok(
        AttendeeDto::from(record),
        format!("Student marked {}", body.status),
    )
}
