//! Faculty read routes: course listings, rosters, and live session
//! attendance. Everything here is served from denormalized attendance rows
//! — no per-student lookups on the hot path.

use axum::{
    Extension,
    extract::{Path, Query, State},
    http::StatusCode,
    response::Response,
};
use std::collections::HashSet;

use crate::auth::AuthUser;
use crate::routes::common::{err, ok, store_failure};
use crate::state::AppState;

use super::common::{
    AttendeeDto, ListCoursesResponse, RosterEntry, RosterQuery, RosterResponse,
    SessionAttendanceResponse,
};
use db::models::attendance_record::{AttendanceRecord, AttendanceStatus};
use db::models::course::Course;
use db::models::enrollment::Enrollment;
use db::models::session::Session;
use db::models::student::Student;

/// GET `/api/faculty/courses`
///
/// Lists the caller's courses.
pub async fn list_courses(
    State(state): State<AppState>,
    Extension(AuthUser(claims)): Extension<AuthUser>,
) -> Response {
    match Course::for_faculty(state.store(), &claims.sub).await {
        Ok(courses) => ok(
            ListCoursesResponse {
                courses: courses.into_iter().map(Into::into).collect(),
            },
            "Courses retrieved",
        ),
        Err(e) => store_failure(&e, "Failed to list courses"),
    }
}

/// GET `/api/faculty/courses/{course_id}/students`
///
/// Enrolled roster for a course the caller owns. With `?sessionId=`, each
/// entry also carries whether the student is present in that session.
pub async fn course_students(
    State(state): State<AppState>,
    Path(course_id): Path<String>,
    Extension(AuthUser(claims)): Extension<AuthUser>,
    Query(query): Query<RosterQuery>,
) -> Response {
    let course = match state.course_cached(&course_id).await {
        Ok(Some(course)) => course,
        Ok(None) => return err(StatusCode::NOT_FOUND, "Course not found"),
        Err(e) => return store_failure(&e, "Failed to load course"),
    };
    if course.faculty_id != claims.sub {
        return err(StatusCode::FORBIDDEN, "Not authorized for this course");
    }

    let enrollments = match Enrollment::active_for_course(state.store(), &course.id).await {
        Ok(v) => v,
        Err(e) => return store_failure(&e, "Failed to load enrollments"),
    };
    let student_ids: Vec<String> = enrollments.iter().map(|e| e.student_id.clone()).collect();
    let students = match Student::find_many(state.store(), &student_ids).await {
        Ok(v) => v,
        Err(e) => return store_failure(&e, "Failed to load enrolled students"),
    };

    let present: HashSet<String> = match &query.session_id {
        Some(session_id) => {
            match AttendanceRecord::for_session(state.store(), session_id).await {
                Ok(records) => records
                    .into_iter()
                    .filter(|r| r.status == AttendanceStatus::Present)
                    .map(|r| r.student_id)
                    .collect(),
                Err(e) => return store_failure(&e, "Failed to load attendance"),
            }
        }
        None => HashSet::new(),
    };

    let students = students
        .into_iter()
        .map(|s| RosterEntry {
            present: present.contains(&s.user_id),
            id: s.user_id,
            name: s.name,
            roll_no: s.roll_no,
        })
        .collect();

    ok(RosterResponse { students }, "Enrolled students retrieved")
}

/// GET `/api/faculty/sessions/{session_id}/attendance`
///
/// Live attendance for a session the caller owns: every row (present and
/// absent) newest mark first, plus the running counts.
pub async fn session_attendance(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Extension(AuthUser(claims)): Extension<AuthUser>,
) -> Response {
    let session = match Session::find(state.store(), &session_id).await {
        Ok(Some(session)) => session,
        Ok(None) => return err(StatusCode::NOT_FOUND, "Session not found"),
        Err(e) => return store_failure(&e, "Failed to load session"),
    };
    if session.faculty_id != claims.sub {
        return err(StatusCode::FORBIDDEN, "Not authorized for this session");
    }

    let records = match AttendanceRecord::for_session(state.store(), &session_id).await {
        Ok(v) => v,
        Err(e) => return store_failure(&e, "Failed to load attendance"),
    };

    let attendees: Vec<AttendeeDto> = records.into_iter().map(Into::into).collect();
    let present_count = attendees
        .iter()
        .filter(|a| a.status == AttendanceStatus::Present)
        .count() as i64;
    let total_attendees = attendees.len() as i64;

    ok(
        SessionAttendanceResponse {
            session: session.into(),
            attendees,
            present_count,
            total_attendees,
        },
        "Session attendance retrieved",
    )
}
