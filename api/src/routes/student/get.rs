//! Student read routes, served from denormalized rows and the read-through
//! caches.

use axum::{
    Extension,
    extract::{Query, State},
    http::StatusCode,
    response::Response,
};
use serde_json::json;

use crate::auth::AuthUser;
use crate::routes::common::{err, ok, store_failure};
use crate::routes::faculty::common::CourseDto;
use crate::state::AppState;

use super::common::{HistoryQuery, HistoryRecordDto, HistoryResponse};
use db::models::attendance_record::{AttendanceRecord, AttendanceStatus};
use db::models::course::Course;
use db::models::enrollment::Enrollment;

/// GET `/api/student/attendance-history`
///
/// Paginated history for the caller, optionally filtered by `courseId`.
/// Every row is self-contained (denormalized course snapshot), so this
/// endpoint never reads course or profile documents.
pub async fn attendance_history(
    State(state): State<AppState>,
    Extension(AuthUser(claims)): Extension<AuthUser>,
    Query(query): Query<HistoryQuery>,
) -> Response {
    let limit = query.limit.unwrap_or(50).clamp(1, 200);
    let offset = query.offset.unwrap_or(0);

    let records = match AttendanceRecord::history_for_student(
        state.store(),
        &claims.sub,
        query.course_id.as_deref(),
        limit,
        offset,
    )
    .await
    {
        Ok(v) => v,
        Err(e) => return store_failure(&e, "Failed to fetch attendance history"),
    };

    let total = records.len();
    ok(
        HistoryResponse {
            attendance_records: records.into_iter().map(HistoryRecordDto::from).collect(),
            has_more: total == limit,
            total,
        },
        "Attendance history retrieved",
    )
}

/// GET `/api/student/dashboard`
///
/// Enrolled courses plus aggregate attendance stats. Cached under
/// `dashboard:{studentId}` on the short TTL; every mutating student
/// operation invalidates that namespace before responding.
pub async fn dashboard(
    State(state): State<AppState>,
    Extension(AuthUser(claims)): Extension<AuthUser>,
) -> Response {
    let cache_key = format!("dashboard:{}", claims.sub);
    if let Some(cached) = state.caches().dashboards.get(&cache_key) {
        tracing::debug!(student_id = %claims.sub, "dashboard cache hit");
        return ok(cached, "Dashboard retrieved");
    }

    let student = match state.student_cached(&claims.sub).await {
        Ok(Some(student)) => student,
        Ok(None) => return err(StatusCode::NOT_FOUND, "Student profile not found"),
        Err(e) => return store_failure(&e, "Failed to load student profile"),
    };

    let enrollments = match Enrollment::active_for_student(state.store(), &claims.sub).await {
        Ok(v) => v,
        Err(e) => return store_failure(&e, "Failed to load enrollments"),
    };
    let course_ids: Vec<String> = enrollments.iter().map(|e| e.course_id.clone()).collect();
    let courses = match Course::find_many(state.store(), &course_ids).await {
        Ok(v) => v,
        Err(e) => return store_failure(&e, "Failed to load courses"),
    };

    let records = match AttendanceRecord::history_for_student(
        state.store(),
        &claims.sub,
        None,
        usize::MAX,
        0,
    )
    .await
    {
        Ok(v) => v,
        Err(e) => return store_failure(&e, "Failed to load attendance"),
    };

    let total_classes = records.len();
    let present_count = records
        .iter()
        .filter(|r| r.status == AttendanceStatus::Present)
        .count();
    let attendance_percentage = if total_classes > 0 {
        (present_count as f64 / total_classes as f64) * 100.0
    } else {
        0.0
    };

    let result = json!({
        "student": student,
        "courses": courses.into_iter().map(CourseDto::from).collect::<Vec<_>>(),
        "stats": {
            "totalClasses": total_classes,
            "presentCount": present_count,
            "absentCount": total_classes - present_count,
            "attendancePercentage": format!("{attendance_percentage:.1}"),
        },
    });

    state.caches().dashboards.set(cache_key, result.clone());
    ok(result, "Dashboard retrieved")
}
