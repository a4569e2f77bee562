use chrono::{DateTime, Utc};
use db::models::attendance_record::{AttendanceRecord, AttendanceStatus, MarkedBy};
use db::models::course::Course;
use db::models::session::Session;
use serde::{Deserialize, Serialize};
use util::geofence::Geofence;
use util::qr::QrPayload;
use validator::Validate;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationReq {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub radius: Option<f64>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionReq {
    #[validate(length(min = 1, message = "courseId is required"))]
    pub course_id: String,
    pub location: Option<LocationReq>,
    #[serde(default)]
    pub refresh_interval_seconds: Option<i64>,
    #[serde(default)]
    pub class_type: Option<String>,
    #[serde(default)]
    pub room_number: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionDto {
    pub id: String,
    pub course_id: String,
    pub course_name: String,
    pub course_code: String,
    pub faculty_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub room_number: Option<String>,
    pub class_type: String,
    pub location: Geofence,
    pub qr_version: i64,
    pub qr_refresh_interval_seconds: i64,
    pub present_count: i64,
    pub total_students: i64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<DateTime<Utc>>,
}

impl From<Session> for SessionDto {
    fn from(s: Session) -> Self {
        let location = s.geofence();
        Self {
            id: s.id,
            course_id: s.course_id,
            course_name: s.course_name,
            course_code: s.course_code,
            faculty_id: s.faculty_id,
            room_number: s.room_number,
            class_type: s.class_type,
            location,
            qr_version: s.qr_version,
            qr_refresh_interval_seconds: s.qr_refresh_interval_seconds,
            present_count: s.present_count,
            total_students: s.total_students,
            is_active: s.is_active,
            created_at: s.created_at,
            ended_at: s.ended_at,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartSessionResponse {
    pub session_id: String,
    pub qr_payload: QrPayload,
    /// Seconds until the issued code expires.
    pub expires_in: i64,
    pub session: SessionDto,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshQrResponse {
    pub qr_payload: QrPayload,
    pub qr_version: i64,
    pub expires_in: i64,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateCourseReq {
    #[validate(length(min = 1, message = "code is required"))]
    pub code: String,
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,
    #[validate(length(min = 1, message = "department is required"))]
    pub department: String,
    #[serde(default)]
    pub academic_year: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseDto {
    pub id: String,
    pub code: String,
    pub name: String,
    pub department: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub academic_year: Option<String>,
    pub faculty_id: String,
    pub join_code: String,
    pub enrolled_count: i64,
    pub is_active: bool,
}

impl From<Course> for CourseDto {
    fn from(c: Course) -> Self {
        Self {
            id: c.id,
            code: c.code,
            name: c.name,
            department: c.department,
            academic_year: c.academic_year,
            faculty_id: c.faculty_id,
            join_code: c.join_code,
            enrolled_count: c.enrolled_count,
            is_active: c.is_active,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCourseResponse {
    pub course_id: String,
    pub course: CourseDto,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListCoursesResponse {
    pub courses: Vec<CourseDto>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManualAttendanceReq {
    #[serde(default)]
    pub student_id: String,
    #[serde(default)]
    pub status: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendeeDto {
    pub id: String,
    pub student_id: String,
    pub student_name: String,
    pub roll_no: String,
    pub status: AttendanceStatus,
    pub marked_at: Option<DateTime<Utc>>,
    pub marked_by: MarkedBy,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance: Option<f64>,
    pub location_verified: bool,
}

impl From<AttendanceRecord> for AttendeeDto {
    fn from(r: AttendanceRecord) -> Self {
        Self {
            id: r.id,
            student_id: r.student_id,
            student_name: r.student_name,
            roll_no: r.student_roll_no,
            status: r.status,
            marked_at: r.marked_at,
            marked_by: r.marked_by,
            distance: r.distance_from_class,
            location_verified: r.location_verified,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionAttendanceResponse {
    pub session: SessionDto,
    pub attendees: Vec<AttendeeDto>,
    pub present_count: i64,
    pub total_attendees: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterQuery {
    #[serde(default)]
    pub session_id: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterEntry {
    pub id: String,
    pub name: String,
    pub roll_no: String,
    pub present: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterResponse {
    pub students: Vec<RosterEntry>,
}
