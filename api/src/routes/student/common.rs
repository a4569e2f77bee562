use chrono::{DateTime, Utc};
use db::models::attendance_record::{AttendanceRecord, AttendanceStatus, MarkedBy};
use serde::{Deserialize, Serialize};
use util::qr::QrPayload;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanReq {
    pub qr_payload: QrPayload,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub accuracy: Option<f64>,
}

/// Single response shape for the scan endpoint: `status`/`distance` on
/// success, `reason` (plus geofence detail for `TOO_FAR`) on rejection.
#[derive(Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ScanResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_distance: Option<i64>,
}

impl ScanResponse {
    pub fn present(distance: i64) -> Self {
        Self {
            status: Some("present"),
            distance: Some(distance),
            ..Default::default()
        }
    }

    pub fn rejected(reason: &'static str) -> Self {
        Self {
            reason: Some(reason),
            ..Default::default()
        }
    }

    pub fn too_far(distance: i64, max_distance: i64) -> Self {
        Self {
            reason: Some("TOO_FAR"),
            distance: Some(distance),
            max_distance: Some(max_distance),
            ..Default::default()
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyLocationReq {
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub accuracy: Option<f64>,
}

#[derive(Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct LocationCheck {
    pub valid: bool,
    pub distance: i64,
    pub max_distance: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accuracy: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinCourseReq {
    #[serde(default)]
    pub join_code: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryQuery {
    #[serde(default)]
    pub course_id: Option<String>,
    #[serde(default)]
    pub limit: Option<usize>,
    #[serde(default)]
    pub offset: Option<usize>,
}

/// One history row, straight off the denormalized attendance record.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryRecordDto {
    pub id: String,
    pub session_id: String,
    pub course_id: String,
    pub course_name: String,
    pub course_code: String,
    pub status: AttendanceStatus,
    pub marked_at: Option<DateTime<Utc>>,
    pub marked_by: MarkedBy,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance: Option<f64>,
}

impl From<AttendanceRecord> for HistoryRecordDto {
    fn from(r: AttendanceRecord) -> Self {
        Self {
            id: r.id,
            session_id: r.session_id,
            course_id: r.course_id,
            course_name: r.course_name,
            course_code: r.course_code,
            status: r.status,
            marked_at: r.marked_at,
            marked_by: r.marked_by,
            distance: r.distance_from_class,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryResponse {
    pub attendance_records: Vec<HistoryRecordDto>,
    pub has_more: bool,
    pub total: usize,
}
