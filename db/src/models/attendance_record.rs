//! The attendance ledger: one row per (session, student) pair.
//!
//! Row ids are deterministic (`{sessionId}_{studentId}`) so concurrent
//! creates collapse into one document instead of duplicating. Rows carry a
//! denormalized student/course snapshot taken at write time, so every read
//! path is served from the row alone.
//!
//! Historical data written before the deterministic-id scheme can hold
//! duplicate rows for a pair; `upsert_present` self-heals those on the way
//! through (keep the `present` row if any, else the first, drop the rest).

use crate::error::AttendanceError;
use crate::models::session::Session;
use crate::models::student::Student;
use crate::store::{BatchOp, DocumentStore, FieldFilter, StoreError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

pub const COLLECTION: &str = "attendance";

/// Deterministic row id for a (session, student) pair.
pub fn record_id(session_id: &str, student_id: &str) -> String {
    format!("{session_id}_{student_id}")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttendanceStatus {
    Present,
    Absent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkedBy {
    Student,
    ManualFaculty,
    System,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceRecord {
    #[serde(skip)]
    pub id: String,
    pub session_id: String,
    pub course_id: String,
    pub student_id: String,
    pub student_name: String,
    pub student_roll_no: String,
    pub course_name: String,
    pub course_code: String,
    pub status: AttendanceStatus,
    pub marked_at: Option<DateTime<Utc>>,
    pub marked_by: MarkedBy,
    #[serde(default)]
    pub location_verified: bool,
    #[serde(default)]
    pub distance_from_class: Option<f64>,
    #[serde(default)]
    pub qr_version: Option<i64>,
    #[serde(default)]
    pub device_id: Option<String>,
    #[serde(default)]
    pub student_latitude: Option<f64>,
    #[serde(default)]
    pub student_longitude: Option<f64>,
    #[serde(default)]
    pub accuracy: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_type: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// What a verified scan proves about where and how it happened.
#[derive(Debug, Clone)]
pub struct ScanEvidence {
    pub location_verified: bool,
    pub distance_from_class: f64,
    pub qr_version: i64,
    pub device_id: Option<String>,
    pub student_latitude: Option<f64>,
    pub student_longitude: Option<f64>,
    pub accuracy: Option<f64>,
}

/// Seed data for the absent row pre-created at session start.
pub(crate) fn absent_seed(
    session: &Session,
    student: &Student,
    now: DateTime<Utc>,
) -> Result<(String, Value), StoreError> {
    let record = AttendanceRecord {
        id: record_id(&session.id, &student.user_id),
        session_id: session.id.clone(),
        course_id: session.course_id.clone(),
        student_id: student.user_id.clone(),
        student_name: student.name.clone(),
        student_roll_no: student.roll_no.clone(),
        course_name: session.course_name.clone(),
        course_code: session.course_code.clone(),
        status: AttendanceStatus::Absent,
        marked_at: None,
        marked_by: MarkedBy::System,
        location_verified: false,
        distance_from_class: None,
        qr_version: None,
        device_id: None,
        student_latitude: None,
        student_longitude: None,
        accuracy: None,
        class_type: Some(session.class_type.clone()),
        created_at: now,
    };
    Ok((record.id.clone(), serde_json::to_value(&record)?))
}

fn decode(doc: crate::store::Document) -> Result<AttendanceRecord, StoreError> {
    let mut record: AttendanceRecord = doc.decode()?;
    record.id = doc.id;
    Ok(record)
}

impl AttendanceRecord {
    /// Every row for the pair. More than one means pre-deterministic-id
    /// duplicates; callers collapse them.
    pub async fn for_pair(
        store: &dyn DocumentStore,
        session_id: &str,
        student_id: &str,
    ) -> Result<Vec<AttendanceRecord>, StoreError> {
        let docs = store
            .query(
                COLLECTION,
                &[
                    FieldFilter::eq("sessionId", session_id),
                    FieldFilter::eq("studentId", student_id),
                ],
                None,
            )
            .await?;
        docs.into_iter().map(decode).collect()
    }

    /// All rows for a session, newest mark first (unmarked rows last).
    pub async fn for_session(
        store: &dyn DocumentStore,
        session_id: &str,
    ) -> Result<Vec<AttendanceRecord>, StoreError> {
        let docs = store
            .query(COLLECTION, &[FieldFilter::eq("sessionId", session_id)], None)
            .await?;
        let mut records: Vec<AttendanceRecord> =
            docs.into_iter().map(decode).collect::<Result<_, _>>()?;
        records.sort_by(|a, b| b.marked_at.cmp(&a.marked_at));
        Ok(records)
    }

    /// A student's history, newest first, paginated. Served entirely from
    /// the denormalized rows — no profile or course reads.
    pub async fn history_for_student(
        store: &dyn DocumentStore,
        student_id: &str,
        course_id: Option<&str>,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<AttendanceRecord>, StoreError> {
        let mut filters = vec![FieldFilter::eq("studentId", student_id)];
        if let Some(course_id) = course_id {
            filters.push(FieldFilter::eq("courseId", course_id));
        }
        let docs = store.query(COLLECTION, &filters, None).await?;
        let mut records: Vec<AttendanceRecord> =
            docs.into_iter().map(decode).collect::<Result<_, _>>()?;
        records.sort_by(|a, b| b.marked_at.cmp(&a.marked_at));
        Ok(records.into_iter().skip(offset).take(limit).collect())
    }

    /// Number of `present` rows for the session — the value `presentCount`
    /// must always agree with.
    pub async fn present_count_for_session(
        store: &dyn DocumentStore,
        session_id: &str,
    ) -> Result<usize, StoreError> {
        let docs = store
            .query(
                COLLECTION,
                &[
                    FieldFilter::eq("sessionId", session_id),
                    FieldFilter::eq("status", "present"),
                ],
                None,
            )
            .await?;
        Ok(docs.len())
    }

    /// Transitions the pair's row to `present` exactly once.
    ///
    /// Steps, in order:
    /// 1. fetch every row for the pair;
    /// 2. if duplicates exist, keep the `present` one if any (else the
    ///    first) and delete the rest in one atomic batch — logged, never
    ///    failing the request it rides on;
    /// 3. survivor already `present` -> `AlreadyMarked`;
    /// 4. otherwise stamp the transition with the evidence;
    /// 5. atomically bump the session's `presentCount` by exactly one.
    ///
    /// A missing row (enrollment after session start) is created fresh with
    /// the deterministic id, already `present`.
    pub async fn upsert_present(
        store: &dyn DocumentStore,
        session: &Session,
        student: &Student,
        evidence: ScanEvidence,
        now: DateTime<Utc>,
    ) -> Result<AttendanceRecord, AttendanceError> {
        let records = Self::for_pair(store, &session.id, &student.user_id).await?;

        let survivor = if records.is_empty() {
            None
        } else {
            let survivor = records
                .iter()
                .find(|r| r.status == AttendanceStatus::Present)
                .unwrap_or(&records[0])
                .clone();

            if records.len() > 1 {
                tracing::warn!(
                    session_id = %session.id,
                    student_id = %student.user_id,
                    count = records.len(),
                    survivor = %survivor.id,
                    "duplicate attendance rows found; collapsing"
                );
                let deletes: Vec<BatchOp> = records
                    .iter()
                    .filter(|r| r.id != survivor.id)
                    .map(|r| BatchOp::Delete {
                        collection: COLLECTION.to_owned(),
                        id: r.id.clone(),
                    })
                    .collect();
                store.apply_batch(deletes).await?;
            }
            Some(survivor)
        };

        let marked = json!({
            "status": AttendanceStatus::Present,
            "markedAt": now,
            "markedBy": MarkedBy::Student,
            "locationVerified": evidence.location_verified,
            "studentLatitude": evidence.student_latitude,
            "studentLongitude": evidence.student_longitude,
            "distanceFromClass": evidence.distance_from_class.round(),
            "accuracy": evidence.accuracy,
            "qrVersion": evidence.qr_version,
            "deviceId": evidence.device_id,
        });

        let row_id = match survivor {
            Some(record) if record.status == AttendanceStatus::Present => {
                return Err(AttendanceError::AlreadyMarked);
            }
            Some(record) => {
                store.update(COLLECTION, &record.id, marked).await?;
                record.id
            }
            None => {
                // Enrollment happened after session start: no absent row to
                // transition, create the row already present.
                let id = record_id(&session.id, &student.user_id);
                let mut data = marked;
                let extra = json!({
                    "sessionId": session.id,
                    "courseId": session.course_id,
                    "studentId": student.user_id,
                    "studentName": student.name,
                    "studentRollNo": student.roll_no,
                    "courseName": session.course_name,
                    "courseCode": session.course_code,
                    "classType": session.class_type,
                    "createdAt": now,
                });
                let map = data.as_object_mut().expect("json! object");
                for (k, v) in extra.as_object().expect("json! object") {
                    map.insert(k.clone(), v.clone());
                }
                store.set(COLLECTION, &id, data).await?;
                id
            }
        };

        // Exactly one increment per successful transition, never per call.
        Session::increment_present(store, &session.id, 1).await?;

        let doc = store
            .get(COLLECTION, &row_id)
            .await?
            .ok_or_else(|| StoreError::not_found(COLLECTION, &row_id))?;
        Ok(decode(doc)?)
    }

    /// Faculty override. `presentCount` moves by the signed delta between
    /// the previous and new status, so repeated clicks cannot drift the
    /// counter; an unchanged status writes nothing.
    pub async fn manual_set(
        store: &dyn DocumentStore,
        session: &Session,
        student: &Student,
        status: AttendanceStatus,
        now: DateTime<Utc>,
    ) -> Result<AttendanceRecord, AttendanceError> {
        let records = Self::for_pair(store, &session.id, &student.user_id).await?;
        let existing = records.into_iter().next();

        let previous = existing
            .as_ref()
            .map(|r| r.status)
            .unwrap_or(AttendanceStatus::Absent);

        let marked_at = match status {
            AttendanceStatus::Present => Some(now),
            AttendanceStatus::Absent => None,
        };

        let row_id = match existing {
            Some(record) if record.status == status => record.id,
            Some(record) => {
                store
                    .update(
                        COLLECTION,
                        &record.id,
                        json!({
                            "status": status,
                            "markedBy": MarkedBy::ManualFaculty,
                            "markedAt": marked_at,
                        }),
                    )
                    .await?;
                record.id
            }
            None => {
                let record = AttendanceRecord {
                    id: record_id(&session.id, &student.user_id),
                    session_id: session.id.clone(),
                    course_id: session.course_id.clone(),
                    student_id: student.user_id.clone(),
                    student_name: student.name.clone(),
                    student_roll_no: student.roll_no.clone(),
                    course_name: session.course_name.clone(),
                    course_code: session.course_code.clone(),
                    status,
                    marked_at,
                    marked_by: MarkedBy::ManualFaculty,
                    location_verified: false,
                    distance_from_class: None,
                    qr_version: None,
                    device_id: None,
                    student_latitude: None,
                    student_longitude: None,
                    accuracy: None,
                    class_type: Some(session.class_type.clone()),
                    created_at: now,
                };
                store
                    .set(
                        COLLECTION,
                        &record.id,
                        serde_json::to_value(&record).map_err(StoreError::from)?,
                    )
                    .await?;
                record.id
            }
        };

        if previous != status {
            let delta = match status {
                AttendanceStatus::Present => 1,
                AttendanceStatus::Absent => -1,
            };
            Session::increment_present(store, &session.id, delta).await?;
        }

        let doc = store
            .get(COLLECTION, &row_id)
            .await?
            .ok_or_else(|| StoreError::not_found(COLLECTION, &row_id))?;
        Ok(decode(doc)?)
    }
}
