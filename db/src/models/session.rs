//! Session documents: one per class meeting.
//!
//! Lifecycle is `ACTIVE -> STOPPED` (terminal). `qrVersion` climbs by one on
//! every rotation. `presentCount` must always equal the number of `present`
//! attendance rows for the session, so it is only ever touched through the
//! store's atomic increment — never overwritten wholesale.

use crate::error::AttendanceError;
use crate::models::{attendance_record, student::Student};
use crate::store::{BatchOp, DocumentStore, StoreError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use util::geofence::Geofence;

pub const COLLECTION: &str = "sessions";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    #[serde(skip)]
    pub id: String,
    pub course_id: String,
    /// Snapshot of course metadata at start time, denormalized onto the
    /// session so reads never join back to the course document.
    pub course_name: String,
    pub course_code: String,
    pub faculty_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheduled_start: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room_number: Option<String>,
    pub class_type: String,
    pub location_latitude: f64,
    pub location_longitude: f64,
    pub geofence_radius: f64,
    pub qr_version: i64,
    pub qr_refresh_interval_seconds: i64,
    #[serde(default)]
    pub present_count: i64,
    #[serde(default)]
    pub total_students: i64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<DateTime<Utc>>,
}

/// Inputs for starting a session, beyond what the course snapshot provides.
#[derive(Debug, Clone)]
pub struct StartSession {
    pub geofence: Geofence,
    pub refresh_interval_seconds: i64,
    pub class_type: String,
    pub room_number: Option<String>,
    pub scheduled_start: Option<String>,
}

impl Session {
    pub fn geofence(&self) -> Geofence {
        Geofence::new(
            self.location_latitude,
            self.location_longitude,
            self.geofence_radius,
        )
    }

    pub async fn find(
        store: &dyn DocumentStore,
        id: &str,
    ) -> Result<Option<Session>, StoreError> {
        match store.get(COLLECTION, id).await? {
            Some(doc) => {
                let mut session: Session = doc.decode()?;
                session.id = doc.id;
                Ok(Some(session))
            }
            None => Ok(None),
        }
    }

    /// Starts a session for `course` and pre-materializes one `absent`
    /// attendance row per enrolled student, all in a single atomic batch.
    ///
    /// The caller has already verified that the requester owns the course
    /// and resolved the enrolled roster.
    pub async fn start(
        store: &dyn DocumentStore,
        course: &crate::models::course::Course,
        params: StartSession,
        roster: &[Student],
        now: DateTime<Utc>,
    ) -> Result<Session, StoreError> {
        let session = Session {
            id: uuid::Uuid::new_v4().to_string(),
            course_id: course.id.clone(),
            course_name: course.name.clone(),
            course_code: course.code.clone(),
            faculty_id: course.faculty_id.clone(),
            scheduled_start: params.scheduled_start,
            room_number: params.room_number,
            class_type: params.class_type,
            location_latitude: params.geofence.latitude,
            location_longitude: params.geofence.longitude,
            geofence_radius: params.geofence.radius_meters,
            qr_version: 1,
            qr_refresh_interval_seconds: params.refresh_interval_seconds,
            present_count: 0,
            total_students: roster.len() as i64,
            is_active: true,
            created_at: now,
            ended_at: None,
        };

        let mut ops = vec![BatchOp::Set {
            collection: COLLECTION.to_owned(),
            id: session.id.clone(),
            data: serde_json::to_value(&session)?,
        }];
        for student in roster {
            let (id, data) = attendance_record::absent_seed(&session, student, now)?;
            ops.push(BatchOp::Set {
                collection: attendance_record::COLLECTION.to_owned(),
                id,
                data,
            });
        }
        store.apply_batch(ops).await?;
        Ok(session)
    }

    /// Bumps `qrVersion` for a new code. The caller re-issues the payload
    /// and overwrites the active QR document.
    pub async fn rotate_qr(
        &mut self,
        store: &dyn DocumentStore,
    ) -> Result<i64, AttendanceError> {
        if !self.is_active {
            return Err(AttendanceError::SessionInactive);
        }
        let next = self.qr_version + 1;
        store
            .update(COLLECTION, &self.id, json!({ "qrVersion": next }))
            .await?;
        self.qr_version = next;
        Ok(next)
    }

    /// Flips the session inactive, stamps `endedAt`, and removes the active
    /// QR token in the same batch. Stopping an already-stopped session is a
    /// no-op.
    pub async fn stop(
        &mut self,
        store: &dyn DocumentStore,
        now: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        if !self.is_active {
            return Ok(());
        }
        store
            .apply_batch(vec![
                BatchOp::Update {
                    collection: COLLECTION.to_owned(),
                    id: self.id.clone(),
                    patch: json!({ "isActive": false, "endedAt": now }),
                },
                BatchOp::Delete {
                    collection: crate::models::active_qr::COLLECTION.to_owned(),
                    id: self.id.clone(),
                },
            ])
            .await?;
        self.is_active = false;
        self.ended_at = Some(now);
        Ok(())
    }

    /// The single mutation path for `presentCount`.
    pub async fn increment_present(
        store: &dyn DocumentStore,
        session_id: &str,
        delta: i64,
    ) -> Result<i64, StoreError> {
        store
            .increment(COLLECTION, session_id, "presentCount", delta)
            .await
    }
}
