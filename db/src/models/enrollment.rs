//! Student-course enrollment join documents. Created by join-code
//! redemption; the attendance core otherwise only reads them.

use crate::store::{DocumentStore, FieldFilter, StoreError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const COLLECTION: &str = "enrollments";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Enrollment {
    #[serde(skip)]
    pub id: String,
    pub student_id: String,
    pub course_id: String,
    pub is_active: bool,
    pub enrolled_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl Enrollment {
    pub async fn create(
        store: &dyn DocumentStore,
        student_id: &str,
        course_id: &str,
        source: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Enrollment, StoreError> {
        let enrollment = Enrollment {
            id: uuid::Uuid::new_v4().to_string(),
            student_id: student_id.to_owned(),
            course_id: course_id.to_owned(),
            is_active: true,
            enrolled_at: now,
            source: source.map(str::to_owned),
        };
        store
            .set(
                COLLECTION,
                &enrollment.id,
                serde_json::to_value(&enrollment)?,
            )
            .await?;
        Ok(enrollment)
    }

    /// Whether the student holds an active enrollment in the course.
    pub async fn is_active_for(
        store: &dyn DocumentStore,
        student_id: &str,
        course_id: &str,
    ) -> Result<bool, StoreError> {
        let hits = store
            .query(
                COLLECTION,
                &[
                    FieldFilter::eq("studentId", student_id),
                    FieldFilter::eq("courseId", course_id),
                    FieldFilter::eq("isActive", true),
                ],
                Some(1),
            )
            .await?;
        Ok(!hits.is_empty())
    }

    /// Any enrollment for the pair, active or not (used to reject re-joins).
    pub async fn exists_for(
        store: &dyn DocumentStore,
        student_id: &str,
        course_id: &str,
    ) -> Result<bool, StoreError> {
        let hits = store
            .query(
                COLLECTION,
                &[
                    FieldFilter::eq("studentId", student_id),
                    FieldFilter::eq("courseId", course_id),
                ],
                Some(1),
            )
            .await?;
        Ok(!hits.is_empty())
    }

    pub async fn active_for_course(
        store: &dyn DocumentStore,
        course_id: &str,
    ) -> Result<Vec<Enrollment>, StoreError> {
        Self::query_active(store, FieldFilter::eq("courseId", course_id)).await
    }

    pub async fn active_for_student(
        store: &dyn DocumentStore,
        student_id: &str,
    ) -> Result<Vec<Enrollment>, StoreError> {
        Self::query_active(store, FieldFilter::eq("studentId", student_id)).await
    }

    async fn query_active(
        store: &dyn DocumentStore,
        filter: FieldFilter,
    ) -> Result<Vec<Enrollment>, StoreError> {
        let docs = store
            .query(
                COLLECTION,
                &[filter, FieldFilter::eq("isActive", true)],
                None,
            )
            .await?;
        let mut enrollments = Vec::new();
        for doc in docs {
            let mut enrollment: Enrollment = doc.decode()?;
            enrollment.id = doc.id;
            enrollments.push(enrollment);
        }
        Ok(enrollments)
    }
}
