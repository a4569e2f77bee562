//! Course documents: owned by one faculty member, joined by students via a
//! six-character join code.

use crate::store::{DocumentStore, FieldFilter, StoreError};
use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

pub const COLLECTION: &str = "courses";

/// Join-code alphabet with the confusable characters (I, O, 0, 1) removed.
const JOIN_CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
const JOIN_CODE_LEN: usize = 6;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    #[serde(skip)]
    pub id: String,
    pub code: String,
    pub name: String,
    pub department: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub academic_year: Option<String>,
    pub faculty_id: String,
    pub join_code: String,
    #[serde(default)]
    pub enrolled_count: i64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn random_join_code() -> String {
    let mut rng = rand::rng();
    (0..JOIN_CODE_LEN)
        .map(|_| JOIN_CODE_ALPHABET[rng.random_range(0..JOIN_CODE_ALPHABET.len())] as char)
        .collect()
}

impl Course {
    pub async fn find(
        store: &dyn DocumentStore,
        id: &str,
    ) -> Result<Option<Course>, StoreError> {
        match store.get(COLLECTION, id).await? {
            Some(doc) => {
                let mut course: Course = doc.decode()?;
                course.id = doc.id;
                Ok(Some(course))
            }
            None => Ok(None),
        }
    }

    /// Creates a course with a join code that is unique at creation time.
    pub async fn create(
        store: &dyn DocumentStore,
        faculty_id: &str,
        code: &str,
        name: &str,
        department: &str,
        academic_year: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<Course, StoreError> {
        let mut join_code = random_join_code();
        while Course::find_by_join_code(store, &join_code).await?.is_some() {
            join_code = random_join_code();
        }

        let course = Course {
            id: uuid::Uuid::new_v4().to_string(),
            code: code.to_owned(),
            name: name.to_owned(),
            department: department.to_owned(),
            academic_year,
            faculty_id: faculty_id.to_owned(),
            join_code,
            enrolled_count: 0,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        store
            .set(COLLECTION, &course.id, serde_json::to_value(&course)?)
            .await?;
        Ok(course)
    }

    /// Join codes are redeemed case-insensitively.
    pub async fn find_by_join_code(
        store: &dyn DocumentStore,
        join_code: &str,
    ) -> Result<Option<Course>, StoreError> {
        let hits = store
            .query(
                COLLECTION,
                &[FieldFilter::eq("joinCode", join_code.to_uppercase())],
                Some(1),
            )
            .await?;
        match hits.into_iter().next() {
            Some(doc) => {
                let mut course: Course = doc.decode()?;
                course.id = doc.id;
                Ok(Some(course))
            }
            None => Ok(None),
        }
    }

    pub async fn find_many(
        store: &dyn DocumentStore,
        ids: &[String],
    ) -> Result<Vec<Course>, StoreError> {
        let docs = store.get_many(COLLECTION, ids).await?;
        let mut courses = Vec::new();
        for doc in docs.into_iter().flatten() {
            let id = doc.id.clone();
            let mut course: Course = doc.decode()?;
            course.id = id;
            courses.push(course);
        }
        Ok(courses)
    }

    pub async fn for_faculty(
        store: &dyn DocumentStore,
        faculty_id: &str,
    ) -> Result<Vec<Course>, StoreError> {
        let docs = store
            .query(
                COLLECTION,
                &[FieldFilter::eq("facultyId", faculty_id)],
                None,
            )
            .await?;
        let mut courses = Vec::new();
        for doc in docs {
            let mut course: Course = doc.decode()?;
            course.id = doc.id;
            courses.push(course);
        }
        Ok(courses)
    }

    pub async fn increment_enrolled(
        store: &dyn DocumentStore,
        course_id: &str,
        delta: i64,
    ) -> Result<i64, StoreError> {
        store
            .increment(COLLECTION, course_id, "enrolledCount", delta)
            .await
    }

}
