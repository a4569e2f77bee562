//! Student profile documents, keyed by the identity provider's subject id.
//!
//! Profile management itself lives outside this core; the core reads these
//! documents (through the cache layer) for enrollment snapshots and the
//! device-binding check.

use crate::store::{DocumentStore, StoreError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

pub const COLLECTION: &str = "students";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub user_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub name: String,
    pub roll_no: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    /// First device this account authenticated from; sticky until an
    /// administrative reset (outside this core).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_bound_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Student {
    pub async fn find(
        store: &dyn DocumentStore,
        user_id: &str,
    ) -> Result<Option<Student>, StoreError> {
        match store.get(COLLECTION, user_id).await? {
            Some(doc) => Ok(Some(doc.decode()?)),
            None => Ok(None),
        }
    }

    pub async fn find_many(
        store: &dyn DocumentStore,
        user_ids: &[String],
    ) -> Result<Vec<Student>, StoreError> {
        let docs = store.get_many(COLLECTION, user_ids).await?;
        let mut students = Vec::new();
        for doc in docs.into_iter().flatten() {
            students.push(doc.decode()?);
        }
        Ok(students)
    }

    pub async fn save(&self, store: &dyn DocumentStore) -> Result<(), StoreError> {
        store
            .set(COLLECTION, &self.user_id, serde_json::to_value(self)?)
            .await
    }

    /// Binds the account to `device_id`. First use binds; later calls are
    /// expected to have passed the mismatch check already.
    pub async fn bind_device(
        store: &dyn DocumentStore,
        user_id: &str,
        device_id: &str,
        now: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        store
            .update(
                COLLECTION,
                user_id,
                json!({
                    "deviceId": device_id,
                    "deviceBoundAt": now,
                    "updatedAt": now,
                }),
            )
            .await
    }
}
