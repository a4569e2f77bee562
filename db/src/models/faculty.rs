//! Faculty profile documents, keyed by subject id. Read-mostly reference
//! data; auto-created on first course creation so the student app always
//! has a name to show.

use crate::store::{DocumentStore, StoreError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const COLLECTION: &str = "faculty";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Faculty {
    pub user_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Faculty {
    pub async fn find(
        store: &dyn DocumentStore,
        user_id: &str,
    ) -> Result<Option<Faculty>, StoreError> {
        match store.get(COLLECTION, user_id).await? {
            Some(doc) => Ok(Some(doc.decode()?)),
            None => Ok(None),
        }
    }

    pub async fn save(&self, store: &dyn DocumentStore) -> Result<(), StoreError> {
        store
            .set(COLLECTION, &self.user_id, serde_json::to_value(self)?)
            .await
    }
}
