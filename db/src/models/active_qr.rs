//! The currently valid QR token for an active session.
//!
//! One document per session, keyed by session id: overwritten on every
//! rotation, deleted when the session stops. Holds the full payload so the
//! scan path can compare the stored `qrVersion` without re-deriving it.

use crate::store::{DocumentStore, StoreError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use util::qr::QrPayload;

pub const COLLECTION: &str = "activeQRs";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveQr {
    #[serde(flatten)]
    pub payload: QrPayload,
    pub created_at: DateTime<Utc>,
}

impl ActiveQr {
    /// Overwrites (never appends) the session's active token.
    pub async fn put(
        store: &dyn DocumentStore,
        payload: &QrPayload,
        now: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let record = ActiveQr {
            payload: payload.clone(),
            created_at: now,
        };
        store
            .set(
                COLLECTION,
                &payload.session_id,
                serde_json::to_value(&record)?,
            )
            .await
    }

    pub async fn find(
        store: &dyn DocumentStore,
        session_id: &str,
    ) -> Result<Option<ActiveQr>, StoreError> {
        match store.get(COLLECTION, session_id).await? {
            Some(doc) => Ok(Some(doc.decode()?)),
            None => Ok(None),
        }
    }

    pub async fn delete(
        store: &dyn DocumentStore,
        session_id: &str,
    ) -> Result<(), StoreError> {
        store.delete(COLLECTION, session_id).await
    }
}
