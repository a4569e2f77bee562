//! Storage port for the document store backing the attendance core.
//!
//! The live system persists to a hosted document database; everything the
//! core needs from it is the small surface below (per-document get/set/
//! update/delete, batched writes, equality queries, and an atomic field
//! increment). Keeping the port this narrow lets the whole domain layer run
//! unchanged against the in-memory implementation in [`memory`].

pub mod memory;

pub use memory::MemoryStore;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("document {collection}/{id} not found")]
    NotFound { collection: String, id: String },
    /// A backend call exceeded its deadline. Safe to retry with backoff.
    #[error("store operation timed out")]
    Timeout,
    #[error("serialization failure: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("store backend failure: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn not_found(collection: &str, id: &str) -> Self {
        Self::NotFound {
            collection: collection.to_owned(),
            id: id.to_owned(),
        }
    }
}

/// A stored document: its id plus the JSON field map.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub data: Value,
}

impl Document {
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, StoreError> {
        serde_json::from_value(self.data.clone()).map_err(StoreError::from)
    }
}

/// Equality filter on a top-level document field.
#[derive(Debug, Clone)]
pub struct FieldFilter {
    pub field: String,
    pub value: Value,
}

impl FieldFilter {
    pub fn eq(field: &str, value: impl Into<Value>) -> Self {
        Self {
            field: field.to_owned(),
            value: value.into(),
        }
    }
}

/// One write inside an atomic batch.
#[derive(Debug, Clone)]
pub enum BatchOp {
    Set {
        collection: String,
        id: String,
        data: Value,
    },
    Update {
        collection: String,
        id: String,
        patch: Value,
    },
    Delete {
        collection: String,
        id: String,
    },
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError>;

    /// Creates or fully replaces a document.
    async fn set(&self, collection: &str, id: &str, data: Value) -> Result<(), StoreError>;

    /// Shallow-merges `patch` into an existing document; `NotFound` if absent.
    async fn update(&self, collection: &str, id: &str, patch: Value) -> Result<(), StoreError>;

    /// Idempotent: deleting an absent document is not an error.
    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError>;

    /// Batched point reads, one slot per requested id.
    async fn get_many(
        &self,
        collection: &str,
        ids: &[String],
    ) -> Result<Vec<Option<Document>>, StoreError>;

    /// Equality-filtered scan in stable id order, optionally truncated.
    async fn query(
        &self,
        collection: &str,
        filters: &[FieldFilter],
        limit: Option<usize>,
    ) -> Result<Vec<Document>, StoreError>;

    /// Applies every op or none of them.
    async fn apply_batch(&self, ops: Vec<BatchOp>) -> Result<(), StoreError>;

    /// Atomically adds `delta` to a numeric field and returns the new value.
    ///
    /// This is the one operation that must be linearizable; counters are
    /// never maintained by read-modify-write in application code.
    async fn increment(
        &self,
        collection: &str,
        id: &str,
        field: &str,
        delta: i64,
    ) -> Result<i64, StoreError>;
}
