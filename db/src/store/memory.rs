//! In-memory `DocumentStore` implementation.
//!
//! Collections are `BTreeMap`s so scans run in stable id order. A batch
//! holds the write lock for its whole application, which is what makes it
//! atomic; `increment` does its read-modify-write under the same exclusive
//! lock, making it the linearizable point the counters rely on.
//!
//! Operations never block on anything but the lock, so the port's
//! `Timeout` variant is only ever produced by remote-backed
//! implementations.

use super::{BatchOp, Document, DocumentStore, FieldFilter, StoreError};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;

type Collection = BTreeMap<String, Value>;

#[derive(Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, Collection>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn matches(data: &Value, filters: &[FieldFilter]) -> bool {
    filters
        .iter()
        .all(|f| data.get(&f.field) == Some(&f.value))
}

fn merge_into(target: &mut Value, patch: &Value) -> Result<(), StoreError> {
    let (Some(target_map), Some(patch_map)) = (target.as_object_mut(), patch.as_object()) else {
        return Err(StoreError::Backend(
            "update patch and document must both be JSON objects".into(),
        ));
    };
    for (key, value) in patch_map {
        target_map.insert(key.clone(), value.clone());
    }
    Ok(())
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .and_then(|c| c.get(id))
            .map(|data| Document {
                id: id.to_owned(),
                data: data.clone(),
            }))
    }

    async fn set(&self, collection: &str, id: &str, data: Value) -> Result<(), StoreError> {
        let mut collections = self.collections.write().await;
        collections
            .entry(collection.to_owned())
            .or_default()
            .insert(id.to_owned(), data);
        Ok(())
    }

    async fn update(&self, collection: &str, id: &str, patch: Value) -> Result<(), StoreError> {
        let mut collections = self.collections.write().await;
        let existing = collections
            .get_mut(collection)
            .and_then(|c| c.get_mut(id))
            .ok_or_else(|| StoreError::not_found(collection, id))?;
        merge_into(existing, &patch)
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        let mut collections = self.collections.write().await;
        if let Some(c) = collections.get_mut(collection) {
            c.remove(id);
        }
        Ok(())
    }

    async fn get_many(
        &self,
        collection: &str,
        ids: &[String],
    ) -> Result<Vec<Option<Document>>, StoreError> {
        let collections = self.collections.read().await;
        let coll = collections.get(collection);
        Ok(ids
            .iter()
            .map(|id| {
                coll.and_then(|c| c.get(id)).map(|data| Document {
                    id: id.clone(),
                    data: data.clone(),
                })
            })
            .collect())
    }

    async fn query(
        &self,
        collection: &str,
        filters: &[FieldFilter],
        limit: Option<usize>,
    ) -> Result<Vec<Document>, StoreError> {
        let collections = self.collections.read().await;
        let Some(coll) = collections.get(collection) else {
            return Ok(Vec::new());
        };
        let mut out = Vec::new();
        for (id, data) in coll {
            if matches(data, filters) {
                out.push(Document {
                    id: id.clone(),
                    data: data.clone(),
                });
                if limit.is_some_and(|l| out.len() >= l) {
                    break;
                }
            }
        }
        Ok(out)
    }

    async fn apply_batch(&self, ops: Vec<BatchOp>) -> Result<(), StoreError> {
        let mut collections = self.collections.write().await;

        // Updates are the only op that can fail; validate targets up front so
        // the batch applies in full or not at all.
        for op in &ops {
            if let BatchOp::Update { collection, id, .. } = op {
                let exists = collections
                    .get(collection)
                    .is_some_and(|c| c.contains_key(id));
                if !exists {
                    return Err(StoreError::not_found(collection, id));
                }
            }
        }

        for op in ops {
            match op {
                BatchOp::Set {
                    collection,
                    id,
                    data,
                } => {
                    collections
                        .entry(collection)
                        .or_default()
                        .insert(id, data);
                }
                BatchOp::Update {
                    collection,
                    id,
                    patch,
                } => {
                    let existing = collections
                        .get_mut(&collection)
                        .and_then(|c| c.get_mut(&id))
                        .expect("validated above");
                    merge_into(existing, &patch)?;
                }
                BatchOp::Delete { collection, id } => {
                    if let Some(c) = collections.get_mut(&collection) {
                        c.remove(&id);
                    }
                }
            }
        }
        Ok(())
    }

    async fn increment(
        &self,
        collection: &str,
        id: &str,
        field: &str,
        delta: i64,
    ) -> Result<i64, StoreError> {
        let mut collections = self.collections.write().await;
        let doc = collections
            .get_mut(collection)
            .and_then(|c| c.get_mut(id))
            .ok_or_else(|| StoreError::not_found(collection, id))?;
        let map = doc.as_object_mut().ok_or_else(|| {
            StoreError::Backend(format!("document {collection}/{id} is not an object"))
        })?;
        let current = map.get(field).and_then(Value::as_i64).unwrap_or(0);
        let next = current + delta;
        map.insert(field.to_owned(), Value::from(next));
        Ok(next)
    }
}
