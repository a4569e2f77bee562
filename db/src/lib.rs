pub mod error;
pub mod models;
pub mod store;
pub mod test_utils;

pub use error::AttendanceError;
pub use store::{BatchOp, Document, DocumentStore, FieldFilter, MemoryStore, StoreError};

use std::sync::Arc;

/// Constructs the process-wide document store.
///
/// The storage backing is a single logically-consistent document store; this
/// build ships the in-memory implementation, which is also what tests run
/// against.
pub fn connect() -> Arc<dyn DocumentStore> {
    Arc::new(MemoryStore::new())
}
