//! Storage subsystem.
//!
//! # Data Flow
//! ```text
//! Repository<E>
//!     → serde_json::Value documents keyed by (kind, id)
//!     → Datastore (allocate_id / get / put / delete / query / count)
//!     → memory.rs (DashMap per kind)
//! ```
//!
//! # Design Decisions
//! - Documents are schemaless JSON; typing happens in the repository
//! - Identifiers are allocated by the store, never by callers
//! - Each call is atomic per document; there are no cross-document
//!   transactions
//! - Calls are synchronous; the in-memory backend never blocks on I/O

pub mod memory;
pub mod query;

use std::fmt;

use serde_json::Value;
use thiserror::Error;

pub use memory::MemoryDatastore;
pub use query::{Operator, Query};

/// Errors reported by a storage backend.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The query could not be interpreted.
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// The kind name is not usable as a collection.
    #[error("invalid kind {0:?}")]
    InvalidKind(String),

    /// Backend failure.
    #[error("storage backend error: {0}")]
    Backend(String),
}

/// A document store partitioned by kind.
pub trait Datastore: Send + Sync + fmt::Debug {
    /// Reserve a fresh identifier (> 0) for `kind`.
    fn allocate_id(&self, kind: &str) -> Result<i64, StoreError>;

    fn get(&self, kind: &str, id: i64) -> Result<Option<Value>, StoreError>;

    /// Insert or replace the document stored under `(kind, id)`.
    fn put(&self, kind: &str, id: i64, document: Value) -> Result<(), StoreError>;

    /// Remove a document; returns whether it existed.
    fn delete(&self, kind: &str, id: i64) -> Result<bool, StoreError>;

    /// Documents of `kind` matching `query`, as `(id, document)` pairs.
    fn query(&self, kind: &str, query: &Query) -> Result<Vec<(i64, Value)>, StoreError>;

    /// Number of documents `query` would return, after offset and limit.
    fn count(&self, kind: &str, query: &Query) -> Result<usize, StoreError> {
        Ok(self.query(kind, query)?.len())
    }
}
