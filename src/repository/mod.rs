//! Typed persistence over a [`Datastore`](crate::storage::Datastore).
//!
//! # Data Flow
//! ```text
//! create(entity)
//!     → allocate id → BeforeCreated listeners → put
//! update(entity)
//!     → load stored record → BeforeUpdated{old, new} listeners → put
//! delete(entity)
//!     → BeforeDeleted listeners → delete
//! find_by_id / find_all / find_by / count
//!     → query → deserialize → stamp ids from storage keys
//! ```
//!
//! # Design Decisions
//! - A repository is bound to one kind and one signal; it holds no
//!   per-request state and can be shared freely
//! - Listener failures abort before anything is written
//! - The update conflict check is read-then-write, not a transaction

pub mod default;

use thiserror::Error;

use crate::entity::Entity;
use crate::events::LifecycleError;
use crate::storage::{Query, StoreError};

pub use default::DefaultRepository;

/// Errors returned by repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// No record of this kind has the identifier.
    #[error("{kind} with id {id} not found")]
    NotFound { kind: String, id: i64 },

    /// A lifecycle listener refused the operation.
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),

    #[error(transparent)]
    Store(#[from] StoreError),

    /// A stored document does not fit the entity type, or vice versa.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A composite repository invariant failed.
    #[error("{0}")]
    Integrity(String),
}

impl RepositoryError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, RepositoryError::NotFound { .. })
    }

    /// True for lock and version conflicts.
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            RepositoryError::Lifecycle(LifecycleError::Locked | LifecycleError::VersionMismatch { .. })
        )
    }
}

/// Persistence contract for one entity kind.
pub trait Repository<E: Entity>: Send + Sync {
    /// Store a new entity; its identifier is assigned here.
    fn create(&self, entity: &mut E) -> Result<(), RepositoryError>;

    /// Replace the stored record with the same identifier.
    fn update(&self, entity: &mut E) -> Result<(), RepositoryError>;

    fn delete(&self, entity: &E) -> Result<(), RepositoryError>;

    fn find_by_id(&self, id: i64) -> Result<E, RepositoryError>;

    fn find_all(&self) -> Result<Vec<E>, RepositoryError>;

    fn find_by(&self, query: &Query) -> Result<Vec<E>, RepositoryError>;

    fn count(&self, query: &Query) -> Result<usize, RepositoryError>;
}
