//! Entity lifecycle events.
//!
//! # Data Flow
//! ```text
//! Repository / EntityEndpoint mutation
//!     → EntityEvent::Before* built around the entity
//!     → signal.rs (ordered listeners, stop at first error)
//!     → listeners.rs (timestamps, versioning, lock checks)
//!     → mutation proceeds only if dispatch returned Ok
//!     → EntityEvent::After* dispatched on the endpoint signal
//! ```
//!
//! # Design Decisions
//! - Events borrow the entities; Before* variants hand out `&mut` where a
//!   listener is allowed to rewrite the record
//! - Errors are typed so callers can tell a lock from a version conflict

pub mod listeners;
pub mod signal;

use thiserror::Error;

pub use listeners::{BeforeEntityCreated, BeforeEntityDeleted, BeforeEntityUpdated};
pub use signal::{Listener, ListenerFn, Signal};

/// A lifecycle event carrying borrowed entities.
#[derive(Debug)]
pub enum EntityEvent<'a, E> {
    BeforeCreated(&'a mut E),
    AfterCreated(&'a E),
    BeforeUpdated { old: &'a E, new: &'a mut E },
    AfterUpdated(&'a E),
    BeforeDeleted(&'a E),
    AfterDeleted(&'a E),
}

impl<E> EntityEvent<'_, E> {
    /// Short name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            EntityEvent::BeforeCreated(_) => "before_created",
            EntityEvent::AfterCreated(_) => "after_created",
            EntityEvent::BeforeUpdated { .. } => "before_updated",
            EntityEvent::AfterUpdated(_) => "after_updated",
            EntityEvent::BeforeDeleted(_) => "before_deleted",
            EntityEvent::AfterDeleted(_) => "after_deleted",
        }
    }
}

/// Errors raised by lifecycle listeners.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LifecycleError {
    /// The stored entity is locked.
    #[error("entity is locked and cannot be modified")]
    Locked,

    /// The submitted version does not match the stored one.
    #[error("versions do not match: stored {stored}, submitted {submitted}")]
    VersionMismatch { stored: i64, submitted: i64 },

    /// A custom listener refused the event.
    #[error("{0}")]
    Rejected(String),
}
