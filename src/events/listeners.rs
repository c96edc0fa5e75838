//! Built-in lifecycle listeners attached to every repository.
//!
//! # Rules
//! - Create: stamp created/updated, start versions at 1
//! - Update: refuse locked records, compare versions, bump version, keep the
//!   stored created time, stamp updated, pin the identifier to the stored one
//! - Delete: refuse locked records
//!
//! Each rule applies only when the entity exposes the matching capability.

use chrono::Utc;

use crate::entity::Entity;
use crate::events::{EntityEvent, LifecycleError, Listener};

/// Initializes timestamps and version on new entities.
#[derive(Debug, Default, Clone, Copy)]
pub struct BeforeEntityCreated;

impl<E: Entity> Listener<E> for BeforeEntityCreated {
    fn handle(&self, event: &mut EntityEvent<'_, E>) -> Result<(), LifecycleError> {
        if let EntityEvent::BeforeCreated(entity) = event {
            if let Some(stamped) = entity.as_timestamped() {
                let now = Utc::now();
                stamped.set_created(now);
                stamped.set_updated(now);
            }
            if let Some(versioned) = entity.as_versioned_mut() {
                versioned.set_version(1);
            }
        }
        Ok(())
    }
}

/// Optimistic concurrency and write protection on update.
#[derive(Debug, Default, Clone, Copy)]
pub struct BeforeEntityUpdated;

impl<E: Entity> Listener<E> for BeforeEntityUpdated {
    fn handle(&self, event: &mut EntityEvent<'_, E>) -> Result<(), LifecycleError> {
        if let EntityEvent::BeforeUpdated { old, new } = event {
            if old.as_lockable().is_some_and(|l| l.is_locked()) {
                return Err(LifecycleError::Locked);
            }
            if let (Some(stored), Some(submitted)) = (old.as_versioned(), new.as_versioned_mut()) {
                if stored.version() != submitted.version() {
                    return Err(LifecycleError::VersionMismatch {
                        stored: stored.version(),
                        submitted: submitted.version(),
                    });
                }
                submitted.set_version(stored.version() + 1);
            }
            let created = old.as_timestamped_ref().map(|stored| stored.created());
            if let Some(stamped) = new.as_timestamped() {
                if let Some(created) = created {
                    stamped.set_created(created);
                }
                stamped.set_updated(Utc::now());
            }
            new.set_id(old.id());
        }
        Ok(())
    }
}

/// Refuses to delete locked entities.
#[derive(Debug, Default, Clone, Copy)]
pub struct BeforeEntityDeleted;

impl<E: Entity> Listener<E> for BeforeEntityDeleted {
    fn handle(&self, event: &mut EntityEvent<'_, E>) -> Result<(), LifecycleError> {
        if let EntityEvent::BeforeDeleted(entity) = event {
            if entity.as_lockable().is_some_and(|l| l.is_locked()) {
                return Err(LifecycleError::Locked);
            }
        }
        Ok(())
    }
}
