//! Storable records and their optional capabilities.
//!
//! # Capabilities
//! ```text
//! Entity (required)      → numeric ID get/set
//!     as_timestamped()   → HasTimestamps (created/updated)
//!     as_versioned()     → HasVersion    (optimistic concurrency counter)
//!     as_lockable()      → Lockable      (write protection)
//! ```
//!
//! # Design Decisions
//! - Capabilities are queried, not assumed: each accessor defaults to `None`
//!   and a type opts in by returning `Some(self)`
//! - Lifecycle listeners only ever see `&dyn Capability`, so one listener set
//!   serves every entity kind
//! - `Default` is the prototype: endpoints build fresh instances from it

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Serialize};

/// A record that can be persisted through a repository.
pub trait Entity: Serialize + DeserializeOwned + Default + Clone + Send + Sync + 'static {
    /// Storage-assigned identifier (0 until created).
    fn id(&self) -> i64;

    fn set_id(&mut self, id: i64);

    fn as_timestamped(&mut self) -> Option<&mut dyn HasTimestamps> {
        None
    }

    fn as_timestamped_ref(&self) -> Option<&dyn HasTimestamps> {
        None
    }

    fn as_versioned(&self) -> Option<&dyn HasVersion> {
        None
    }

    fn as_versioned_mut(&mut self) -> Option<&mut dyn HasVersion> {
        None
    }

    fn as_lockable(&self) -> Option<&dyn Lockable> {
        None
    }
}

/// Entities that record creation and modification times.
pub trait HasTimestamps {
    fn created(&self) -> DateTime<Utc>;
    fn set_created(&mut self, at: DateTime<Utc>);
    fn set_updated(&mut self, at: DateTime<Utc>);
}

/// Entities carrying a version counter compared on update.
pub trait HasVersion {
    fn version(&self) -> i64;
    fn set_version(&mut self, version: i64);
}

/// Entities that can refuse further mutation.
pub trait Lockable {
    fn is_locked(&self) -> bool;
}

#[cfg(test)]
pub(crate) mod fixtures {
    //! Minimal entities exercising each capability combination.

    use super::*;
    use serde::Deserialize;

    /// Entity with no optional capabilities.
    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    #[serde(default, rename_all = "PascalCase")]
    pub struct Plain {
        #[serde(rename = "ID")]
        pub id: i64,
        pub name: String,
    }

    impl Entity for Plain {
        fn id(&self) -> i64 {
            self.id
        }
        fn set_id(&mut self, id: i64) {
            self.id = id;
        }
    }

    /// Entity with every optional capability.
    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    #[serde(default, rename_all = "PascalCase")]
    pub struct Full {
        #[serde(rename = "ID")]
        pub id: i64,
        pub name: String,
        pub created: DateTime<Utc>,
        pub updated: DateTime<Utc>,
        pub version: i64,
        pub locked: bool,
    }

    impl Entity for Full {
        fn id(&self) -> i64 {
            self.id
        }
        fn set_id(&mut self, id: i64) {
            self.id = id;
        }
        fn as_timestamped(&mut self) -> Option<&mut dyn HasTimestamps> {
            Some(self)
        }
        fn as_timestamped_ref(&self) -> Option<&dyn HasTimestamps> {
            Some(self)
        }
        fn as_versioned(&self) -> Option<&dyn HasVersion> {
            Some(self)
        }
        fn as_versioned_mut(&mut self) -> Option<&mut dyn HasVersion> {
            Some(self)
        }
        fn as_lockable(&self) -> Option<&dyn Lockable> {
            Some(self)
        }
    }

    impl HasTimestamps for Full {
        fn created(&self) -> DateTime<Utc> {
            self.created
        }
        fn set_created(&mut self, at: DateTime<Utc>) {
            self.created = at;
        }
        fn set_updated(&mut self, at: DateTime<Utc>) {
            self.updated = at;
        }
    }

    impl HasVersion for Full {
        fn version(&self) -> i64 {
            self.version
        }
        fn set_version(&mut self, version: i64) {
            self.version = version;
        }
    }

    impl Lockable for Full {
        fn is_locked(&self) -> bool {
            self.locked
        }
    }
}
