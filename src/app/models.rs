//! Records served by the application.
//!
//! Field names serialize in PascalCase with `ID` for the identifier, so a
//! snippet reads `{"ID":1,"Title":"...","Version":1,...}` on the wire.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::{Entity, HasTimestamps, HasVersion, Lockable};

/// Storage kinds, one per model.
pub mod kind {
    pub const SNIPPETS: &str = "Snippets";
    pub const CATEGORIES: &str = "Categories";
    pub const ROLES: &str = "Roles";
    pub const USERS: &str = "Users";
    pub const USER_ROLES: &str = "UserRoles";
    pub const MIGRATIONS: &str = "Migrations";
}

macro_rules! timestamps {
    ($model:ty) => {
        impl HasTimestamps for $model {
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
    };
}

macro_rules! version {
    ($model:ty) => {
        impl HasVersion for $model {
            fn version(&self) -> i64 {
                self.version
            }
            fn set_version(&mut self, version: i64) {
                self.version = version;
            }
        }
    };
}

/// Implements `Entity` for a model with `id`, `created`, `updated` and,
/// when `versioned`, `version` fields.
macro_rules! entity {
    ($model:ty) => {
        impl Entity for $model {
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
        }
        timestamps!($model);
    };
    ($model:ty, versioned) => {
        impl Entity for $model {
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
        }
        timestamps!($model);
        version!($model);
    };
}

/// A code snippet.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct Snippet {
    #[serde(rename = "ID")]
    pub id: i64,
    pub title: String,
    pub description: String,
    pub content: String,
    #[serde(rename = "CategoryID")]
    pub category_id: i64,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
    pub version: i64,
}

entity!(Snippet, versioned);

/// A snippet category, usually a language.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct Category {
    #[serde(rename = "ID")]
    pub id: i64,
    pub title: String,
    pub description: String,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
    pub version: i64,
}

entity!(Category, versioned);

/// A user role. Seeded roles are locked.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct Role {
    #[serde(rename = "ID")]
    pub id: i64,
    pub name: String,
    pub description: String,
    pub version: i64,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
    pub locked: bool,
}

impl Entity for Role {
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

timestamps!(Role);
version!(Role);

impl Lockable for Role {
    fn is_locked(&self) -> bool {
        self.locked
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct User {
    #[serde(rename = "ID")]
    pub id: i64,
    pub nickname: String,
    pub email: String,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
    pub version: i64,
}

entity!(User, versioned);

/// Link between a user and one of its roles.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct UserRole {
    #[serde(rename = "ID")]
    pub id: i64,
    #[serde(rename = "RoleID")]
    pub role_id: i64,
    #[serde(rename = "UserID")]
    pub user_id: i64,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
    pub version: i64,
}

entity!(UserRole, versioned);

/// Record of an applied migration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct Migration {
    #[serde(rename = "ID")]
    pub id: i64,
    pub name: String,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
}

entity!(Migration);

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_snippet_wire_names() {
        let snippet = Snippet {
            id: 3,
            title: "Hello".into(),
            category_id: 7,
            version: 2,
            ..Default::default()
        };
        let value = serde_json::to_value(&snippet).unwrap();
        assert_eq!(value["ID"], json!(3));
        assert_eq!(value["Title"], json!("Hello"));
        assert_eq!(value["CategoryID"], json!(7));
        assert_eq!(value["Version"], json!(2));

        let parsed: Snippet = serde_json::from_value(json!({"Title": "Only title"})).unwrap();
        assert_eq!(parsed.title, "Only title");
        assert_eq!(parsed.id, 0);
    }

    #[test]
    fn test_capabilities() {
        let mut role = Role { locked: true, version: 4, ..Default::default() };
        assert!(role.as_lockable().map(|l| l.is_locked()).unwrap_or(false));
        assert_eq!(role.as_versioned().map(|v| v.version()), Some(4));
        assert!(role.as_timestamped().is_some());

        let snippet = Snippet::default();
        assert!(snippet.as_lockable().is_none());

        let mut migration = Migration::default();
        assert!(migration.as_versioned().is_none());
        assert!(migration.as_timestamped().is_some());
    }
}
