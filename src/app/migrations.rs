//! Named, run-once data migrations.
//!
//! # Data Flow
//! ```text
//! run_migrations(store, steps)
//!     → for each step: count Migrations where Name = step.name
//!     → already recorded: skip
//!     → otherwise: run task → record Migration{Name}
//! ```
//!
//! # Design Decisions
//! - Steps run in declaration order and stop at the first failure
//! - A step is recorded only after its task succeeded

use std::sync::Arc;

use crate::app::models::{kind, Category, Migration, Role, User};
use crate::app::repositories::UserRepository;
use crate::repository::{DefaultRepository, Repository, RepositoryError};
use crate::storage::{Datastore, Query};

pub type MigrationTask = fn(&Arc<dyn Datastore>) -> Result<(), RepositoryError>;

/// One migration step.
#[derive(Clone, Copy)]
pub struct MigrationStep {
    pub name: &'static str,
    pub task: MigrationTask,
}

/// Every migration the application ships, in order.
pub fn migrations() -> Vec<MigrationStep> {
    vec![
        MigrationStep {
            name: "001-categories",
            task: seed_categories,
        },
        MigrationStep {
            name: "002-roles",
            task: seed_roles,
        },
        MigrationStep {
            name: "003-users",
            task: seed_anonymous_user,
        },
    ]
}

/// Run the steps not yet recorded; returns how many ran.
pub fn run_migrations(store: &Arc<dyn Datastore>, steps: &[MigrationStep]) -> Result<usize, RepositoryError> {
    let records = DefaultRepository::<Migration>::new(store.clone(), kind::MIGRATIONS);
    let mut applied = 0;
    for step in steps {
        let query = Query::new().filter("Name =", step.name).limit(1);
        if records.count(&query)? != 0 {
            tracing::debug!(migration = step.name, "migration already applied");
            continue;
        }
        (step.task)(store)?;
        records.create(&mut Migration {
            name: step.name.to_string(),
            ..Default::default()
        })?;
        tracing::info!(migration = step.name, "migration applied");
        applied += 1;
    }
    Ok(applied)
}

const CATEGORIES: [(&str, &str); 18] = [
    ("PHP", "The PHP Language"),
    ("Javascript", "The Javascript Language"),
    ("Go", "The Go Language"),
    ("Java", "The Java Language"),
    ("Ruby", "The Ruby Language"),
    ("Python", "The Python Language"),
    ("C", "The C Language"),
    ("C++", "The C++ Language"),
    ("SQL", "The SQL Query Language"),
    ("Scala", "The Scala Language"),
    ("Rust", "The Rust Language"),
    ("LISP", "The LISP Language"),
    ("HTML", "The HTML Markup Language"),
    ("XML", "The XML Language"),
    ("CSS", "The CSS Language"),
    ("Typescript", "The Typescript Language"),
    ("Swift", "The Swift Language"),
    ("Objective-C", "The Objective-C Language"),
];

const ROLES: [(&str, &str); 4] = [
    ("Root", "The root administrators"),
    ("SuperAdmin", "The Super Administrators"),
    ("User", "Basic User"),
    ("Anonymous", "Unauthenticated user, has no rights"),
];

fn seed_categories(store: &Arc<dyn Datastore>) -> Result<(), RepositoryError> {
    let repository = DefaultRepository::<Category>::new(store.clone(), kind::CATEGORIES);
    for (title, description) in CATEGORIES {
        repository.create(&mut Category {
            title: title.to_string(),
            description: description.to_string(),
            ..Default::default()
        })?;
    }
    Ok(())
}

fn seed_roles(store: &Arc<dyn Datastore>) -> Result<(), RepositoryError> {
    let repository = DefaultRepository::<Role>::new(store.clone(), kind::ROLES);
    for (name, description) in ROLES {
        repository.create(&mut Role {
            name: name.to_string(),
            description: description.to_string(),
            locked: true,
            ..Default::default()
        })?;
    }
    Ok(())
}

fn seed_anonymous_user(store: &Arc<dyn Datastore>) -> Result<(), RepositoryError> {
    UserRepository::new(store.clone()).create(&mut User {
        nickname: "Anonymous".to_string(),
        ..Default::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryDatastore;

    #[test]
    fn test_migrations_run_once() {
        let memory = Arc::new(MemoryDatastore::new());
        let store: Arc<dyn Datastore> = memory.clone();

        assert_eq!(run_migrations(&store, &migrations()).unwrap(), 3);
        assert_eq!(memory.len(kind::CATEGORIES), CATEGORIES.len());
        assert_eq!(memory.len(kind::ROLES), 4);
        assert_eq!(memory.len(kind::USERS), 1);
        assert_eq!(memory.len(kind::USER_ROLES), 1);
        assert_eq!(memory.len(kind::MIGRATIONS), 3);

        assert_eq!(run_migrations(&store, &migrations()).unwrap(), 0);
        assert_eq!(memory.len(kind::CATEGORIES), CATEGORIES.len());
    }

    #[test]
    fn test_seeded_roles_are_locked() {
        let store: Arc<dyn Datastore> = Arc::new(MemoryDatastore::new());
        run_migrations(&store, &migrations()).unwrap();
        let roles = DefaultRepository::<Role>::new(store, kind::ROLES).find_all().unwrap();
        assert!(roles.iter().all(|r| r.locked));
    }

    #[test]
    fn test_failed_step_is_not_recorded() {
        fn fail(_: &Arc<dyn Datastore>) -> Result<(), RepositoryError> {
            Err(RepositoryError::Integrity("boom".into()))
        }
        let memory = Arc::new(MemoryDatastore::new());
        let store: Arc<dyn Datastore> = memory.clone();
        let steps = [MigrationStep { name: "broken", task: fail }];
        assert!(run_migrations(&store, &steps).is_err());
        assert_eq!(memory.len(kind::MIGRATIONS), 0);
    }
}
