//! Repositories with behavior beyond [`DefaultRepository`].

use std::sync::Arc;

use crate::app::models::{kind, Role, User, UserRole};
use crate::repository::{DefaultRepository, Repository, RepositoryError};
use crate::storage::{Datastore, Query};

/// Role every new user is linked to.
pub const DEFAULT_ROLE: &str = "User";

/// Users repository that links each created user to the [`DEFAULT_ROLE`].
#[derive(Debug)]
pub struct UserRepository {
    users: DefaultRepository<User>,
    roles: DefaultRepository<Role>,
    user_roles: DefaultRepository<UserRole>,
}

impl UserRepository {
    pub fn new(store: Arc<dyn Datastore>) -> Self {
        Self {
            users: DefaultRepository::new(store.clone(), kind::USERS),
            roles: DefaultRepository::new(store.clone(), kind::ROLES),
            user_roles: DefaultRepository::new(store, kind::USER_ROLES),
        }
    }

    fn default_role(&self) -> Result<Role, RepositoryError> {
        let query = Query::new().filter("Name =", DEFAULT_ROLE).limit(1);
        self.roles
            .find_by(&query)?
            .into_iter()
            .next()
            .ok_or_else(|| RepositoryError::Integrity(format!("role {} not found", DEFAULT_ROLE)))
    }

    /// Roles linked to `user`.
    pub fn roles_of(&self, user: &User) -> Result<Vec<Role>, RepositoryError> {
        let links = self
            .user_roles
            .find_by(&Query::new().filter("UserID =", user.id))?;
        links
            .iter()
            .map(|link| self.roles.find_by_id(link.role_id))
            .collect()
    }
}

impl Repository<User> for UserRepository {
    fn create(&self, user: &mut User) -> Result<(), RepositoryError> {
        // A missing role must not leave a user behind.
        let role = self.default_role()?;
        self.users.create(user)?;
        let mut link = UserRole {
            role_id: role.id,
            user_id: user.id,
            ..Default::default()
        };
        self.user_roles.create(&mut link)
    }

    fn update(&self, user: &mut User) -> Result<(), RepositoryError> {
        self.users.update(user)
    }

    fn delete(&self, user: &User) -> Result<(), RepositoryError> {
        self.users.delete(user)
    }

    fn find_by_id(&self, id: i64) -> Result<User, RepositoryError> {
        self.users.find_by_id(id)
    }

    fn find_all(&self) -> Result<Vec<User>, RepositoryError> {
        self.users.find_all()
    }

    fn find_by(&self, query: &Query) -> Result<Vec<User>, RepositoryError> {
        self.users.find_by(query)
    }

    fn count(&self, query: &Query) -> Result<usize, RepositoryError> {
        self.users.count(query)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryDatastore;

    #[test]
    fn test_create_links_default_role() {
        let store: Arc<dyn Datastore> = Arc::new(MemoryDatastore::new());
        let roles = DefaultRepository::<Role>::new(store.clone(), kind::ROLES);
        for name in ["Root", DEFAULT_ROLE] {
            roles
                .create(&mut Role { name: name.into(), ..Default::default() })
                .unwrap();
        }

        let repository = UserRepository::new(store);
        let mut user = User { nickname: "alice".into(), ..Default::default() };
        repository.create(&mut user).unwrap();

        let linked = repository.roles_of(&user).unwrap();
        assert_eq!(linked.len(), 1);
        assert_eq!(linked[0].name, DEFAULT_ROLE);
    }

    #[test]
    fn test_create_without_default_role_fails_cleanly() {
        let store = Arc::new(MemoryDatastore::new());
        let repository = UserRepository::new(store.clone());
        let err = repository.create(&mut User::default()).unwrap_err();
        assert!(matches!(err, RepositoryError::Integrity(_)));
        assert_eq!(store.len(kind::USERS), 0);
    }
}
