//! Generic CRUD resource over any [`Entity`].
//!
//! # Data Flow
//! ```text
//! mount("/snippets", &EntityEndpoint::<Snippet>::new("Snippets"))
//!     → connect(): resource middleware + GET / POST / PUT /:id DELETE /:id GET /:id
//!
//! request
//!     → resource middleware (puts Arc<Resource<E>> into the container)
//!     → handlers.rs (index/get/post/put/delete)
//!     → EndPointContainer<E> (repository built lazily, signal, prototype)
//!     → Repository<E> → Datastore
//! ```
//!
//! # Design Decisions
//! - The endpoint signal carries application hooks; the concurrency
//!   listeners live on the repository signal so they run once per write
//! - Handlers are generic functions; nothing is resolved at runtime by type
//! - Status codes are chosen per step, not per error type

pub mod container;
pub mod handlers;

use std::fmt;
use std::sync::Arc;

use axum::http::Method;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::entity::Entity;
use crate::events::{LifecycleError, Listener, Signal};
use crate::repository::{DefaultRepository, Repository, RepositoryError};
use crate::routing::{from_fn, BodyError, Container, ContainerError, Next, RouteCollection, RouteOptions, RouteProvider};
use crate::storage::Datastore;

pub use container::EndPointContainer;

/// Builds the repository an endpoint works with, per request.
pub type RepositoryFactory<E> =
    Arc<dyn Fn(Arc<dyn Datastore>, &str) -> Box<dyn Repository<E>> + Send + Sync>;

/// One of the five operations an endpoint can expose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Command {
    Index,
    Get,
    Post,
    Put,
    Delete,
}

impl Command {
    /// Registration order used by [`EntityEndpoint::connect`].
    pub const ALL: [Command; 5] = [
        Command::Index,
        Command::Post,
        Command::Put,
        Command::Delete,
        Command::Get,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Command::Index => "index",
            Command::Get => "get",
            Command::Post => "post",
            Command::Put => "put",
            Command::Delete => "delete",
        }
    }

    fn method(&self) -> Method {
        match self {
            Command::Index | Command::Get => Method::GET,
            Command::Post => Method::POST,
            Command::Put => Method::PUT,
            Command::Delete => Method::DELETE,
        }
    }

    fn pattern(&self) -> &'static str {
        match self {
            Command::Index | Command::Post => "/",
            Command::Get | Command::Put | Command::Delete => "/:id",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors reported by endpoint handlers.
#[derive(Debug, Error)]
pub enum EndpointError {
    #[error("invalid id {0:?}")]
    InvalidId(String),

    #[error(transparent)]
    Body(#[from] BodyError),

    #[error(transparent)]
    Container(#[from] ContainerError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),
}

/// What the handlers of one mounted endpoint share.
pub struct Resource<E> {
    kind: String,
    signal: Signal<E>,
    repository_factory: RepositoryFactory<E>,
}

impl<E: Entity> Resource<E> {
    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn signal(&self) -> &Signal<E> {
        &self.signal
    }

    fn repository(&self, store: Arc<dyn Datastore>) -> Box<dyn Repository<E>> {
        (self.repository_factory)(store, &self.kind)
    }
}

fn default_repository<E: Entity>(store: Arc<dyn Datastore>, kind: &str) -> Box<dyn Repository<E>> {
    Box::new(DefaultRepository::new(store, kind))
}

/// CRUD routes for entity type `E` stored under one kind.
pub struct EntityEndpoint<E> {
    kind: String,
    commands: Vec<Command>,
    signal: Signal<E>,
    repository_factory: RepositoryFactory<E>,
}

impl<E: Entity> EntityEndpoint<E> {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            commands: Command::ALL.to_vec(),
            signal: Signal::new(),
            repository_factory: Arc::new(default_repository::<E>),
        }
    }

    /// Expose only `commands`.
    pub fn with_commands(mut self, commands: impl IntoIterator<Item = Command>) -> Self {
        self.commands = commands.into_iter().collect();
        self
    }

    /// Add a hook to the endpoint signal.
    pub fn with_listener(mut self, listener: Arc<dyn Listener<E>>) -> Self {
        self.signal.add(listener);
        self
    }

    pub fn with_repository<F>(mut self, factory: F) -> Self
    where
        F: Fn(Arc<dyn Datastore>, &str) -> Box<dyn Repository<E>> + Send + Sync + 'static,
    {
        self.repository_factory = Arc::new(factory);
        self
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn signal(&self) -> &Signal<E> {
        &self.signal
    }

    fn route_name(&self, command: Command) -> String {
        format!("{}.{}", self.kind.to_lowercase(), command)
    }
}

impl<E: Entity> RouteProvider for EntityEndpoint<E> {
    fn connect(&self, collection: &mut RouteCollection) {
        let resource = Arc::new(Resource {
            kind: self.kind.clone(),
            signal: self.signal.clone(),
            repository_factory: self.repository_factory.clone(),
        });
        collection.middleware(from_fn(move |mut container: Container, next: Next| {
            let resource = resource.clone();
            async move {
                container.extensions_mut().insert(resource);
                next.run(container).await
            }
        }));

        for command in Command::ALL {
            if !self.commands.contains(&command) {
                continue;
            }
            let options = RouteOptions::new().name(self.route_name(command));
            let (method, pattern) = (command.method(), command.pattern());
            match command {
                Command::Index => collection.route_with([method], pattern, handlers::index::<E>, options),
                Command::Get => collection.route_with([method], pattern, handlers::get::<E>, options),
                Command::Post => collection.route_with([method], pattern, handlers::post::<E>, options),
                Command::Put => collection.route_with([method], pattern, handlers::put::<E>, options),
                Command::Delete => collection.route_with([method], pattern, handlers::delete::<E>, options),
            };
        }
        tracing::debug!(kind = %self.kind, commands = ?self.commands, "entity endpoint connected");
    }
}

impl<E> fmt::Debug for EntityEndpoint<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityEndpoint")
            .field("kind", &self.kind)
            .field("commands", &self.commands)
            .field("signal", &self.signal)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::fixtures::Plain;

    #[test]
    fn test_commands_deserialize_lowercase() {
        let commands: Vec<Command> = serde_json::from_str(r#"["index","get"]"#).unwrap();
        assert_eq!(commands, vec![Command::Index, Command::Get]);
        assert_eq!(Command::Delete.to_string(), "delete");
    }

    #[test]
    fn test_connect_registers_allowed_commands_in_order() {
        let mut collection = RouteCollection::default();
        collection.mount("/plain", &EntityEndpoint::<Plain>::new("Plain"));
        let names: Vec<_> = collection
            .compile()
            .iter()
            .map(|r| r.name().unwrap_or_default().to_string())
            .collect();
        assert_eq!(
            names,
            vec!["plain.index", "plain.post", "plain.put", "plain.delete", "plain.get"]
        );

        let mut collection = RouteCollection::default();
        let endpoint = EntityEndpoint::<Plain>::new("Users").with_commands([Command::Get, Command::Index]);
        collection.mount("/users", &endpoint);
        let routes = collection.compile();
        let patterns: Vec<_> = routes.iter().map(|r| r.pattern().to_string()).collect();
        assert_eq!(patterns, vec!["/users", "/users/:id"]);
        assert!(routes.iter().all(|r| r.middlewares().len() == 1));
    }
}
