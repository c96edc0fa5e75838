//! Smart Snippets: a REST resource framework and the snippets service built on it.

// Framework
pub mod endpoint;
pub mod entity;
pub mod events;
pub mod repository;
pub mod routing;
pub mod storage;

// Service
pub mod app;
pub mod config;
pub mod http;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;

pub use config::schema::AppConfig;
pub use endpoint::EntityEndpoint;
pub use entity::Entity;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use repository::{DefaultRepository, Repository, RepositoryError};
pub use routing::{Container, RouteCollection, Router};
pub use storage::{Datastore, MemoryDatastore, Query};
