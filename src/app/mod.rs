//! The smart-snippets application: models, seed data and route table.
//!
//! # Routes
//! ```text
//! GET  /                 greeting
//! GET  /_ah/warmup       warmup probe
//! GET  /hello/:name      greeting by name
//! *    /snippets         EntityEndpoint<Snippet>
//! *    /categories       EntityEndpoint<Category>
//! *    /roles            EntityEndpoint<Role>
//! *    /users            EntityEndpoint<User> through UserRepository
//! ```
//!
//! Every route runs behind the request logging middleware. With
//! `router.host` set, requests for any other host get a 404.

pub mod handlers;
pub mod migrations;
pub mod models;
pub mod repositories;

use std::sync::Arc;

use crate::config::{AppConfig, ResourceConfig};
use crate::endpoint::EntityEndpoint;
use crate::entity::Entity;
use crate::repository::Repository;
use crate::routing::matcher::HostMatcher;
use crate::routing::{
    from_fn, ContainerOptions, DefaultContainerFactory, RouteCollection, Router, RouterOptions,
};
use crate::storage::Datastore;

use models::{kind, Category, Role, Snippet, User};
use repositories::UserRepository;

/// Build the application router over `store`.
pub fn build_router(config: &AppConfig, store: Arc<dyn Datastore>) -> Router {
    let factory = DefaultContainerFactory::new(ContainerOptions {
        debug: config.router.debug,
        body_limit: config.listener.max_body_bytes,
    })
    .with_store(store);
    let mut router = Router::with_options(RouterOptions {
        container_factory: Arc::new(factory),
        url_var_prefix: config.router.url_var_prefix.clone(),
    });

    if let Some(host) = &config.router.host {
        router.add_matcher(HostMatcher::new(host.as_str()));
    }
    router
        .middleware(from_fn(handlers::log_requests))
        .get("/", handlers::index)
        .get("/_ah/warmup", handlers::warmup)
        .get("/hello/:name", handlers::hello);

    let resources = &config.resources;
    mount(&mut router, "/snippets", &resources.snippets, EntityEndpoint::<Snippet>::new(kind::SNIPPETS));
    mount(&mut router, "/categories", &resources.categories, EntityEndpoint::<Category>::new(kind::CATEGORIES));
    mount(&mut router, "/roles", &resources.roles, EntityEndpoint::<Role>::new(kind::ROLES));
    mount(
        &mut router,
        "/users",
        &resources.users,
        EntityEndpoint::<User>::new(kind::USERS).with_repository(|store, _kind| {
            Box::new(UserRepository::new(store)) as Box<dyn Repository<User>>
        }),
    );
    router
}

fn mount<E: Entity>(collection: &mut RouteCollection, prefix: &str, config: &ResourceConfig, endpoint: EntityEndpoint<E>) {
    if !config.enabled {
        tracing::debug!(prefix, "resource disabled");
        return;
    }
    collection.mount(prefix, &endpoint.with_commands(config.commands.iter().copied()));
}
