//! Route lookup and dispatch.
//!
//! # Responsibilities
//! - Own the root route collection and the container factory
//! - Compile the collection into an immutable dispatch table
//! - Dispatch requests: build container, match, run chain, or 404
//!
//! # Design Decisions
//! - Immutable after compilation (thread-safe without locks)
//! - O(n) route scan in registration order (acceptable for typical route counts)
//! - Explicit 404 through the container rather than a silent default

use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::response::Response;
use thiserror::Error;

use crate::routing::collection::RouteCollection;
use crate::routing::container::{ContainerFactory, DefaultContainerFactory};
use crate::routing::matcher::RequestMatcher;
use crate::routing::route::Route;

#[derive(Debug, Error)]
pub enum RouteError {
    #[error("no route matches {method} {path}")]
    NotFound { method: Method, path: String },
}

/// Name of the route that handled a request, stored in response extensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchedRoute(pub String);

#[derive(Clone)]
pub struct RouterOptions {
    pub container_factory: Arc<dyn ContainerFactory>,
    pub url_var_prefix: String,
}

impl Default for RouterOptions {
    fn default() -> Self {
        Self {
            container_factory: Arc::new(DefaultContainerFactory::default()),
            url_var_prefix: String::from(":"),
        }
    }
}

/// Root route collection plus dispatch options.
pub struct Router {
    collection: RouteCollection,
    options: RouterOptions,
}

impl Router {
    pub fn new() -> Self {
        Self::with_options(RouterOptions::default())
    }

    pub fn with_options(options: RouterOptions) -> Self {
        Self {
            collection: RouteCollection::new(options.url_var_prefix.clone()),
            options,
        }
    }

    pub fn options(&self) -> &RouterOptions {
        &self.options
    }

    pub fn compile(&self) -> CompiledRouter {
        let routes = self.collection.compile();
        tracing::debug!(routes = routes.len(), "routes compiled");
        CompiledRouter {
            routes: Arc::from(routes),
            factory: self.options.container_factory.clone(),
            var_prefix: Arc::from(self.options.url_var_prefix.as_str()),
        }
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

impl Deref for Router {
    type Target = RouteCollection;

    fn deref(&self) -> &RouteCollection {
        &self.collection
    }
}

impl DerefMut for Router {
    fn deref_mut(&mut self) -> &mut RouteCollection {
        &mut self.collection
    }
}

/// Immutable dispatch table produced by [`Router::compile`].
#[derive(Clone)]
pub struct CompiledRouter {
    routes: Arc<[Route]>,
    factory: Arc<dyn ContainerFactory>,
    var_prefix: Arc<str>,
}

impl CompiledRouter {
    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub async fn dispatch(&self, request: Request<Body>) -> Response {
        let mut container = self.factory.create(request);
        let matched = RequestMatcher::new(&self.routes[..]).find(container.request());
        let Some((route, params)) = matched else {
            let err = RouteError::NotFound {
                method: container.method().clone(),
                path: container.path().to_string(),
            };
            return container.error(err, StatusCode::NOT_FOUND);
        };

        container.bind_path_params(params, &self.var_prefix);
        let mut response = route.run(container).await;
        if let Some(name) = route.name() {
            response
                .extensions_mut()
                .insert(MatchedRoute(name.to_string()));
        }
        response
    }
}

impl std::fmt::Debug for CompiledRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompiledRouter")
            .field("routes", &self.routes)
            .field("var_prefix", &self.var_prefix)
            .finish()
    }
}
