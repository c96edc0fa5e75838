//! A compiled route: matchers, middleware chain and handler.

use std::fmt;
use std::sync::Arc;

use axum::response::Response;

use crate::routing::container::Container;
use crate::routing::matcher::{Matcher, MatcherProvider};
use crate::routing::middleware::{Handler, Middleware, Next};

/// Per-route settings accepted by [`RouteCollection::route_with`](crate::routing::RouteCollection::route_with).
#[derive(Clone, Default)]
pub struct RouteOptions {
    pub name: Option<String>,
    pub middlewares: Vec<Arc<dyn Middleware>>,
}

impl RouteOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn middleware(mut self, middleware: impl Middleware) -> Self {
        self.middlewares.push(Arc::new(middleware));
        self
    }
}

#[derive(Clone)]
pub struct Route {
    name: Option<String>,
    pattern: String,
    matchers: Vec<Arc<dyn Matcher>>,
    middlewares: Arc<[Arc<dyn Middleware>]>,
    handler: Arc<dyn Handler>,
}

impl Route {
    pub(crate) fn new(
        pattern: String,
        matchers: Vec<Arc<dyn Matcher>>,
        handler: Arc<dyn Handler>,
        options: RouteOptions,
    ) -> Self {
        Self {
            name: options.name,
            pattern,
            matchers,
            middlewares: Arc::from(options.middlewares),
            handler,
        }
    }

    /// Copy of this route with `matchers` and `middlewares` placed in front
    /// of its own.
    pub(crate) fn inherit(&self, matchers: &[Arc<dyn Matcher>], middlewares: &[Arc<dyn Middleware>]) -> Self {
        Self {
            name: self.name.clone(),
            pattern: self.pattern.clone(),
            matchers: matchers.iter().chain(&self.matchers).cloned().collect(),
            middlewares: middlewares.iter().chain(self.middlewares.iter()).cloned().collect(),
            handler: self.handler.clone(),
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// The full path pattern the route was registered under.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn middlewares(&self) -> &[Arc<dyn Middleware>] {
        &self.middlewares
    }

    /// Run the middleware chain, then the handler.
    pub async fn run(&self, container: Container) -> Response {
        Next::new(self.middlewares.clone(), self.handler.clone())
            .run(container)
            .await
    }
}

impl MatcherProvider for Route {
    fn matchers(&self) -> &[Arc<dyn Matcher>] {
        &self.matchers
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.pattern)?;
        if let Some(name) = &self.name {
            write!(f, " ({})", name)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("name", &self.name)
            .field("pattern", &self.pattern)
            .field("matchers", &self.matchers)
            .field("middlewares", &self.middlewares.len())
            .finish()
    }
}
