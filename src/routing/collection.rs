//! Route registration tree.
//!
//! # Responsibilities
//! - Register routes per method and pattern under the collection prefix
//! - Hold collection-level matchers and middleware
//! - Nest child collections (`sub`) and route providers (`mount`)
//! - Flatten the tree into an ordered route list (`compile`)
//!
//! # Design Decisions
//! - A collection's own routes come before its children's routes
//! - Parent matchers and middleware are prepended once per compiled route
//! - Compiling reads the tree only; compiling twice gives the same list

use std::sync::Arc;

use axum::http::Method;

use crate::routing::matcher::{join_paths, Matcher, MethodMatcher, PathPrefixMatcher, PatternMatcher};
use crate::routing::middleware::{Handler, Middleware};
use crate::routing::route::{Route, RouteOptions};

/// Something that registers its routes on a collection.
pub trait RouteProvider {
    fn connect(&self, collection: &mut RouteCollection);
}

#[derive(Clone)]
pub struct RouteCollection {
    prefix: String,
    var_prefix: String,
    matchers: Vec<Arc<dyn Matcher>>,
    middlewares: Vec<Arc<dyn Middleware>>,
    routes: Vec<Route>,
    children: Vec<RouteCollection>,
}

impl RouteCollection {
    /// Root collection; `var_prefix` is prepended to captured variable names.
    pub fn new(var_prefix: impl Into<String>) -> Self {
        Self {
            prefix: String::from("/"),
            var_prefix: var_prefix.into(),
            matchers: Vec::new(),
            middlewares: Vec::new(),
            routes: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn var_prefix(&self) -> &str {
        &self.var_prefix
    }

    /// Append middleware run by every route of this collection and its children.
    pub fn middleware(&mut self, middleware: impl Middleware) -> &mut Self {
        self.middlewares.push(Arc::new(middleware));
        self
    }

    pub fn add_matcher(&mut self, matcher: impl Matcher + 'static) -> &mut Self {
        self.matchers.push(Arc::new(matcher));
        self
    }

    pub fn get(&mut self, pattern: &str, handler: impl Handler) -> &mut Self {
        self.route([Method::GET], pattern, handler)
    }

    pub fn post(&mut self, pattern: &str, handler: impl Handler) -> &mut Self {
        self.route([Method::POST], pattern, handler)
    }

    pub fn put(&mut self, pattern: &str, handler: impl Handler) -> &mut Self {
        self.route([Method::PUT], pattern, handler)
    }

    pub fn patch(&mut self, pattern: &str, handler: impl Handler) -> &mut Self {
        self.route([Method::PATCH], pattern, handler)
    }

    pub fn delete(&mut self, pattern: &str, handler: impl Handler) -> &mut Self {
        self.route([Method::DELETE], pattern, handler)
    }

    pub fn options(&mut self, pattern: &str, handler: impl Handler) -> &mut Self {
        self.route([Method::OPTIONS], pattern, handler)
    }

    pub fn route(
        &mut self,
        methods: impl IntoIterator<Item = Method>,
        pattern: &str,
        handler: impl Handler,
    ) -> &mut Self {
        self.route_with(methods, pattern, handler, RouteOptions::default())
    }

    /// Register a route with a name and route-local middleware.
    pub fn route_with(
        &mut self,
        methods: impl IntoIterator<Item = Method>,
        pattern: &str,
        handler: impl Handler,
        options: RouteOptions,
    ) -> &mut Self {
        let full = join_paths(&self.prefix, pattern);
        let matchers: Vec<Arc<dyn Matcher>> = vec![
            Arc::new(PatternMatcher::new(&full, &self.var_prefix)),
            Arc::new(MethodMatcher::new(methods)),
        ];
        self.routes
            .push(Route::new(full, matchers, Arc::new(handler), options));
        self
    }

    /// Create a child collection under `prefix` and return it.
    pub fn sub(&mut self, prefix: &str) -> &mut RouteCollection {
        let full = join_paths(&self.prefix, prefix);
        let mut child = RouteCollection::new(self.var_prefix.clone());
        if full != "/" {
            child.matchers.push(Arc::new(PathPrefixMatcher::new(&full, &self.var_prefix)));
        }
        child.prefix = full;
        let index = self.children.len();
        self.children.push(child);
        &mut self.children[index]
    }

    /// Let `provider` register its routes on a new child collection at `prefix`.
    pub fn mount<P: RouteProvider + ?Sized>(&mut self, prefix: &str, provider: &P) -> &mut Self {
        provider.connect(self.sub(prefix));
        self
    }

    /// Flatten into the ordered list of routes with inherited matchers and
    /// middleware applied.
    pub fn compile(&self) -> Vec<Route> {
        let mut routes = Vec::new();
        self.flatten(&[], &[], &mut routes);
        routes
    }

    fn flatten(
        &self,
        inherited_matchers: &[Arc<dyn Matcher>],
        inherited_middlewares: &[Arc<dyn Middleware>],
        out: &mut Vec<Route>,
    ) {
        let matchers: Vec<_> = inherited_matchers.iter().chain(&self.matchers).cloned().collect();
        let middlewares: Vec<_> = inherited_middlewares
            .iter()
            .chain(&self.middlewares)
            .cloned()
            .collect();
        for route in &self.routes {
            out.push(route.inherit(&matchers, &middlewares));
        }
        for child in &self.children {
            child.flatten(&matchers, &middlewares, out);
        }
    }
}

impl Default for RouteCollection {
    fn default() -> Self {
        Self::new(":")
    }
}
