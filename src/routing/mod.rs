//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Route registration (at startup):
//!     RouteCollection tree (get/post/.../sub/mount/middleware)
//!     → collection.rs compile (prepend inherited matchers + middleware)
//!     → router.rs CompiledRouter (immutable, Arc-shared)
//!
//! Incoming Request:
//!     → ContainerFactory builds a Container
//!     → matcher.rs RequestMatcher (first route whose matchers all succeed)
//!     → middleware.rs chain (outer to inner) → handler
//!     → or 404 through Container::error
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - No regex in hot path (segment matching only)
//! - Deterministic: same input always matches same route
//! - First match wins (registration order)

pub mod collection;
pub mod container;
pub mod matcher;
pub mod middleware;
pub mod route;
pub mod router;

pub use collection::{RouteCollection, RouteProvider};
pub use container::{
    BodyError, Container, ContainerError, ContainerFactory, ContainerOptions, DefaultContainerFactory,
};
pub use matcher::{Matcher, PathParams};
pub use middleware::{from_fn, Handler, Middleware, Next};
pub use route::{Route, RouteOptions};
pub use router::{CompiledRouter, MatchedRoute, RouteError, Router, RouterOptions};
