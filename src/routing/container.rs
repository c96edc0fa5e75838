//! Per-request context handed to middleware and handlers.
//!
//! # Responsibilities
//! - Own the request for the lifetime of one dispatch
//! - Expose path variables and query-string parameters
//! - Decode JSON bodies with a size limit
//! - Provide a request-scoped tracing span and the shared datastore
//! - Render errors, verbosely in debug mode and canonically otherwise
//!
//! # Design Decisions
//! - One container per request, created by a [`ContainerFactory`]
//! - Middleware may replace the container it passes on (decoration)
//! - Typed extras ride in [`Extensions`], keyed by type

use std::fmt;
use std::sync::{Arc, OnceLock};

use axum::body::Body;
use axum::http::{Extensions, Method, Request, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::Span;

use crate::http::request::RequestIdExt;
use crate::routing::matcher::PathParams;
use crate::storage::Datastore;

/// Default upper bound for request bodies (1 MiB).
pub const DEFAULT_BODY_LIMIT: usize = 1024 * 1024;

/// Errors raised while reading a request body.
#[derive(Debug, Error)]
pub enum BodyError {
    #[error("failed to read request body: {0}")]
    Read(#[source] axum::Error),

    #[error("invalid JSON body: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors raised when a container lacks something a handler needs.
#[derive(Debug, Error)]
pub enum ContainerError {
    #[error("no datastore configured")]
    NoStore,

    #[error("container is missing {0}")]
    Missing(&'static str),
}

#[derive(Debug, Clone)]
pub struct ContainerOptions {
    /// Return error details to clients instead of canonical status text.
    pub debug: bool,
    pub body_limit: usize,
}

impl Default for ContainerOptions {
    fn default() -> Self {
        Self {
            debug: false,
            body_limit: DEFAULT_BODY_LIMIT,
        }
    }
}

pub struct Container {
    request: Request<Body>,
    params: PathParams,
    var_prefix: String,
    options: ContainerOptions,
    store: Option<Arc<dyn Datastore>>,
    logger: OnceLock<Span>,
    extensions: Extensions,
}

impl Container {
    pub fn new(request: Request<Body>) -> Self {
        Self {
            request,
            params: PathParams::new(),
            var_prefix: String::from(":"),
            options: ContainerOptions::default(),
            store: None,
            logger: OnceLock::new(),
            extensions: Extensions::new(),
        }
    }

    pub fn with_options(mut self, options: ContainerOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_store(mut self, store: Arc<dyn Datastore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn request(&self) -> &Request<Body> {
        &self.request
    }

    pub fn request_mut(&mut self) -> &mut Request<Body> {
        &mut self.request
    }

    pub fn method(&self) -> &Method {
        self.request.method()
    }

    pub fn path(&self) -> &str {
        self.request.uri().path()
    }

    pub fn request_id(&self) -> Option<&str> {
        self.request.request_id()
    }

    pub fn is_debug(&self) -> bool {
        self.options.debug
    }

    pub fn options(&self) -> &ContainerOptions {
        &self.options
    }

    /// Attach the variables captured by the matched route.
    pub(crate) fn bind_path_params(&mut self, params: PathParams, var_prefix: &str) {
        self.params = params;
        self.var_prefix = var_prefix.to_string();
    }

    pub fn path_params(&self) -> &PathParams {
        &self.params
    }

    /// A route variable by its bare name (`id` for a `:id` segment).
    pub fn route_var(&self, name: &str) -> Option<&str> {
        self.params.get(&format!("{}{}", self.var_prefix, name))
    }

    /// Look up `name` among the bound path variables (full bound name, such
    /// as `:id`), then in the query string.
    pub fn query_param(&self, name: &str) -> Option<String> {
        if let Some(value) = self.params.get(name) {
            return Some(value.to_string());
        }
        let query = self.request.uri().query()?;
        url::form_urlencoded::parse(query.as_bytes())
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.into_owned())
    }

    /// Consume the request body and decode it as JSON.
    ///
    /// The body can be read once; later calls see an empty body.
    pub async fn read_json<T: DeserializeOwned>(&mut self) -> Result<T, BodyError> {
        let body = std::mem::take(self.request.body_mut());
        let bytes = axum::body::to_bytes(body, self.options.body_limit)
            .await
            .map_err(BodyError::Read)?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Request-scoped span; created on first use.
    pub fn logger(&self) -> &Span {
        self.logger.get_or_init(|| {
            tracing::info_span!(
                "request",
                request_id = self.request_id().unwrap_or("-"),
                method = %self.request.method(),
                path = %self.request.uri().path(),
            )
        })
    }

    pub fn store(&self) -> Result<Arc<dyn Datastore>, ContainerError> {
        self.store.clone().ok_or(ContainerError::NoStore)
    }

    pub fn extensions(&self) -> &Extensions {
        &self.extensions
    }

    pub fn extensions_mut(&mut self) -> &mut Extensions {
        &mut self.extensions
    }

    /// Log `err` and render it with `status`.
    pub fn error(&self, err: impl fmt::Display, status: StatusCode) -> Response {
        let _entered = self.logger().enter();
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = %err, "request failed");
        } else {
            tracing::debug!(status = status.as_u16(), error = %err, "request rejected");
        }
        let body = if self.options.debug {
            err.to_string()
        } else {
            status.canonical_reason().unwrap_or("Error").to_string()
        };
        (status, body).into_response()
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("method", self.request.method())
            .field("path", &self.request.uri().path())
            .field("params", &self.params)
            .field("options", &self.options)
            .finish()
    }
}

/// Builds the container for each incoming request.
pub trait ContainerFactory: Send + Sync {
    fn create(&self, request: Request<Body>) -> Container;
}

impl<F> ContainerFactory for F
where
    F: Fn(Request<Body>) -> Container + Send + Sync,
{
    fn create(&self, request: Request<Body>) -> Container {
        self(request)
    }
}

/// Factory applying fixed options and an optional shared datastore.
#[derive(Debug, Clone, Default)]
pub struct DefaultContainerFactory {
    options: ContainerOptions,
    store: Option<Arc<dyn Datastore>>,
}

impl DefaultContainerFactory {
    pub fn new(options: ContainerOptions) -> Self {
        Self { options, store: None }
    }

    pub fn with_store(mut self, store: Arc<dyn Datastore>) -> Self {
        self.store = Some(store);
        self
    }
}

impl ContainerFactory for DefaultContainerFactory {
    fn create(&self, request: Request<Body>) -> Container {
        let container = Container::new(request).with_options(self.options.clone());
        match &self.store {
            Some(store) => container.with_store(store.clone()),
            None => container,
        }
    }
}
