//! Handlers, middleware and the chain that runs them.
//!
//! # Data Flow
//! ```text
//! Next::run(container)
//!     → middleware[0].handle(container, next)
//!     → middleware[1].handle(container, next)
//!     → ...
//!     → handler.call(container)
//! ```
//!
//! # Design Decisions
//! - A middleware short-circuits by returning without calling `next`
//! - The container is passed by value, so middleware can swap it out
//! - Chains are shared slices; running one never allocates a new list

use std::future::Future;
use std::sync::Arc;

use axum::response::Response;
use futures_util::future::BoxFuture;

use crate::routing::container::Container;

/// Terminal request handler.
pub trait Handler: Send + Sync + 'static {
    fn call(&self, container: Container) -> BoxFuture<'static, Response>;
}

impl<F, Fut> Handler for F
where
    F: Fn(Container) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Response> + Send + 'static,
{
    fn call(&self, container: Container) -> BoxFuture<'static, Response> {
        Box::pin(self(container))
    }
}

/// Wraps a handler: may run code before and after it, or skip it.
pub trait Middleware: Send + Sync + 'static {
    fn handle(&self, container: Container, next: Next) -> BoxFuture<'static, Response>;
}

/// Middleware built from an async closure.
#[derive(Clone)]
pub struct FromFn<F>(F);

/// Create a middleware from `async fn(Container, Next) -> Response`.
pub fn from_fn<F, Fut>(f: F) -> FromFn<F>
where
    F: Fn(Container, Next) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Response> + Send + 'static,
{
    FromFn(f)
}

impl<F, Fut> Middleware for FromFn<F>
where
    F: Fn(Container, Next) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Response> + Send + 'static,
{
    fn handle(&self, container: Container, next: Next) -> BoxFuture<'static, Response> {
        Box::pin((self.0)(container, next))
    }
}

/// The remainder of a middleware chain.
#[derive(Clone)]
pub struct Next {
    middlewares: Arc<[Arc<dyn Middleware>]>,
    position: usize,
    handler: Arc<dyn Handler>,
}

impl Next {
    pub(crate) fn new(middlewares: Arc<[Arc<dyn Middleware>]>, handler: Arc<dyn Handler>) -> Self {
        Self {
            middlewares,
            position: 0,
            handler,
        }
    }

    /// Invoke the next middleware, or the handler once the chain is exhausted.
    pub async fn run(mut self, container: Container) -> Response {
        match self.middlewares.get(self.position).cloned() {
            Some(middleware) => {
                self.position += 1;
                middleware.handle(container, self).await
            }
            None => self.handler.call(container).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{HeaderValue, Request, StatusCode};
    use axum::response::IntoResponse;

    fn tagging(tag: &'static str) -> Arc<dyn Middleware> {
        Arc::new(from_fn(move |container: Container, next: Next| async move {
            let mut response = next.run(container).await;
            response
                .headers_mut()
                .append("x-trail", HeaderValue::from_static(tag));
            response
        }))
    }

    fn trail(response: &Response) -> Vec<&str> {
        response
            .headers()
            .get_all("x-trail")
            .iter()
            .map(|v| v.to_str().unwrap())
            .collect()
    }

    #[tokio::test]
    async fn test_chain_runs_in_order() {
        let handler: Arc<dyn Handler> = Arc::new(|_c: Container| async { "done".into_response() });
        let chain: Arc<[Arc<dyn Middleware>]> = Arc::from(vec![tagging("outer"), tagging("inner")]);

        let response = Next::new(chain, handler)
            .run(Container::new(Request::new(Body::empty())))
            .await;
        // Innermost appends first on the way out.
        assert_eq!(trail(&response), vec!["inner", "outer"]);
    }

    #[tokio::test]
    async fn test_middleware_can_short_circuit() {
        let handler: Arc<dyn Handler> = Arc::new(|_c: Container| async { "handler".into_response() });
        let deny: Arc<dyn Middleware> = Arc::new(from_fn(|_c: Container, _next: Next| async {
            StatusCode::FORBIDDEN.into_response()
        }));

        let response = Next::new(Arc::from(vec![deny]), handler)
            .run(Container::new(Request::new(Body::empty())))
            .await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
}
