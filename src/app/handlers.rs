//! Plain application routes and the request logging middleware.

use std::time::Instant;

use axum::response::{IntoResponse, Response};

use crate::routing::{Container, Next};

pub async fn index(_container: Container) -> Response {
    "Hello Smart Snippets".into_response()
}

pub async fn warmup(container: Container) -> Response {
    tracing::info!(parent: container.logger(), "warmup done");
    "".into_response()
}

/// Greets the `:name` path variable.
pub async fn hello(container: Container) -> Response {
    let name = container.route_var("name").unwrap_or_default();
    format!("Hello {}", name).into_response()
}

/// Logs every request that reached a route, with status and latency.
pub async fn log_requests(container: Container, next: Next) -> Response {
    let span = container.logger().clone();
    let started = Instant::now();
    let response = next.run(container).await;
    tracing::info!(
        parent: &span,
        status = response.status().as_u16(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "request handled"
    );
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::Router;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};

    #[tokio::test]
    async fn test_hello_uses_path_variable() {
        let mut router = Router::new();
        router.get("/hello/:name", hello);
        let response = router
            .compile()
            .dispatch(Request::builder().uri("/hello/World").body(Body::empty()).unwrap())
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"Hello World");
    }

    #[tokio::test]
    async fn test_hello_decodes_path_variable() {
        let mut router = Router::new();
        router.get("/hello/:name", hello);
        let response = router
            .compile()
            .dispatch(Request::builder().uri("/hello/John%20Doe").body(Body::empty()).unwrap())
            .await;
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"Hello John Doe");
    }
}
