//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{HeaderMap, Method, Request, StatusCode};
use serde_json::Value;
use tower::ServiceExt;

use smart_snippets::config::AppConfig;
use smart_snippets::lifecycle::startup::prepare_store;
use smart_snippets::lifecycle::Shutdown;
use smart_snippets::storage::Datastore;
use smart_snippets::HttpServer;

/// Default config with every command enabled on every resource.
pub fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.router.debug = true;
    config.resources.users.commands = smart_snippets::endpoint::Command::ALL.to_vec();
    config
}

/// Build the fully layered service over a migrated in-memory store.
pub fn app(config: AppConfig) -> (axum::Router, Arc<dyn Datastore>) {
    let store = prepare_store(&config).unwrap();
    let server = HttpServer::new(config, store.clone());
    (server.router(), store)
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl TestResponse {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap()
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn location(&self) -> &str {
        self.headers
            .get("location")
            .and_then(|v| v.to_str().ok())
            .unwrap()
    }
}

/// Send one request through the router without a socket.
pub async fn send(router: &axum::Router, method: Method, uri: &str, body: Option<Value>) -> TestResponse {
    let body = match body {
        Some(json) => Body::from(serde_json::to_vec(&json).unwrap()),
        None => Body::empty(),
    };
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(body)
        .unwrap();
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec();
    TestResponse { status, headers, body }
}

/// Send a raw (possibly malformed) body.
pub async fn send_raw(router: &axum::Router, method: Method, uri: &str, body: &'static str) -> TestResponse {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::from(body))
        .unwrap();
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec();
    TestResponse { status, headers, body }
}

/// Start the service on an ephemeral port.
pub async fn start_server(config: AppConfig) -> (SocketAddr, Shutdown) {
    let store = prepare_store(&config).unwrap();
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config, store);
    let rx = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, rx).await;
    });
    (addr, shutdown)
}
