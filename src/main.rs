//! Smart Snippets service.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ───────────────▶ http::server (axum, request id, trace, timeout)
//!                          │
//!                          ▼
//!                      routing::CompiledRouter
//!                          │  Container per request
//!                          │  first matching Route, its middleware chain
//!                          ▼
//!                      endpoint::EntityEndpoint ──▶ events::Signal (lifecycle hooks)
//!                          │
//!                          ▼
//!                      repository ──▶ storage::Datastore
//!
//!     Cross-cutting: config, observability, lifecycle
//! ```
//!
//! # Startup
//! Config → logging → metrics → datastore + migrations → bind → serve until a
//! termination signal arrives.

use std::path::PathBuf;

use clap::Parser;

use smart_snippets::config::{load_config, AppConfig};
use smart_snippets::lifecycle::signals::spawn_signal_watcher;
use smart_snippets::lifecycle::startup::{bind_listener, prepare_store};
use smart_snippets::lifecycle::Shutdown;
use smart_snippets::observability::{init_logging, init_metrics};
use smart_snippets::HttpServer;

#[derive(Parser)]
#[command(name = "smart-snippets")]
#[command(about = "REST service for code snippets", long_about = None)]
struct Args {
    /// Path to a TOML config file. Built-in defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => AppConfig::default(),
    };

    init_logging(&config.observability)?;

    tracing::info!("smart-snippets v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        debug = config.router.debug,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        let addr = config.observability.metrics_address.parse()?;
        init_metrics(addr)?;
    }

    let store = prepare_store(&config)?;
    let listener = bind_listener(&config).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let shutdown_rx = shutdown.subscribe();
    spawn_signal_watcher(shutdown);

    let server = HttpServer::new(config, store);
    server.run(listener, shutdown_rx).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
