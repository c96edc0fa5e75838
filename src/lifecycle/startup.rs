//! Startup orchestration.
//!
//! # Responsibilities
//! - Build the datastore
//! - Run pending migrations when enabled
//! - Bind the listener last (traffic only when ready)
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Subsystems initialize in order, not concurrently

use std::sync::Arc;

use thiserror::Error;
use tokio::net::TcpListener;

use crate::app::migrations::{migrations, run_migrations};
use crate::config::AppConfig;
use crate::repository::RepositoryError;
use crate::storage::{Datastore, MemoryDatastore};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("migration failed: {0}")]
    Migration(#[from] RepositoryError),

    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },
}

/// Create the datastore and bring its data up to date.
pub fn prepare_store(config: &AppConfig) -> Result<Arc<dyn Datastore>, StartupError> {
    let store: Arc<dyn Datastore> = Arc::new(MemoryDatastore::new());
    if config.storage.run_migrations {
        let applied = run_migrations(&store, &migrations())?;
        tracing::info!(applied, "migrations done");
    }
    Ok(store)
}

pub async fn bind_listener(config: &AppConfig) -> Result<TcpListener, StartupError> {
    let address = &config.listener.bind_address;
    TcpListener::bind(address)
        .await
        .map_err(|source| StartupError::Bind {
            address: address.clone(),
            source,
        })
}
