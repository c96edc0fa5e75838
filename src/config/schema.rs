//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the service.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

use crate::endpoint::Command;

/// Root configuration for the snippets service.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Listener configuration (bind address, body limit).
    pub listener: ListenerConfig,

    /// Router behavior (error verbosity, path variable naming).
    pub router: RouterConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Datastore settings.
    pub storage: StorageConfig,

    /// Which entity endpoints are mounted and what they expose.
    pub resources: ResourcesConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Maximum accepted request body, in bytes.
    pub max_body_bytes: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            max_body_bytes: 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RouterConfig {
    /// Send error details to clients instead of canonical status text.
    pub debug: bool,

    /// Prefix of bound path variables (`:` binds `/:id` as `:id`).
    pub url_var_prefix: String,

    /// Serve only requests whose Host header equals this value.
    pub host: Option<String>,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            debug: false,
            url_var_prefix: ":".to_string(),
            host: None,
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Whole-request timeout in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log filter directive, used when RUST_LOG is unset.
    pub log_level: String,

    pub log_format: LogFormat,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Seed the datastore at startup.
    pub run_migrations: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self { run_migrations: true }
    }
}

/// One mounted entity endpoint.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ResourceConfig {
    pub enabled: bool,

    /// Exposed operations.
    pub commands: Vec<Command>,
}

impl Default for ResourceConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            commands: Command::ALL.to_vec(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ResourcesConfig {
    pub snippets: ResourceConfig,
    pub categories: ResourceConfig,
    pub roles: ResourceConfig,
    pub users: ResourceConfig,
}

impl Default for ResourcesConfig {
    fn default() -> Self {
        Self {
            snippets: ResourceConfig::default(),
            categories: ResourceConfig::default(),
            roles: ResourceConfig::default(),
            users: ResourceConfig {
                enabled: true,
                commands: vec![Command::Index, Command::Get],
            },
        }
    }
}

impl ResourcesConfig {
    /// `(name, config)` pairs in mount order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &ResourceConfig)> {
        [
            ("snippets", &self.snippets),
            ("categories", &self.categories),
            ("roles", &self.roles),
            ("users", &self.users),
        ]
        .into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert_eq!(config.listener.bind_address, "0.0.0.0:8080");
        assert_eq!(config.router.url_var_prefix, ":");
        assert_eq!(config.resources.users.commands, vec![Command::Index, Command::Get]);
        assert!(config.storage.run_migrations);
    }

    #[test]
    fn test_partial_sections() {
        let config: AppConfig = toml::from_str(
            r#"
            [router]
            debug = true

            [observability]
            log_format = "json"

            [resources.roles]
            commands = ["index", "get", "put"]
            "#,
        )
        .unwrap();
        assert!(config.router.debug);
        assert_eq!(config.router.url_var_prefix, ":");
        assert_eq!(config.observability.log_format, LogFormat::Json);
        assert!(config.resources.roles.enabled);
        assert_eq!(
            config.resources.roles.commands,
            vec![Command::Index, Command::Get, Command::Put]
        );
    }
}
