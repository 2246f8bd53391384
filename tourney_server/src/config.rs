//! Server configuration management.
//!
//! Consolidates all environment variable reads and provides validated configuration.

use std::net::SocketAddr;
use std::str::FromStr;
use tourney::{DatabaseConfig, EngineConfig};

/// Default HTTP bind address
pub const DEFAULT_BIND: &str = "127.0.0.1:6969";

/// Where brackets are stored
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    /// Process memory; everything is lost on exit
    Memory,
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StoreBackend::Postgres),
            "memory" => Ok(StoreBackend::Memory),
            other => Err(format!("unknown store backend: {other}")),
        }
    }
}

/// Complete server configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Server bind address
    pub bind: SocketAddr,
    /// Prometheus exporter address; disabled when absent
    pub metrics_bind: Option<SocketAddr>,
    /// Store backend
    pub store: StoreBackend,
    /// Database configuration
    pub database: DatabaseConfig,
    /// Retry and timeout tuning for bracket operations
    pub engine: EngineConfig,
}

/// Values given on the command line, taking precedence over the environment
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub bind: Option<SocketAddr>,
    pub database_url: Option<String>,
    pub metrics_bind: Option<SocketAddr>,
    pub memory_store: bool,
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns error if required variables are missing or invalid
    pub fn from_env(overrides: CliOverrides) -> Result<Self, ConfigError> {
        Self::from_lookup(overrides, |key| std::env::var(key).ok())
    }

    /// Load configuration from an explicit variable source
    ///
    /// Environment variables:
    /// - `SERVER_BIND`: HTTP bind address (default: 127.0.0.1:6969)
    /// - `METRICS_BIND`: Prometheus exporter address (default: disabled)
    /// - `BRACKET_STORE`: `postgres` (default) or `memory`
    /// - `DATABASE_URL`: required for the postgres store
    /// - `DB_*`: pool tuning, see [`DatabaseConfig::from_env`]
    /// - `BRACKET_MAX_ATTEMPTS`, `BRACKET_TX_TIMEOUT_SECS`: engine tuning
    pub fn from_lookup<F>(overrides: CliOverrides, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let bind = match overrides.bind {
            Some(bind) => bind,
            None => parse_var(&lookup, "SERVER_BIND")?.unwrap_or(default_bind()?),
        };

        let metrics_bind = match overrides.metrics_bind {
            Some(addr) => Some(addr),
            None => parse_var(&lookup, "METRICS_BIND")?,
        };

        let store = if overrides.memory_store {
            StoreBackend::Memory
        } else {
            parse_var(&lookup, "BRACKET_STORE")?.unwrap_or(StoreBackend::Postgres)
        };

        let database_url = overrides
            .database_url
            .clone()
            .or_else(|| lookup("DATABASE_URL"));
        if store == StoreBackend::Postgres && database_url.is_none() {
            return Err(ConfigError::MissingRequired {
                var: "DATABASE_URL".to_string(),
                hint: "Pass --db-url, set DATABASE_URL, or use --memory".to_string(),
            });
        }

        let mut database = DatabaseConfig::from_lookup(&lookup);
        if let Some(url) = database_url {
            database.database_url = url;
        }

        let engine = EngineConfig::from_lookup(&lookup);

        Ok(ServerConfig {
            bind,
            metrics_bind,
            store,
            database,
            engine,
        })
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database.max_connections == 0 {
            return Err(ConfigError::Invalid {
                var: "DB_MAX_CONNECTIONS".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        if self.database.min_connections > self.database.max_connections {
            return Err(ConfigError::Invalid {
                var: "DB_MIN_CONNECTIONS".to_string(),
                reason: format!(
                    "Cannot exceed max connections ({})",
                    self.database.max_connections
                ),
            });
        }

        if self.engine.max_attempts == 0 {
            return Err(ConfigError::Invalid {
                var: "BRACKET_MAX_ATTEMPTS".to_string(),
                reason: "Must be at least 1".to_string(),
            });
        }

        if self.engine.transaction_timeout.is_zero() {
            return Err(ConfigError::Invalid {
                var: "BRACKET_TX_TIMEOUT_SECS".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        if self.metrics_bind == Some(self.bind) {
            return Err(ConfigError::Invalid {
                var: "METRICS_BIND".to_string(),
                reason: format!("Must differ from the server bind address ({})", self.bind),
            });
        }

        Ok(())
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {var}\nHint: {hint}")]
    MissingRequired { var: String, hint: String },

    #[error("Invalid configuration for {var}: {reason}")]
    Invalid { var: String, reason: String },
}

fn default_bind() -> Result<SocketAddr, ConfigError> {
    DEFAULT_BIND.parse().map_err(|_| ConfigError::Invalid {
        var: "SERVER_BIND".to_string(),
        reason: format!("Default {DEFAULT_BIND} is not a socket address"),
    })
}

/// Helper to parse an optional variable, rejecting values that don't parse
fn parse_var<F, T>(lookup: &F, key: &str) -> Result<Option<T>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) => raw.parse().map(Some).map_err(|_| ConfigError::Invalid {
            var: key.to_string(),
            reason: format!("Cannot parse {raw:?}"),
        }),
        None => Ok(None),
    }
}
