//! Configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! - `STORAGE_MODE`: `in_memory` (default) | `postgres`
//! - `DATABASE_URL`: `PostgreSQL` connection URL (required when `STORAGE_MODE=postgres`)
//! - `DATABASE_MAX_CONNECTIONS`: pool size (default: 5)
//! - `HOST`: server host address (default: `0.0.0.0`)
//! - `PORT`: server port (default: `3000`)
//! - `LOG_FORMAT`: `text` (default) | `json`
//! - `WORKER_THREADS`: tokio worker threads, greater than zero (default: logical CPU count)
//! - `TASKBOARD_API_URL`: base URL used by the view client (default: `http://127.0.0.1:3000`)
//! - `TASKBOARD_API_TIMEOUT_MS`: view client request timeout (default: 10000)

use std::env;
use std::net::SocketAddr;
use std::num::NonZeroUsize;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

const DEFAULT_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_API_URL: &str = "http://127.0.0.1:3000";
const DEFAULT_API_TIMEOUT_MS: u64 = 10_000;

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur while reading configuration.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    /// Invalid storage mode value.
    #[error("Invalid storage mode: '{0}'. Expected 'in_memory' or 'postgres'")]
    InvalidStorageMode(String),

    /// Missing `DATABASE_URL` when storage mode is Postgres.
    #[error("DATABASE_URL environment variable is required when STORAGE_MODE=postgres")]
    MissingDatabaseUrl,

    /// A variable is set but cannot be parsed.
    #[error("Invalid value for {key}: '{value}'")]
    InvalidValue {
        /// Variable name.
        key: &'static str,
        /// Raw value.
        value: String,
    },

    /// Invalid log format value.
    #[error("Invalid log format: '{0}'. Expected 'text' or 'json'")]
    InvalidLogFormat(String),
}

/// Reads a variable, treating unset, empty and whitespace-only as absent.
fn read_var(key: &'static str) -> Result<Option<String>, ConfigurationError> {
    match env::var(key) {
        Ok(value) => {
            let trimmed = value.trim();
            Ok((!trimmed.is_empty()).then(|| trimmed.to_string()))
        }
        Err(env::VarError::NotPresent) => Ok(None),
        Err(env::VarError::NotUnicode(_)) => Err(ConfigurationError::InvalidValue {
            key,
            value: "<non-UTF-8 value>".to_string(),
        }),
    }
}

fn parse_value<T: FromStr>(key: &'static str, value: String) -> Result<T, ConfigurationError> {
    value
        .parse()
        .map_err(|_| ConfigurationError::InvalidValue { key, value })
}

fn parse_var<T: FromStr>(key: &'static str, default: T) -> Result<T, ConfigurationError> {
    read_var(key)?.map_or(Ok(default), |value| parse_value(key, value))
}

fn parse_optional_var<T: FromStr>(key: &'static str) -> Result<Option<T>, ConfigurationError> {
    read_var(key)?
        .map(|value| parse_value(key, value))
        .transpose()
}

// =============================================================================
// Storage Configuration
// =============================================================================

/// Storage backend for tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StorageMode {
    /// In-memory storage. Suitable for testing and development.
    #[default]
    InMemory,
    /// `PostgreSQL` storage for production use.
    Postgres,
}

impl FromStr for StorageMode {
    type Err = ConfigurationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_lowercase().as_str() {
            "in_memory" | "inmemory" | "memory" => Ok(Self::InMemory),
            "postgres" | "postgresql" | "pg" => Ok(Self::Postgres),
            _ => Err(ConfigurationError::InvalidStorageMode(value.to_string())),
        }
    }
}

/// Configuration for the repository factory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryConfig {
    /// Storage backend.
    pub storage_mode: StorageMode,
    /// `PostgreSQL` connection URL (required when `storage_mode` is `Postgres`).
    pub database_url: Option<String>,
    /// Maximum number of pooled connections.
    pub max_connections: u32,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            storage_mode: StorageMode::default(),
            database_url: None,
            max_connections: DEFAULT_MAX_CONNECTIONS,
        }
    }
}

impl RepositoryConfig {
    /// Creates a new configuration builder.
    pub fn builder() -> RepositoryConfigBuilder {
        RepositoryConfigBuilder::default()
    }

    /// Creates a configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError` if a value is invalid or `DATABASE_URL`
    /// is missing when `STORAGE_MODE=postgres`.
    pub fn from_env() -> Result<Self, ConfigurationError> {
        let storage_mode = read_var("STORAGE_MODE")?
            .map_or(Ok(StorageMode::default()), |value| value.parse())?;

        let config = Self {
            storage_mode,
            database_url: read_var("DATABASE_URL")?,
            max_connections: parse_var("DATABASE_MAX_CONNECTIONS", DEFAULT_MAX_CONNECTIONS)?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError::MissingDatabaseUrl` if Postgres is selected
    /// without a URL.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.storage_mode == StorageMode::Postgres && self.database_url.is_none() {
            return Err(ConfigurationError::MissingDatabaseUrl);
        }
        Ok(())
    }
}

/// Builder for `RepositoryConfig`.
#[derive(Debug, Clone, Default)]
pub struct RepositoryConfigBuilder {
    storage_mode: StorageMode,
    database_url: Option<String>,
    max_connections: Option<u32>,
}

impl RepositoryConfigBuilder {
    /// Sets the storage mode.
    #[must_use]
    pub const fn storage_mode(mut self, mode: StorageMode) -> Self {
        self.storage_mode = mode;
        self
    }

    /// Sets the `PostgreSQL` database URL.
    #[must_use]
    pub fn database_url(mut self, url: impl Into<String>) -> Self {
        self.database_url = Some(url.into());
        self
    }

    /// Sets the pool size.
    #[must_use]
    pub const fn max_connections(mut self, max_connections: u32) -> Self {
        self.max_connections = Some(max_connections);
        self
    }

    /// Builds the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError` if the configuration is invalid.
    pub fn build(self) -> Result<RepositoryConfig, ConfigurationError> {
        let config = RepositoryConfig {
            storage_mode: self.storage_mode,
            database_url: self.database_url,
            max_connections: self.max_connections.unwrap_or(DEFAULT_MAX_CONNECTIONS),
        };

        config.validate()?;
        Ok(config)
    }
}

// =============================================================================
// Server Configuration
// =============================================================================

/// Output format of the log subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per event.
    Json,
}

impl FromStr for LogFormat {
    type Err = ConfigurationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_lowercase().as_str() {
            "text" | "pretty" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(ConfigurationError::InvalidLogFormat(value.to_string())),
        }
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Bind host.
    pub host: String,
    /// Bind port.
    pub port: u16,
    /// Log output format.
    pub log_format: LogFormat,
    /// Tokio worker threads; `None` keeps the runtime default.
    pub worker_threads: Option<NonZeroUsize>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            log_format: LogFormat::default(),
            worker_threads: None,
        }
    }
}

impl ServerConfig {
    /// Creates a configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError::InvalidValue` if `PORT` is not a valid
    /// port number or `WORKER_THREADS` is not a positive integer, and
    /// `InvalidLogFormat` for an unknown `LOG_FORMAT`.
    pub fn from_env() -> Result<Self, ConfigurationError> {
        let defaults = Self::default();
        Ok(Self {
            host: read_var("HOST")?.unwrap_or(defaults.host),
            port: parse_var("PORT", defaults.port)?,
            log_format: read_var("LOG_FORMAT")?
                .map_or(Ok(defaults.log_format), |value| value.parse())?,
            worker_threads: parse_optional_var("WORKER_THREADS")?,
        })
    }

    /// Resolves the bind address.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError::InvalidValue` if `host:port` is not a
    /// socket address.
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigurationError> {
        let address = format!("{}:{}", self.host, self.port);
        address
            .parse()
            .map_err(|_| ConfigurationError::InvalidValue {
                key: "HOST",
                value: address,
            })
    }
}

// =============================================================================
// Client Configuration
// =============================================================================

/// Settings for the view's HTTP client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL of the task API, without a trailing slash.
    pub base_url: String,
    /// Per-request timeout; an expired request counts as a failure.
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            timeout: Duration::from_millis(DEFAULT_API_TIMEOUT_MS),
        }
    }
}

impl ClientConfig {
    /// Creates a configuration for the given base URL with the default timeout.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            ..Self::default()
        }
    }

    /// Replaces the request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Creates a configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError::InvalidValue` if the timeout is not a
    /// whole number of milliseconds.
    pub fn from_env() -> Result<Self, ConfigurationError> {
        let base_url =
            read_var("TASKBOARD_API_URL")?.unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let timeout_ms = parse_var("TASKBOARD_API_TIMEOUT_MS", DEFAULT_API_TIMEOUT_MS)?;
        Ok(Self::new(base_url).with_timeout(Duration::from_millis(timeout_ms)))
    }
}

// =============================================================================
// Tests
// =============================================================================
