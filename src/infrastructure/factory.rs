//! Repository factory for runtime backend selection.
//!
//! Creates the task store named by [`RepositoryConfig`]: in-memory for
//! development and tests, `PostgreSQL` for production.
//!
//! # Example
//!
//! ```ignore
//! let factory = RepositoryFactory::from_env()?;
//! let store = factory.create().await?;
//! ```

use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use super::{
    ConfigurationError, InMemoryTaskStore, PostgresTaskStore, RepositoryConfig, StorageMode,
    StoreError, TaskStore,
};

/// Errors that can occur during factory initialization.
#[derive(Debug, Error)]
pub enum FactoryError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    /// Database connection error.
    #[error("Database connection error: {0}")]
    DatabaseConnection(String),

    /// Schema creation failed.
    #[error("Schema migration error: {0}")]
    Migration(#[from] StoreError),
}

/// Factory for creating the task store based on configuration.
#[derive(Debug, Clone)]
pub struct RepositoryFactory {
    config: RepositoryConfig,
}

impl RepositoryFactory {
    /// Creates a new repository factory with the given configuration.
    #[must_use]
    pub const fn new(config: RepositoryConfig) -> Self {
        Self { config }
    }

    /// Creates a new repository factory from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `FactoryError::Configuration` if environment configuration is invalid.
    pub fn from_env() -> Result<Self, FactoryError> {
        let config = RepositoryConfig::from_env()?;
        Ok(Self::new(config))
    }

    /// Returns the configuration used by this factory.
    #[must_use]
    pub const fn config(&self) -> &RepositoryConfig {
        &self.config
    }

    /// Creates the task store.
    ///
    /// For `PostgreSQL` this connects the pool and creates the schema.
    ///
    /// # Errors
    ///
    /// Returns `FactoryError` if the database connection or migration fails.
    pub async fn create(&self) -> Result<Arc<dyn TaskStore>, FactoryError> {
        match self.config.storage_mode {
            StorageMode::InMemory => {
                tracing::info!("Using in-memory task store");
                Ok(Arc::new(InMemoryTaskStore::new()))
            }
            StorageMode::Postgres => {
                let store = PostgresTaskStore::new(self.create_postgres_pool().await?);
                store.migrate().await?;
                tracing::info!(
                    max_connections = self.config.max_connections,
                    "Using PostgreSQL task store"
                );
                Ok(Arc::new(store))
            }
        }
    }

    async fn create_postgres_pool(&self) -> Result<sqlx::PgPool, FactoryError> {
        let database_url = self
            .config
            .database_url
            .as_ref()
            .ok_or(ConfigurationError::MissingDatabaseUrl)?;

        PgPoolOptions::new()
            .max_connections(self.config.max_connections)
            .connect(database_url)
            .await
            .map_err(|error| FactoryError::DatabaseConnection(error.to_string()))
    }
}

// =============================================================================
// Tests
// =============================================================================
