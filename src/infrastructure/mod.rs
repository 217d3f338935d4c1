//! Infrastructure module for external services.
//!
//! This module contains the task store trait, its in-memory and `PostgreSQL`
//! implementations, environment configuration, and the backend factory.

pub mod config;
pub mod factory;
pub mod in_memory;
pub mod postgres;
pub mod repository;

pub use config::{
    ClientConfig, ConfigurationError, LogFormat, RepositoryConfig, RepositoryConfigBuilder,
    ServerConfig, StorageMode,
};
pub use factory::{FactoryError, RepositoryFactory};
pub use in_memory::InMemoryTaskStore;
pub use postgres::PostgresTaskStore;
pub use repository::{StoreError, TaskStore};
