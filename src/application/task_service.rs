//! Task service.
//!
//! Validates requests and maps them onto single store operations. Every
//! validation happens before the store is touched; lookups for update and
//! delete happen before the mutation.

use std::sync::Arc;

use thiserror::Error;

use crate::domain::{NewTask, Priority, Stats, Task, TaskId, TaskPatch, TaskStatus, Title};
use crate::infrastructure::{StoreError, TaskStore};

/// Message for a list filter outside the status enumeration.
pub const INVALID_STATUS_MESSAGE: &str = "Invalid Status. Usage: TODO, DOING or DONE.";
/// Message for a missing, non-string, or blank title.
pub const TITLE_REQUIRED_MESSAGE: &str = "The field 'title' is required.";
/// Message for a priority outside the priority enumeration.
pub const INVALID_PRIORITY_MESSAGE: &str = "Invalid Priority. Usage: LOW, MEDIUM or HIGH.";
/// Message for an update body that is absent or not an object.
pub const INVALID_BODY_MESSAGE: &str = "Invalid body.";
/// Message for an unknown task id.
pub const NOT_FOUND_MESSAGE: &str = "Task not found.";

// =============================================================================
// Service Error
// =============================================================================

/// Store phase in which an unexpected failure happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorePhase {
    /// Reading (list, lookup, aggregation).
    Lookup,
    /// Writing (insert, update, delete).
    Mutation,
}

impl std::fmt::Display for StorePhase {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Lookup => formatter.write_str("lookup"),
            Self::Mutation => formatter.write_str("mutation"),
        }
    }
}

/// Errors surfaced by [`TaskService`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ServiceError {
    /// Malformed or missing input, or a value the store rejected.
    #[error("{0}")]
    InvalidArgument(String),

    /// The addressed task does not exist.
    #[error("{0}")]
    NotFound(String),

    /// Unexpected store failure.
    #[error("store {phase} failed: {source}")]
    Internal {
        /// Where the failure happened.
        phase: StorePhase,
        /// Underlying store error.
        source: StoreError,
    },
}

impl ServiceError {
    /// Creates an `InvalidArgument` error.
    #[must_use]
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    /// Creates the standard `NotFound` error.
    #[must_use]
    pub fn not_found() -> Self {
        Self::NotFound(NOT_FOUND_MESSAGE.to_string())
    }

    fn from_store(phase: StorePhase, error: StoreError) -> Self {
        match error {
            StoreError::NotFound(_) => Self::not_found(),
            StoreError::Constraint(constraint) => {
                Self::InvalidArgument(format!("Value rejected by store: {constraint}"))
            }
            source @ (StoreError::DatabaseError(_) | StoreError::CorruptRecord(_)) => {
                Self::Internal { phase, source }
            }
        }
    }

    fn lookup(error: StoreError) -> Self {
        Self::from_store(StorePhase::Lookup, error)
    }

    fn mutation(error: StoreError) -> Self {
        Self::from_store(StorePhase::Mutation, error)
    }
}

/// Parses the optional `status` list filter.
///
/// An empty value means "no filter".
///
/// # Errors
///
/// Returns `ServiceError::InvalidArgument` for any other value outside
/// `TODO`, `DOING`, `DONE`.
pub fn parse_status_filter(raw: Option<&str>) -> Result<Option<TaskStatus>, ServiceError> {
    match raw {
        None | Some("") => Ok(None),
        Some(value) => value
            .parse()
            .map(Some)
            .map_err(|_| ServiceError::invalid_argument(INVALID_STATUS_MESSAGE)),
    }
}

// =============================================================================
// Task Service
// =============================================================================

/// Implements the task endpoint contracts on top of a [`TaskStore`].
#[derive(Clone)]
pub struct TaskService {
    store: Arc<dyn TaskStore>,
}

impl std::fmt::Debug for TaskService {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("TaskService")
            .field("store", &"Arc<dyn TaskStore>")
            .finish()
    }
}

impl TaskService {
    /// Creates a service over the given store.
    #[must_use]
    pub fn new(store: Arc<dyn TaskStore>) -> Self {
        Self { store }
    }

    /// Lists tasks newest first, optionally filtered by a raw status value.
    ///
    /// # Errors
    ///
    /// - `InvalidArgument` if `status` is not a known status
    /// - `Internal` if the store fails
    pub async fn list(&self, status: Option<&str>) -> Result<Vec<Task>, ServiceError> {
        let status = parse_status_filter(status)?;
        self.store.list(status).await.map_err(ServiceError::lookup)
    }

    /// Creates a task from a raw title and optional priority.
    ///
    /// The title is trimmed; priority defaults to `LOW`.
    ///
    /// # Errors
    ///
    /// - `InvalidArgument` if the title is blank
    /// - `Internal` if the store fails
    pub async fn create(
        &self,
        title: &str,
        priority: Option<Priority>,
    ) -> Result<Task, ServiceError> {
        let title = Title::parse(title)
            .map_err(|_| ServiceError::invalid_argument(TITLE_REQUIRED_MESSAGE))?;
        let new_task = NewTask::new(title).with_priority(priority.unwrap_or_default());

        let task = self
            .store
            .insert(new_task)
            .await
            .map_err(ServiceError::mutation)?;

        tracing::info!(task_id = %task.id, priority = %task.priority, "Task created");
        Ok(task)
    }

    /// Looks up a task that is about to be mutated.
    ///
    /// # Errors
    ///
    /// - `NotFound` if no task has this id
    /// - `Internal` if the store fails
    pub async fn get_for_mutation(&self, id: &TaskId) -> Result<Task, ServiceError> {
        self.store
            .find_by_id(id)
            .await
            .map_err(ServiceError::lookup)?
            .ok_or_else(ServiceError::not_found)
    }

    /// Applies a partial update and returns the full updated task.
    ///
    /// # Errors
    ///
    /// - `NotFound` if no task has this id (checked before mutating)
    /// - `InvalidArgument` if the store rejects a value
    /// - `Internal` if the store fails
    pub async fn update(&self, id: &TaskId, patch: &TaskPatch) -> Result<Task, ServiceError> {
        let existing = self.get_for_mutation(id).await?;

        let updated = self
            .store
            .update(id, patch)
            .await
            .map_err(ServiceError::mutation)?;

        if existing.status != updated.status {
            tracing::info!(
                task_id = %id,
                from = %existing.status,
                to = %updated.status,
                "Task status changed"
            );
        } else {
            tracing::debug!(task_id = %id, "Task updated");
        }
        Ok(updated)
    }

    /// Deletes a task.
    ///
    /// # Errors
    ///
    /// - `NotFound` if no task has this id (checked before mutating)
    /// - `Internal` if the store fails
    pub async fn delete(&self, id: &TaskId) -> Result<(), ServiceError> {
        self.get_for_mutation(id).await?;

        let deleted = self.store.delete(id).await.map_err(ServiceError::mutation)?;
        if !deleted {
            // Removed concurrently between lookup and delete.
            return Err(ServiceError::not_found());
        }

        tracing::info!(task_id = %id, "Task deleted");
        Ok(())
    }

    /// Computes completion statistics from the store's grouped counts.
    ///
    /// # Errors
    ///
    /// Returns `Internal` if the store fails.
    pub async fn stats(&self) -> Result<Stats, ServiceError> {
        let groups = self
            .store
            .count_by_status()
            .await
            .map_err(ServiceError::lookup)?;
        Ok(Stats::from_counts(&groups))
    }
}

// =============================================================================
// Tests
// =============================================================================
