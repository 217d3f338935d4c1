//! Task store trait.
//!
//! The store is the persistence collaborator of the task service. Every
//! method is a single atomic operation against the backing store; callers
//! never hold a transaction across two calls.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{NewTask, StatusCount, Task, TaskId, TaskPatch, TaskStatus};

// =============================================================================
// Store Error
// =============================================================================

/// Errors that can occur during store operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The addressed record does not exist.
    #[error("Entity not found: {0}")]
    NotFound(String),

    /// The store rejected a value (check constraint, enum domain).
    #[error("Constraint violation: {0}")]
    Constraint(String),

    /// Connection or query failure.
    #[error("Database error: {0}")]
    DatabaseError(String),

    /// A stored row could not be mapped back into a task.
    #[error("Corrupt record: {0}")]
    CorruptRecord(String),
}

// =============================================================================
// Task Store
// =============================================================================

/// Repository-style access to persisted tasks.
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Persists a new task. The store assigns the id and creation timestamp.
    async fn insert(&self, task: NewTask) -> Result<Task, StoreError>;

    /// Finds a task by its id.
    ///
    /// Returns `Ok(None)` if no such task exists.
    async fn find_by_id(&self, id: &TaskId) -> Result<Option<Task>, StoreError>;

    /// Lists tasks, optionally restricted to one status, newest first.
    async fn list(&self, status: Option<TaskStatus>) -> Result<Vec<Task>, StoreError>;

    /// Applies a partial update and returns the full updated record.
    ///
    /// Returns `StoreError::NotFound` if the task vanished.
    async fn update(&self, id: &TaskId, patch: &TaskPatch) -> Result<Task, StoreError>;

    /// Deletes a task.
    ///
    /// Returns `Ok(true)` if the task was deleted, `Ok(false)` if it didn't exist.
    async fn delete(&self, id: &TaskId) -> Result<bool, StoreError>;

    /// Counts tasks grouped by status. Statuses with no tasks may be omitted.
    async fn count_by_status(&self) -> Result<Vec<StatusCount>, StoreError>;
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn test_store_error_display() {
        let error = StoreError::NotFound("task-123".to_string());
        assert_eq!(format!("{error}"), "Entity not found: task-123");

        let error = StoreError::Constraint("tasks_status_check".to_string());
        assert_eq!(format!("{error}"), "Constraint violation: tasks_status_check");

        let error = StoreError::DatabaseError("connection refused".to_string());
        assert_eq!(format!("{error}"), "Database error: connection refused");
    }
}
