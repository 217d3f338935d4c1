//! `PostgreSQL` task store.
//!
//! Uses `sqlx` with a connection pool. Every trait method is a single SQL
//! statement, so atomicity comes from the database itself.
//!
//! # Table Schema
//!
//! ```sql
//! CREATE TABLE tasks (
//!     id UUID PRIMARY KEY,
//!     title TEXT NOT NULL CHECK (btrim(title) <> ''),
//!     status TEXT NOT NULL DEFAULT 'TODO' CHECK (status IN ('TODO', 'DOING', 'DONE')),
//!     priority TEXT NOT NULL DEFAULT 'LOW' CHECK (priority IN ('LOW', 'MEDIUM', 'HIGH')),
//!     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
//! );
//! CREATE INDEX idx_tasks_created_at ON tasks(created_at DESC);
//! ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::{
    NewTask, Priority, StatusCount, Task, TaskId, TaskPatch, TaskStatus, Timestamp, Title,
};
use crate::infrastructure::{StoreError, TaskStore};

const SCHEMA: [&str; 2] = [
    "CREATE TABLE IF NOT EXISTS tasks (
        id UUID PRIMARY KEY,
        title TEXT NOT NULL CHECK (btrim(title) <> ''),
        status TEXT NOT NULL DEFAULT 'TODO' CHECK (status IN ('TODO', 'DOING', 'DONE')),
        priority TEXT NOT NULL DEFAULT 'LOW' CHECK (priority IN ('LOW', 'MEDIUM', 'HIGH')),
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )",
    "CREATE INDEX IF NOT EXISTS idx_tasks_created_at ON tasks(created_at DESC)",
];

const TASK_COLUMNS: &str = "id, title, status, priority, created_at";

/// SQLSTATE for `check_violation`.
const CHECK_VIOLATION: &str = "23514";

// =============================================================================
// Row Mapping
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct TaskRow {
    id: Uuid,
    title: String,
    status: String,
    priority: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<TaskRow> for Task {
    type Error = StoreError;

    fn try_from(row: TaskRow) -> Result<Self, Self::Error> {
        let title =
            Title::parse(&row.title).map_err(|error| StoreError::CorruptRecord(error.to_string()))?;
        let status: TaskStatus = row
            .status
            .parse()
            .map_err(|error: crate::domain::ParseStatusError| {
                StoreError::CorruptRecord(error.to_string())
            })?;
        let priority: Priority = row
            .priority
            .parse()
            .map_err(|error: crate::domain::ParsePriorityError| {
                StoreError::CorruptRecord(error.to_string())
            })?;

        Ok(Self::new(
            TaskId::from_uuid(row.id),
            title,
            Timestamp::from_datetime(row.created_at),
        )
        .with_status(status)
        .with_priority(priority))
    }
}

#[derive(Debug, sqlx::FromRow)]
struct StatusCountRow {
    status: String,
    count: i64,
}

/// Maps `sqlx` errors, separating constraint violations from other failures.
fn map_database_error(error: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(database_error) = &error
        && database_error.code().as_deref() == Some(CHECK_VIOLATION)
    {
        return StoreError::Constraint(
            database_error
                .constraint()
                .unwrap_or("check constraint")
                .to_string(),
        );
    }
    StoreError::DatabaseError(error.to_string())
}

// =============================================================================
// PostgreSQL Task Store
// =============================================================================

/// `PostgreSQL` implementation of [`TaskStore`].
///
/// # Example
///
/// ```ignore
/// let pool = PgPool::connect("postgres://localhost/tasks").await?;
/// let store = PostgresTaskStore::new(pool);
/// store.migrate().await?;
/// ```
#[derive(Debug, Clone)]
pub struct PostgresTaskStore {
    pool: PgPool,
}

impl PostgresTaskStore {
    /// Creates a new store with the given connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Returns the underlying connection pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Creates the `tasks` table and its index if they do not exist.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::DatabaseError` if a DDL statement fails.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(map_database_error)?;
        }
        tracing::info!("Task schema ready");
        Ok(())
    }
}

#[async_trait]
impl TaskStore for PostgresTaskStore {
    async fn insert(&self, task: NewTask) -> Result<Task, StoreError> {
        let id = TaskId::generate();
        let row: TaskRow = sqlx::query_as(&format!(
            "INSERT INTO tasks (id, title, priority) VALUES ($1, $2, $3) RETURNING {TASK_COLUMNS}"
        ))
        .bind(id.as_uuid())
        .bind(task.title.as_str())
        .bind(task.priority.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(map_database_error)?;

        Task::try_from(row)
    }

    async fn find_by_id(&self, id: &TaskId) -> Result<Option<Task>, StoreError> {
        let row: Option<TaskRow> =
            sqlx::query_as(&format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = $1"))
                .bind(id.as_uuid())
                .fetch_optional(&self.pool)
                .await
                .map_err(map_database_error)?;

        row.map(Task::try_from).transpose()
    }

    async fn list(&self, status: Option<TaskStatus>) -> Result<Vec<Task>, StoreError> {
        let rows: Vec<TaskRow> = sqlx::query_as(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks \
             WHERE ($1::TEXT IS NULL OR status = $1) \
             ORDER BY created_at DESC, id DESC"
        ))
        .bind(status.map(TaskStatus::as_str))
        .fetch_all(&self.pool)
        .await
        .map_err(map_database_error)?;

        rows.into_iter().map(Task::try_from).collect()
    }

    async fn update(&self, id: &TaskId, patch: &TaskPatch) -> Result<Task, StoreError> {
        let row: Option<TaskRow> = sqlx::query_as(&format!(
            "UPDATE tasks SET \
                 title = COALESCE($2, title), \
                 status = COALESCE($3, status), \
                 priority = COALESCE($4, priority) \
             WHERE id = $1 \
             RETURNING {TASK_COLUMNS}"
        ))
        .bind(id.as_uuid())
        .bind(patch.title.as_ref().map(Title::as_str))
        .bind(patch.status.map(TaskStatus::as_str))
        .bind(patch.priority.map(Priority::as_str))
        .fetch_optional(&self.pool)
        .await
        .map_err(map_database_error)?;

        row.ok_or_else(|| StoreError::NotFound(id.to_string()))
            .and_then(Task::try_from)
    }

    async fn delete(&self, id: &TaskId) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(map_database_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn count_by_status(&self) -> Result<Vec<StatusCount>, StoreError> {
        let rows: Vec<StatusCountRow> =
            sqlx::query_as("SELECT status, COUNT(*) AS count FROM tasks GROUP BY status")
                .fetch_all(&self.pool)
                .await
                .map_err(map_database_error)?;

        rows.into_iter()
            .map(|row| {
                let status: TaskStatus = row
                    .status
                    .parse()
                    .map_err(|error: crate::domain::ParseStatusError| {
                        StoreError::CorruptRecord(error.to_string())
                    })?;
                let count = u64::try_from(row.count)
                    .map_err(|error| StoreError::CorruptRecord(error.to_string()))?;
                Ok(StatusCount::new(status, count))
            })
            .collect()
    }
}

// =============================================================================
// Tests
// =============================================================================
