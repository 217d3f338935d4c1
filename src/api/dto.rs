//! Data Transfer Objects for API requests and responses.
//!
//! Request bodies arrive as untyped JSON so that each malformed shape maps
//! to its own message instead of a generic deserialization failure.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::application::{
    INVALID_BODY_MESSAGE, INVALID_PRIORITY_MESSAGE, INVALID_STATUS_MESSAGE, ServiceError,
    TITLE_REQUIRED_MESSAGE,
};
use crate::domain::{Priority, Task, TaskId, TaskPatch, TaskStatus, Timestamp, Title, TitleError};

// =============================================================================
// Request DTOs
// =============================================================================

/// Query parameters for `GET /tasks`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListTasksQuery {
    /// Raw status filter; validated by the service.
    #[serde(default)]
    pub status: Option<String>,
}

/// Parsed body of `POST /tasks`.
///
/// The title is kept raw; trimming and blank checks belong to the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateTaskRequest {
    /// Raw title.
    pub title: String,
    /// Requested priority, if any.
    pub priority: Option<Priority>,
}

impl CreateTaskRequest {
    /// Parses a create body.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::InvalidArgument` when `title` is absent or not a
    /// string, or when `priority` is present but not a known priority.
    pub fn from_json(body: &Value) -> Result<Self, ServiceError> {
        let title = body
            .get("title")
            .and_then(Value::as_str)
            .ok_or_else(|| ServiceError::invalid_argument(TITLE_REQUIRED_MESSAGE))?;

        let priority = optional_field(body.as_object(), "priority")
            .map(parse_priority)
            .transpose()?;

        Ok(Self {
            title: title.to_string(),
            priority,
        })
    }
}

/// Checks that a `PATCH /tasks/{id}` body is a JSON object.
///
/// Only the shape is checked here; field values are parsed by
/// [`parse_task_patch`] once the task is known to exist.
///
/// # Errors
///
/// Returns `ServiceError::InvalidArgument` when the body is not an object.
pub fn patch_fields(body: &Value) -> Result<&Map<String, Value>, ServiceError> {
    body.as_object()
        .ok_or_else(|| ServiceError::invalid_argument(INVALID_BODY_MESSAGE))
}

/// Parses the fields of a `PATCH /tasks/{id}` body into a [`TaskPatch`].
///
/// Absent and `null` fields leave the stored value untouched. Unknown fields
/// are ignored.
///
/// # Errors
///
/// Returns `ServiceError::InvalidArgument` when a present field has the wrong
/// type or value.
pub fn parse_task_patch(fields: &Map<String, Value>) -> Result<TaskPatch, ServiceError> {
    let mut patch = TaskPatch::new();

    if let Some(value) = optional_field(Some(fields), "title") {
        let title = value
            .as_str()
            .ok_or(TitleError)
            .and_then(Title::parse)
            .map_err(|_| ServiceError::invalid_argument(TITLE_REQUIRED_MESSAGE))?;
        patch = patch.title(title);
    }

    if let Some(value) = optional_field(Some(fields), "status") {
        let status = value
            .as_str()
            .and_then(|raw| raw.parse::<TaskStatus>().ok())
            .ok_or_else(|| ServiceError::invalid_argument(INVALID_STATUS_MESSAGE))?;
        patch = patch.status(status);
    }

    if let Some(value) = optional_field(Some(fields), "priority") {
        patch = patch.priority(parse_priority(value)?);
    }

    Ok(patch)
}

fn optional_field<'a>(object: Option<&'a Map<String, Value>>, key: &str) -> Option<&'a Value> {
    object?.get(key).filter(|value| !value.is_null())
}

fn parse_priority(value: &Value) -> Result<Priority, ServiceError> {
    value
        .as_str()
        .and_then(|raw| raw.parse().ok())
        .ok_or_else(|| ServiceError::invalid_argument(INVALID_PRIORITY_MESSAGE))
}

// =============================================================================
// Response DTOs
// =============================================================================

/// Response DTO for a task.
///
/// Also decoded by the view's HTTP client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskResponse {
    /// Task ID.
    pub id: TaskId,
    /// Title of the task.
    pub title: String,
    /// Current status.
    pub status: TaskStatus,
    /// Priority level.
    pub priority: Priority,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl From<&Task> for TaskResponse {
    fn from(task: &Task) -> Self {
        Self {
            id: task.id,
            title: task.title.as_str().to_string(),
            status: task.status,
            priority: task.priority,
            created_at: *task.created_at.as_datetime(),
        }
    }
}

impl From<Task> for TaskResponse {
    fn from(task: Task) -> Self {
        Self::from(&task)
    }
}

impl TryFrom<TaskResponse> for Task {
    type Error = TitleError;

    fn try_from(response: TaskResponse) -> Result<Self, Self::Error> {
        Ok(Self {
            id: response.id,
            title: Title::parse(&response.title)?,
            status: response.status,
            priority: response.priority,
            created_at: Timestamp::from_datetime(response.created_at),
        })
    }
}

/// Health check response.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Service status.
    pub status: &'static str,
    /// Service version.
    pub version: &'static str,
}

// =============================================================================
// Tests
// =============================================================================
