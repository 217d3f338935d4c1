//! HTTP handlers for the task endpoints.
//!
//! Handlers only translate between HTTP and [`TaskService`]: they decode
//! path, query and body, call the service and encode the result.
//! Every failure leaves through [`ApiErrorResponse`].

use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
};
use serde_json::Value;

use super::dto::{
    CreateTaskRequest, HealthResponse, ListTasksQuery, TaskResponse, parse_task_patch,
    patch_fields,
};
use super::error::ApiErrorResponse;
use crate::application::{
    INVALID_BODY_MESSAGE, INVALID_STATUS_MESSAGE, NOT_FOUND_MESSAGE, TITLE_REQUIRED_MESSAGE,
    TaskService,
};
use crate::domain::{Stats, TaskId};

// =============================================================================
// Application State
// =============================================================================

/// Shared application dependencies.
#[derive(Clone, Debug)]
pub struct AppState {
    /// Task operations.
    pub service: TaskService,
}

impl AppState {
    /// Creates a new `AppState` around a service.
    #[must_use]
    pub const fn new(service: TaskService) -> Self {
        Self { service }
    }
}

/// Unparsable ids cannot name an existing task.
fn parse_task_id(raw: &str) -> Result<TaskId, ApiErrorResponse> {
    raw.parse()
        .map_err(|_| ApiErrorResponse::not_found(NOT_FOUND_MESSAGE))
}

/// Unwraps a JSON body, answering 400 with `message` when it cannot be read.
fn json_body(
    body: Result<Json<Value>, JsonRejection>,
    message: &str,
) -> Result<Value, ApiErrorResponse> {
    body.map(|Json(value)| value).map_err(|rejection| {
        tracing::debug!(error = %rejection, "Rejected request body");
        ApiErrorResponse::bad_request(message)
    })
}

// =============================================================================
// Handlers
// =============================================================================

/// Lists tasks, newest first.
///
/// `GET /tasks?status=TODO|DOING|DONE`. An empty `status` means no filter.
///
/// # Errors
///
/// - 400 if `status` is not a known status or the query cannot be read
/// - 500 on store failure
pub async fn list_tasks(
    State(state): State<AppState>,
    query: Result<Query<ListTasksQuery>, QueryRejection>,
) -> Result<Json<Vec<TaskResponse>>, ApiErrorResponse> {
    let Query(query) = query.map_err(|rejection| {
        tracing::debug!(error = %rejection, "Rejected query string");
        ApiErrorResponse::bad_request(INVALID_STATUS_MESSAGE)
    })?;
    let tasks = state.service.list(query.status.as_deref()).await?;
    Ok(Json(tasks.iter().map(TaskResponse::from).collect()))
}

/// Creates a task.
///
/// `POST /tasks` with `{"title": "...", "priority": "LOW|MEDIUM|HIGH"}`.
///
/// # Response
///
/// - **201 Created**: the created task
/// - **400 Bad Request**: missing or blank title, unknown priority, or a
///   body that is not JSON (reported as a missing title)
///
/// # Errors
///
/// Returns [`ApiErrorResponse`] on validation or store failure.
pub async fn create_task(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<TaskResponse>), ApiErrorResponse> {
    let request = CreateTaskRequest::from_json(&json_body(body, TITLE_REQUIRED_MESSAGE)?)?;

    let task = state
        .service
        .create(&request.title, request.priority)
        .await?;

    Ok((StatusCode::CREATED, Json(TaskResponse::from(task))))
}

/// Partially updates a task.
///
/// `PATCH /tasks/{id}` with any subset of `title`, `status`, `priority`.
/// The body must be an object; the task is then looked up, and only an
/// existing task has its field values checked.
///
/// # Errors
///
/// - 400 if the body is not an object
/// - 404 if the task does not exist
/// - 400 if a field is invalid
/// - 500 on store failure
pub async fn update_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<TaskResponse>, ApiErrorResponse> {
    let body = json_body(body, INVALID_BODY_MESSAGE)?;
    let fields = patch_fields(&body)?;
    let id = parse_task_id(&id)?;
    state.service.get_for_mutation(&id).await?;

    let patch = parse_task_patch(fields)?;
    let task = state.service.update(&id, &patch).await?;
    Ok(Json(TaskResponse::from(task)))
}

/// Deletes a task.
///
/// `DELETE /tasks/{id}` responds 204 with an empty body.
///
/// # Errors
///
/// - 404 if the task does not exist
/// - 500 on store failure
pub async fn delete_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiErrorResponse> {
    let id = parse_task_id(&id)?;
    state.service.delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Returns completion statistics.
///
/// # Errors
///
/// Returns 500 on store failure.
pub async fn get_stats(State(state): State<AppState>) -> Result<Json<Stats>, ApiErrorResponse> {
    Ok(Json(state.service.stats().await?))
}

/// Health check endpoint.
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn test_parse_task_id_valid() {
        let id = TaskId::generate();
        assert_eq!(parse_task_id(&id.to_string()).unwrap(), id);
    }

    #[rstest]
    #[case("42")]
    #[case("not-a-uuid")]
    #[case("")]
    fn test_parse_task_id_invalid_is_not_found(#[case] raw: &str) {
        let error = parse_task_id(raw).unwrap_err();
        assert_eq!(error.status, StatusCode::NOT_FOUND);
        assert_eq!(error.error.error, NOT_FOUND_MESSAGE);
    }

    #[rstest]
    #[tokio::test]
    async fn test_health_check() {
        let Json(response) = health_check().await;
        assert_eq!(response.status, "healthy");
        assert_eq!(response.version, env!("CARGO_PKG_VERSION"));
    }
}
