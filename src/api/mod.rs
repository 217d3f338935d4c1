//! HTTP API layer.
//!
//! - `GET /tasks`, `POST /tasks`
//! - `PATCH /tasks/{id}`, `DELETE /tasks/{id}`
//! - `GET /stats`
//! - `GET /health`

pub mod dto;
pub mod error;
pub mod handlers;
pub mod routes;

pub use dto::{
    CreateTaskRequest, HealthResponse, ListTasksQuery, TaskResponse, parse_task_patch, patch_fields,
};
pub use error::{ApiError, ApiErrorResponse, INTERNAL_ERROR_MESSAGE};
pub use handlers::{
    AppState, create_task, delete_task, get_stats, health_check, list_tasks, update_task,
};
pub use routes::create_router;
