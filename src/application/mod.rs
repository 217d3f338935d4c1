//! Application layer.
//!
//! The task service sits between the HTTP handlers and the task store.

pub mod task_service;

pub use task_service::{
    INVALID_BODY_MESSAGE, INVALID_PRIORITY_MESSAGE, INVALID_STATUS_MESSAGE, NOT_FOUND_MESSAGE,
    ServiceError, StorePhase, TITLE_REQUIRED_MESSAGE, TaskService, parse_status_filter,
};
