//! Domain module for task tracking.
//!
//! This module contains domain models and value objects.

pub mod stats;
pub mod task;

pub use stats::{StatusCount, Stats, completion_rate};
pub use task::{
    NewTask, ParsePriorityError, ParseStatusError, Priority, Task, TaskId, TaskPatch, TaskStatus,
    Timestamp, Title, TitleError,
};
