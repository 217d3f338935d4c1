//! Client-side task view.
//!
//! Holds a local copy of the task list, applies changes optimistically and
//! reconciles with the server through a [`TaskApi`].

pub mod client;
pub mod controller;
pub mod state;

pub use client::{ClientError, HttpTaskApi, TaskApi};
pub use controller::TaskView;
pub use state::{
    Action, EMPTY_PLACEHOLDER, StatusFilter, TaskViewState, ViewMetrics, toggle_hint,
};
