//! Taskboard
//!
//! A task tracker: a REST API over a task store, completion statistics,
//! and a client-side task view with optimistic updates.
//!
//! - [`domain`]: tasks, the status cycle, statistics
//! - [`infrastructure`]: task stores, configuration, backend factory
//! - [`application`]: the task service
//! - [`api`]: axum handlers and router
//! - [`view`]: client state, HTTP client and the optimistic view controller

pub mod api;
pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod view;
