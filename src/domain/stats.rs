//! Completion statistics.
//!
//! Statistics are derived from a grouped count of tasks by status. They are
//! never persisted; every snapshot is recomputed from the counts it is given.

use serde::{Deserialize, Serialize};

use super::task::{Task, TaskStatus};

/// Number of tasks in one status group, as returned by store aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusCount {
    /// The status this group counts.
    pub status: TaskStatus,
    /// Number of tasks with that status.
    pub count: u64,
}

impl StatusCount {
    /// Creates a new group count.
    #[must_use]
    pub const fn new(status: TaskStatus, count: u64) -> Self {
        Self { status, count }
    }
}

/// Snapshot of task counts and completion rate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    /// Total number of tasks.
    pub total: u64,
    /// Tasks in `TODO`.
    pub todo: u64,
    /// Tasks in `DOING`.
    pub doing: u64,
    /// Tasks in `DONE`.
    pub done: u64,
    /// Percentage of tasks in `DONE`, rounded half up; 0 when there are none.
    pub completion_rate: u64,
}

impl Stats {
    /// Builds a snapshot from grouped counts.
    ///
    /// Missing groups count as zero. Repeated groups are summed.
    #[must_use]
    pub fn from_counts(groups: &[StatusCount]) -> Self {
        let (todo, doing, done) =
            groups
                .iter()
                .fold((0u64, 0u64, 0u64), |(todo, doing, done), group| {
                    match group.status {
                        TaskStatus::Todo => (todo + group.count, doing, done),
                        TaskStatus::Doing => (todo, doing + group.count, done),
                        TaskStatus::Done => (todo, doing, done + group.count),
                    }
                });

        Self::from_parts(todo, doing, done)
    }

    /// Builds a snapshot by counting a list of tasks.
    #[must_use]
    pub fn from_tasks<'a>(tasks: impl IntoIterator<Item = &'a Task>) -> Self {
        let groups: Vec<StatusCount> = tasks
            .into_iter()
            .map(|task| StatusCount::new(task.status, 1))
            .collect();
        Self::from_counts(&groups)
    }

    fn from_parts(todo: u64, doing: u64, done: u64) -> Self {
        let total = todo + doing + done;
        Self {
            total,
            todo,
            doing,
            done,
            completion_rate: completion_rate(done, total),
        }
    }
}

/// Computes `round(done / total * 100)` with halves rounded up.
///
/// Integer arithmetic: `floor((200 * done + total) / (2 * total))`.
#[must_use]
pub const fn completion_rate(done: u64, total: u64) -> u64 {
    if total == 0 {
        return 0;
    }
    (200 * done + total) / (2 * total)
}

// =============================================================================
// Tests
// =============================================================================
