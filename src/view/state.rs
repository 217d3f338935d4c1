//! Client-side task list state.
//!
//! [`TaskViewState`] is a plain value. Every change goes through
//! [`TaskViewState::reduce`], which consumes the state and returns the next
//! one. The controller wraps each network call between two reductions: the
//! optimistic change before the call and the confirmation or rollback after.

use crate::domain::{Stats, Task, TaskId, TaskStatus};

/// Placeholder shown when the current filter matches no task.
pub const EMPTY_PLACEHOLDER: &str = "No tasks here.";

// =============================================================================
// Filter
// =============================================================================

/// Which tasks the list shows. Purely local, never sent to the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    /// Every task.
    #[default]
    All,
    /// Only tasks with the given status.
    Only(TaskStatus),
}

impl StatusFilter {
    /// The filter choices in display order.
    pub const CHOICES: [Self; 4] = [
        Self::All,
        Self::Only(TaskStatus::Todo),
        Self::Only(TaskStatus::Doing),
        Self::Only(TaskStatus::Done),
    ];

    /// Returns `true` if the task passes the filter.
    #[must_use]
    pub fn matches(self, task: &Task) -> bool {
        match self {
            Self::All => true,
            Self::Only(status) => task.status == status,
        }
    }

    /// Button label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::All => "All",
            Self::Only(status) => status.label(),
        }
    }
}

/// Hint shown on a status badge: which status a click moves to.
#[must_use]
pub fn toggle_hint(status: TaskStatus) -> String {
    format!("Click to change → {}", status.next().label())
}

// =============================================================================
// Metrics
// =============================================================================

/// Counts shown above the list, derived from the local tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ViewMetrics {
    /// Number of local tasks.
    pub total: u64,
    /// Local tasks in `TODO`.
    pub todo: u64,
    /// Local tasks in `DOING`.
    pub doing: u64,
    /// Local tasks in `DONE`.
    pub done: u64,
    /// Completion percentage, rounded half up.
    pub percent: u64,
}

impl ViewMetrics {
    /// `"{done} of {total} tasks completed"`.
    #[must_use]
    pub fn summary(&self) -> String {
        format!("{} of {} tasks completed", self.done, self.total)
    }
}

impl From<Stats> for ViewMetrics {
    fn from(stats: Stats) -> Self {
        Self {
            total: stats.total,
            todo: stats.todo,
            doing: stats.doing,
            done: stats.done,
            percent: stats.completion_rate,
        }
    }
}

// =============================================================================
// Actions
// =============================================================================

/// A state transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Replace everything with a freshly loaded list.
    Loaded(Vec<Task>),
    /// Update the create-form input.
    EditDraft(String),
    /// A create was confirmed; prepend the record and clear the draft.
    Created(Task),
    /// Optimistically move a task to a status.
    SetStatus {
        /// Task to change.
        id: TaskId,
        /// New status.
        status: TaskStatus,
    },
    /// The server returned the authoritative record for a task.
    Confirmed(Task),
    /// Optimistically drop a task from the list.
    Remove(TaskId),
    /// The server confirmed a deletion.
    RemoveConfirmed(TaskId),
    /// Restore the list to the last server-confirmed snapshot.
    RestoreConfirmed,
    /// Change the filter.
    SetFilter(StatusFilter),
}

// =============================================================================
// State
// =============================================================================

/// Everything the task list renders from.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TaskViewState {
    tasks: Vec<Task>,
    confirmed: Vec<Task>,
    filter: StatusFilter,
    draft: String,
}

impl TaskViewState {
    /// Creates a state from an initial server list.
    #[must_use]
    pub fn new(tasks: Vec<Task>) -> Self {
        Self::default().reduce(Action::Loaded(tasks))
    }

    /// Applies one action.
    #[must_use]
    pub fn reduce(self, action: Action) -> Self {
        match action {
            Action::Loaded(tasks) => Self {
                confirmed: tasks.clone(),
                tasks,
                ..self
            },
            Action::EditDraft(draft) => Self { draft, ..self },
            Action::Created(task) => Self {
                tasks: prepend(self.tasks, task.clone()),
                confirmed: prepend(self.confirmed, task),
                draft: String::new(),
                ..self
            },
            Action::SetStatus { id, status } => Self {
                tasks: replace_where(self.tasks, &id, |task| task.with_status(status)),
                ..self
            },
            Action::Confirmed(record) => Self {
                tasks: replace_where(self.tasks, &record.id, |_| record.clone()),
                confirmed: replace_where(self.confirmed, &record.id, |_| record.clone()),
                ..self
            },
            Action::Remove(id) => Self {
                tasks: without(self.tasks, &id),
                ..self
            },
            Action::RemoveConfirmed(id) => Self {
                confirmed: without(self.confirmed, &id),
                ..self
            },
            Action::RestoreConfirmed => Self {
                tasks: self.confirmed.clone(),
                ..self
            },
            Action::SetFilter(filter) => Self { filter, ..self },
        }
    }

    /// All local tasks, newest first.
    #[must_use]
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// The last list the server confirmed.
    #[must_use]
    pub fn confirmed(&self) -> &[Task] {
        &self.confirmed
    }

    /// The local copy of one task.
    #[must_use]
    pub fn task(&self, id: &TaskId) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == *id)
    }

    /// The active filter.
    #[must_use]
    pub const fn filter(&self) -> StatusFilter {
        self.filter
    }

    /// Current create-form input.
    #[must_use]
    pub fn draft(&self) -> &str {
        &self.draft
    }

    /// Tasks passing the active filter.
    pub fn visible(&self) -> impl Iterator<Item = &Task> {
        let filter = self.filter;
        self.tasks.iter().filter(move |task| filter.matches(task))
    }

    /// Placeholder text when nothing is visible.
    #[must_use]
    pub fn placeholder(&self) -> Option<&'static str> {
        self.visible().next().is_none().then_some(EMPTY_PLACEHOLDER)
    }

    /// Metrics over the whole local list, ignoring the filter.
    #[must_use]
    pub fn metrics(&self) -> ViewMetrics {
        ViewMetrics::from(Stats::from_tasks(&self.tasks))
    }
}

fn prepend(tasks: Vec<Task>, task: Task) -> Vec<Task> {
    std::iter::once(task).chain(tasks).collect()
}

fn replace_where(tasks: Vec<Task>, id: &TaskId, f: impl Fn(Task) -> Task) -> Vec<Task> {
    tasks
        .into_iter()
        .map(|task| if task.id == *id { f(task) } else { task })
        .collect()
}

fn without(tasks: Vec<Task>, id: &TaskId) -> Vec<Task> {
    tasks.into_iter().filter(|task| task.id != *id).collect()
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Timestamp, Title};
    use rstest::{fixture, rstest};

    fn task(title: &str, status: TaskStatus) -> Task {
        Task::new(TaskId::generate(), Title::parse(title).unwrap(), Timestamp::now())
            .with_status(status)
    }

    #[fixture]
    fn state() -> TaskViewState {
        TaskViewState::new(vec![
            task("c", TaskStatus::Done),
            task("b", TaskStatus::Doing),
            task("a", TaskStatus::Todo),
        ])
    }

    #[rstest]
    fn test_new_state_is_confirmed(state: TaskViewState) {
        assert_eq!(state.tasks(), state.confirmed());
        assert_eq!(state.filter(), StatusFilter::All);
    }

    #[rstest]
    fn test_set_status_changes_only_local_list(state: TaskViewState) {
        let id = state.tasks()[2].id;

        let next = state.reduce(Action::SetStatus {
            id,
            status: TaskStatus::Doing,
        });

        assert_eq!(next.task(&id).unwrap().status, TaskStatus::Doing);
        assert_eq!(next.confirmed()[2].status, TaskStatus::Todo);
    }

    #[rstest]
    fn test_remove_then_restore(state: TaskViewState) {
        let original = state.tasks().to_vec();
        let id = original[1].id;

        let removed = state.reduce(Action::Remove(id));
        assert_eq!(removed.tasks().len(), 2);

        let restored = removed.reduce(Action::RestoreConfirmed);
        assert_eq!(restored.tasks(), original.as_slice());
    }

    #[rstest]
    fn test_created_prepends_and_clears_draft(state: TaskViewState) {
        let created = task("new", TaskStatus::Todo);

        let next = state
            .reduce(Action::EditDraft("new".to_string()))
            .reduce(Action::Created(created.clone()));

        assert_eq!(next.tasks()[0], created);
        assert_eq!(next.confirmed()[0], created);
        assert_eq!(next.draft(), "");
    }

    #[rstest]
    fn test_confirmed_does_not_resurrect_removed_task(state: TaskViewState) {
        let record = state.tasks()[0].clone();

        let next = state
            .reduce(Action::Remove(record.id))
            .reduce(Action::Confirmed(record.with_status(TaskStatus::Todo)));

        assert!(next.task(&next.confirmed()[0].id).is_none());
        assert_eq!(next.tasks().len(), 2);
    }

    #[rstest]
    #[case(StatusFilter::All, 3)]
    #[case(StatusFilter::Only(TaskStatus::Todo), 1)]
    #[case(StatusFilter::Only(TaskStatus::Done), 1)]
    fn test_visible_follows_filter(
        state: TaskViewState,
        #[case] filter: StatusFilter,
        #[case] expected: usize,
    ) {
        let next = state.reduce(Action::SetFilter(filter));
        assert_eq!(next.visible().count(), expected);
        assert_eq!(next.placeholder(), None);
    }

    #[rstest]
    fn test_placeholder_when_filter_matches_nothing() {
        let state = TaskViewState::new(vec![task("a", TaskStatus::Todo)])
            .reduce(Action::SetFilter(StatusFilter::Only(TaskStatus::Done)));

        assert_eq!(state.placeholder(), Some(EMPTY_PLACEHOLDER));
    }

    #[rstest]
    fn test_metrics_ignore_filter(state: TaskViewState) {
        let metrics = state
            .reduce(Action::SetFilter(StatusFilter::Only(TaskStatus::Todo)))
            .metrics();

        assert_eq!(
            metrics,
            ViewMetrics {
                total: 3,
                todo: 1,
                doing: 1,
                done: 1,
                percent: 33,
            }
        );
        assert_eq!(metrics.summary(), "1 of 3 tasks completed");
    }

    #[rstest]
    #[case(TaskStatus::Todo, "Click to change → In progress")]
    #[case(TaskStatus::Doing, "Click to change → Done")]
    #[case(TaskStatus::Done, "Click to change → To do")]
    fn test_toggle_hint(#[case] status: TaskStatus, #[case] expected: &str) {
        assert_eq!(toggle_hint(status), expected);
    }

    #[rstest]
    fn test_filter_labels() {
        let labels: Vec<&str> = StatusFilter::CHOICES.iter().map(|f| f.label()).collect();
        assert_eq!(labels, vec!["All", "To do", "In progress", "Done"]);
    }
}
