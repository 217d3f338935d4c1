//! Task view controller.
//!
//! Drives [`TaskViewState`] against a [`TaskApi`]. Each mutating action
//! follows the same shape: reduce optimistically, await the server, then
//! reduce again with either the confirmation or the rollback.

use futures::try_join;

use super::client::{ClientError, TaskApi};
use super::state::{Action, StatusFilter, TaskViewState, ViewMetrics};
use crate::domain::{Stats, Task, TaskId, TaskPatch, Title};

/// The task list view.
#[derive(Debug)]
pub struct TaskView<C> {
    api: C,
    state: TaskViewState,
    initial_stats: Stats,
}

impl<C: TaskApi> TaskView<C> {
    /// Creates a view from data already fetched.
    #[must_use]
    pub fn new(api: C, tasks: Vec<Task>, initial_stats: Stats) -> Self {
        Self {
            api,
            state: TaskViewState::new(tasks),
            initial_stats,
        }
    }

    /// Fetches the task list and server statistics concurrently and builds
    /// the view.
    ///
    /// # Errors
    ///
    /// Returns the first `ClientError` from either request.
    pub async fn load(api: C) -> Result<Self, ClientError> {
        let (tasks, stats) = try_join!(api.list_tasks(None), api.stats())?;
        tracing::debug!(tasks = tasks.len(), total = stats.total, "Task view loaded");
        Ok(Self::new(api, tasks, stats))
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> &TaskViewState {
        &self.state
    }

    /// Server statistics from the initial load. Not refreshed afterwards.
    #[must_use]
    pub const fn initial_stats(&self) -> &Stats {
        &self.initial_stats
    }

    /// Metrics recomputed from the local list.
    #[must_use]
    pub fn metrics(&self) -> ViewMetrics {
        self.state.metrics()
    }

    /// The underlying API client.
    #[must_use]
    pub const fn api(&self) -> &C {
        &self.api
    }

    fn dispatch(&mut self, action: Action) {
        self.state = std::mem::take(&mut self.state).reduce(action);
    }

    /// Changes the filter. No network call.
    pub fn set_filter(&mut self, filter: StatusFilter) {
        self.dispatch(Action::SetFilter(filter));
    }

    /// Updates the create-form input.
    pub fn set_draft(&mut self, draft: impl Into<String>) {
        self.dispatch(Action::EditDraft(draft.into()));
    }

    /// Creates a task from the current draft. See [`TaskView::create`].
    ///
    /// # Errors
    ///
    /// Returns the `ClientError` from the create request.
    pub async fn submit_draft(&mut self) -> Result<Option<Task>, ClientError> {
        let draft = self.state.draft().to_string();
        self.create(&draft).await
    }

    /// Creates a task.
    ///
    /// Blank input is ignored without a request and yields `Ok(None)`. The
    /// list only changes once the server confirms: the returned record is
    /// inserted at the head and the draft is cleared.
    ///
    /// # Errors
    ///
    /// Returns the `ClientError` from the request; local state is unchanged.
    pub async fn create(&mut self, title: &str) -> Result<Option<Task>, ClientError> {
        let Ok(title) = Title::parse(title) else {
            return Ok(None);
        };

        let task = self.api.create_task(title.as_str(), None).await?;
        self.dispatch(Action::Created(task.clone()));
        Ok(Some(task))
    }

    /// Advances a task to the next status in the cycle.
    ///
    /// Returns `Ok(None)` if the task is not in the local list. On success
    /// the server record replaces the local copy.
    ///
    /// # Errors
    ///
    /// Returns the `ClientError` from the request after restoring the task's
    /// previous status. Other tasks are left as they are.
    pub async fn toggle_status(&mut self, id: &TaskId) -> Result<Option<Task>, ClientError> {
        let Some(previous) = self.state.task(id).map(|task| task.status) else {
            return Ok(None);
        };
        let next = previous.next();

        self.dispatch(Action::SetStatus { id: *id, status: next });

        match self.api.update_task(id, &TaskPatch::new().status(next)).await {
            Ok(task) => {
                self.dispatch(Action::Confirmed(task.clone()));
                Ok(Some(task))
            }
            Err(error) => {
                tracing::warn!(
                    task_id = %id,
                    error = %error,
                    "Status change failed, rolling back"
                );
                self.dispatch(Action::SetStatus {
                    id: *id,
                    status: previous,
                });
                Err(error)
            }
        }
    }

    /// Deletes a task.
    ///
    /// The task disappears immediately. Returns `Ok(false)` if it was not in
    /// the local list.
    ///
    /// # Errors
    ///
    /// Returns the `ClientError` from the request after restoring the whole
    /// list to the last server-confirmed snapshot.
    pub async fn delete(&mut self, id: &TaskId) -> Result<bool, ClientError> {
        if self.state.task(id).is_none() {
            return Ok(false);
        }

        self.dispatch(Action::Remove(*id));

        match self.api.delete_task(id).await {
            Ok(()) => {
                self.dispatch(Action::RemoveConfirmed(*id));
                Ok(true)
            }
            Err(error) => {
                tracing::warn!(
                    task_id = %id,
                    error = %error,
                    "Delete failed, restoring list"
                );
                self.dispatch(Action::RestoreConfirmed);
                Err(error)
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Priority, TaskStatus, Timestamp};
    use async_trait::async_trait;
    use rstest::rstest;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    /// Echoes requests back without a server; fails every call when asked.
    #[derive(Default)]
    struct ScriptedApi {
        fail: AtomicBool,
        calls: AtomicUsize,
        tasks: Mutex<Vec<Task>>,
    }

    impl ScriptedApi {
        fn failing() -> Self {
            let api = Self::default();
            api.fail.store(true, Ordering::SeqCst);
            api
        }

        fn check(&self) -> Result<(), ClientError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail.load(Ordering::SeqCst) {
                Err(ClientError::Status {
                    status: 500,
                    message: "Internal server error.".to_string(),
                })
            } else {
                Ok(())
            }
        }
    }

    #[async_trait]
    impl TaskApi for ScriptedApi {
        async fn list_tasks(&self, _status: Option<TaskStatus>) -> Result<Vec<Task>, ClientError> {
            self.check()?;
            Ok(self.tasks.lock().unwrap().clone())
        }

        async fn create_task(
            &self,
            title: &str,
            priority: Option<Priority>,
        ) -> Result<Task, ClientError> {
            self.check()?;
            Ok(Task::new(
                TaskId::generate(),
                Title::parse(title).unwrap(),
                Timestamp::now(),
            )
            .with_priority(priority.unwrap_or_default()))
        }

        async fn update_task(&self, id: &TaskId, patch: &TaskPatch) -> Result<Task, ClientError> {
            self.check()?;
            let tasks = self.tasks.lock().unwrap();
            let task = tasks.iter().find(|task| task.id == *id).cloned().unwrap();
            Ok(patch.apply(task))
        }

        async fn delete_task(&self, _id: &TaskId) -> Result<(), ClientError> {
            self.check()
        }

        async fn stats(&self) -> Result<Stats, ClientError> {
            self.check()?;
            Ok(Stats::from_tasks(self.tasks.lock().unwrap().iter()))
        }
    }

    fn seeded(api: ScriptedApi, titles: &[&str]) -> (ScriptedApi, Vec<Task>) {
        let tasks: Vec<Task> = titles
            .iter()
            .map(|title| {
                Task::new(
                    TaskId::generate(),
                    Title::parse(title).unwrap(),
                    Timestamp::now(),
                )
            })
            .collect();
        *api.tasks.lock().unwrap() = tasks.clone();
        (api, tasks)
    }

    #[rstest]
    #[tokio::test]
    async fn test_load_keeps_initial_stats() {
        let (api, tasks) = seeded(ScriptedApi::default(), &["a", "b"]);

        let view = TaskView::load(api).await.unwrap();

        assert_eq!(view.state().tasks(), tasks.as_slice());
        assert_eq!(view.initial_stats().total, 2);
        assert_eq!(view.api().calls.load(Ordering::SeqCst), 2);
    }

    #[rstest]
    #[tokio::test]
    async fn test_load_failure_is_error() {
        let result = TaskView::load(ScriptedApi::failing()).await;
        assert!(result.is_err());
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    #[tokio::test]
    async fn test_create_blank_makes_no_request(#[case] title: &str) {
        let mut view = TaskView::new(ScriptedApi::default(), Vec::new(), Stats::default());

        let created = view.create(title).await.unwrap();

        assert!(created.is_none());
        assert_eq!(view.api().calls.load(Ordering::SeqCst), 0);
    }

    #[rstest]
    #[tokio::test]
    async fn test_submit_draft_trims_and_clears() {
        let (api, tasks) = seeded(ScriptedApi::default(), &["old"]);
        let mut view = TaskView::new(api, tasks, Stats::default());
        view.set_draft("  Write spec  ");

        let created = view.submit_draft().await.unwrap().unwrap();

        assert_eq!(created.title.as_str(), "Write spec");
        assert_eq!(view.state().tasks()[0], created);
        assert_eq!(view.state().draft(), "");
    }

    #[rstest]
    #[tokio::test]
    async fn test_toggle_success_takes_server_record() {
        let (api, tasks) = seeded(ScriptedApi::default(), &["a"]);
        let id = tasks[0].id;
        let mut view = TaskView::new(api, tasks, Stats::default());

        let updated = view.toggle_status(&id).await.unwrap().unwrap();

        assert_eq!(updated.status, TaskStatus::Doing);
        assert_eq!(view.state().task(&id), Some(&updated));
        assert_eq!(view.state().confirmed()[0], updated);
    }

    #[rstest]
    #[tokio::test]
    async fn test_toggle_failure_restores_previous_status() {
        let (api, tasks) = seeded(ScriptedApi::failing(), &["a", "b"]);
        let id = tasks[1].id;
        let mut view = TaskView::new(api, tasks.clone(), Stats::default());

        let result = view.toggle_status(&id).await;

        assert!(result.is_err());
        assert_eq!(view.state().tasks(), tasks.as_slice());
    }

    #[rstest]
    #[tokio::test]
    async fn test_toggle_unknown_task_is_noop() {
        let mut view = TaskView::new(ScriptedApi::default(), Vec::new(), Stats::default());

        let result = view.toggle_status(&TaskId::generate()).await.unwrap();

        assert!(result.is_none());
        assert_eq!(view.api().calls.load(Ordering::SeqCst), 0);
    }

    #[rstest]
    #[tokio::test]
    async fn test_delete_failure_restores_confirmed_list() {
        let (api, tasks) = seeded(ScriptedApi::failing(), &["a", "b", "c"]);
        let id = tasks[0].id;
        let mut view = TaskView::new(api, tasks.clone(), Stats::default());

        let result = view.delete(&id).await;

        assert!(result.is_err());
        assert_eq!(view.state().tasks(), tasks.as_slice());
    }

    #[rstest]
    #[tokio::test]
    async fn test_delete_success_updates_metrics() {
        let (api, tasks) = seeded(ScriptedApi::default(), &["a", "b"]);
        let id = tasks[0].id;
        let mut view = TaskView::new(api, tasks, Stats::default());

        assert!(view.delete(&id).await.unwrap());

        assert_eq!(view.metrics().total, 1);
        assert_eq!(view.state().confirmed().len(), 1);
    }

    #[rstest]
    #[tokio::test]
    async fn test_set_filter_makes_no_request() {
        let (api, tasks) = seeded(ScriptedApi::default(), &["a"]);
        let mut view = TaskView::new(api, tasks, Stats::default());

        view.set_filter(StatusFilter::Only(TaskStatus::Done));

        assert_eq!(view.state().visible().count(), 0);
        assert_eq!(view.api().calls.load(Ordering::SeqCst), 0);
    }
}
