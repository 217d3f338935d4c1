//! In-memory task store.
//!
//! Suitable for development and tests. Thread-safe via `Arc<RwLock<...>>`;
//! every operation takes the lock once, so each call is atomic.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Duration;
use tokio::sync::RwLock;

use crate::domain::{NewTask, StatusCount, Task, TaskId, TaskPatch, TaskStatus, Timestamp};
use crate::infrastructure::{StoreError, TaskStore};

#[derive(Debug, Default)]
struct Inner {
    tasks: HashMap<TaskId, Task>,
    last_created_at: Option<Timestamp>,
}

impl Inner {
    /// Returns a creation time strictly after every previously issued one.
    fn next_created_at(&mut self) -> Timestamp {
        let now = *Timestamp::now().as_datetime();
        let next = match self.last_created_at {
            Some(last) if *last.as_datetime() >= now => {
                *last.as_datetime() + Duration::microseconds(1)
            }
            _ => now,
        };
        let timestamp = Timestamp::from_datetime(next);
        self.last_created_at = Some(timestamp);
        timestamp
    }
}

/// In-memory implementation of [`TaskStore`].
///
/// # Example
///
/// ```ignore
/// let store = InMemoryTaskStore::new();
/// let task = store.insert(NewTask::new(Title::parse("My task")?)).await?;
/// let found = store.find_by_id(&task.id).await?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct InMemoryTaskStore {
    inner: Arc<RwLock<Inner>>,
}

impl InMemoryTaskStore {
    /// Creates a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-populated with the given tasks.
    ///
    /// Tasks keep their ids and timestamps.
    #[must_use]
    pub fn with_tasks(tasks: impl IntoIterator<Item = Task>) -> Self {
        let tasks: HashMap<TaskId, Task> = tasks.into_iter().map(|task| (task.id, task)).collect();
        let last_created_at = tasks.values().map(|task| task.created_at).max();
        Self {
            inner: Arc::new(RwLock::new(Inner {
                tasks,
                last_created_at,
            })),
        }
    }
}

/// Newest first; ties broken by id so the order is total.
fn sort_newest_first(tasks: &mut [Task]) {
    tasks.sort_by(|left, right| {
        right
            .created_at
            .cmp(&left.created_at)
            .then_with(|| right.id.cmp(&left.id))
    });
}

#[async_trait]
impl TaskStore for InMemoryTaskStore {
    async fn insert(&self, task: NewTask) -> Result<Task, StoreError> {
        let mut guard = self.inner.write().await;
        let created_at = guard.next_created_at();
        let task =
            Task::new(TaskId::generate(), task.title, created_at).with_priority(task.priority);
        guard.tasks.insert(task.id, task.clone());
        Ok(task)
    }

    async fn find_by_id(&self, id: &TaskId) -> Result<Option<Task>, StoreError> {
        let guard = self.inner.read().await;
        Ok(guard.tasks.get(id).cloned())
    }

    async fn list(&self, status: Option<TaskStatus>) -> Result<Vec<Task>, StoreError> {
        let mut tasks: Vec<Task> = {
            let guard = self.inner.read().await;
            guard
                .tasks
                .values()
                .filter(|task| status.is_none_or(|status| task.status == status))
                .cloned()
                .collect()
        };
        sort_newest_first(&mut tasks);
        Ok(tasks)
    }

    async fn update(&self, id: &TaskId, patch: &TaskPatch) -> Result<Task, StoreError> {
        let mut guard = self.inner.write().await;
        let existing = guard
            .tasks
            .remove(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        let updated = patch.apply(existing);
        guard.tasks.insert(*id, updated.clone());
        Ok(updated)
    }

    async fn delete(&self, id: &TaskId) -> Result<bool, StoreError> {
        let mut guard = self.inner.write().await;
        Ok(guard.tasks.remove(id).is_some())
    }

    async fn count_by_status(&self) -> Result<Vec<StatusCount>, StoreError> {
        let guard = self.inner.read().await;
        let counts = guard
            .tasks
            .values()
            .fold(HashMap::<TaskStatus, u64>::new(), |mut counts, task| {
                *counts.entry(task.status).or_default() += 1;
                counts
            });
        drop(guard);

        Ok(TaskStatus::ALL
            .iter()
            .filter_map(|status| {
                counts
                    .get(status)
                    .map(|count| StatusCount::new(*status, *count))
            })
            .collect())
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Priority, Title};
    use chrono::Utc;
    use rstest::rstest;

    fn new_task(title: &str) -> NewTask {
        NewTask::new(Title::parse(title).unwrap())
    }

    #[rstest]
    #[tokio::test]
    async fn test_insert_assigns_id_and_defaults() {
        let store = InMemoryTaskStore::new();

        let task = store.insert(new_task("Write spec")).await.unwrap();

        assert_eq!(task.title.as_str(), "Write spec");
        assert_eq!(task.status, TaskStatus::Todo);
        assert_eq!(task.priority, Priority::Low);
        assert_eq!(store.find_by_id(&task.id).await.unwrap(), Some(task));
    }

    #[rstest]
    #[tokio::test]
    async fn test_insert_keeps_priority() {
        let store = InMemoryTaskStore::new();
        let task = store
            .insert(new_task("Urgent").with_priority(Priority::High))
            .await
            .unwrap();
        assert_eq!(task.priority, Priority::High);
    }

    #[rstest]
    #[tokio::test]
    async fn test_created_at_is_strictly_increasing() {
        let store = InMemoryTaskStore::new();
        let first = store.insert(new_task("first")).await.unwrap();
        let second = store.insert(new_task("second")).await.unwrap();
        let third = store.insert(new_task("third")).await.unwrap();

        assert!(first.created_at < second.created_at);
        assert!(second.created_at < third.created_at);
    }

    #[rstest]
    #[tokio::test]
    async fn test_list_newest_first() {
        let store = InMemoryTaskStore::new();
        for title in ["first", "second", "third"] {
            store.insert(new_task(title)).await.unwrap();
        }

        let titles: Vec<String> = store
            .list(None)
            .await
            .unwrap()
            .into_iter()
            .map(|task| task.title.to_string())
            .collect();

        assert_eq!(titles, vec!["third", "second", "first"]);
    }

    #[rstest]
    #[tokio::test]
    async fn test_list_filters_by_status() {
        let store = InMemoryTaskStore::new();
        let done = store.insert(new_task("done")).await.unwrap();
        store.insert(new_task("todo")).await.unwrap();
        store
            .update(&done.id, &TaskPatch::new().status(TaskStatus::Done))
            .await
            .unwrap();

        let listed = store.list(Some(TaskStatus::Done)).await.unwrap();

        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, done.id);
    }

    #[rstest]
    #[tokio::test]
    async fn test_update_unknown_is_not_found() {
        let store = InMemoryTaskStore::new();
        let result = store
            .update(&TaskId::generate(), &TaskPatch::new().status(TaskStatus::Done))
            .await;
        assert!(matches!(result, Err(StoreError::NotFound(_))));
    }

    #[rstest]
    #[tokio::test]
    async fn test_delete_reports_existence() {
        let store = InMemoryTaskStore::new();
        let task = store.insert(new_task("gone")).await.unwrap();

        assert!(store.delete(&task.id).await.unwrap());
        assert!(!store.delete(&task.id).await.unwrap());
        assert!(store.find_by_id(&task.id).await.unwrap().is_none());
    }

    #[rstest]
    #[tokio::test]
    async fn test_count_by_status_omits_empty_groups() {
        let store = InMemoryTaskStore::new();
        store.insert(new_task("a")).await.unwrap();
        store.insert(new_task("b")).await.unwrap();

        let counts = store.count_by_status().await.unwrap();

        assert_eq!(counts, vec![StatusCount::new(TaskStatus::Todo, 2)]);
    }

    #[rstest]
    #[tokio::test]
    async fn test_with_tasks_continues_after_seeded_timestamps() {
        let seeded = Task::new(
            TaskId::generate(),
            Title::parse("seeded").unwrap(),
            Timestamp::from_datetime(Utc::now() + Duration::hours(1)),
        );
        let store = InMemoryTaskStore::with_tasks([seeded.clone()]);

        let created = store.insert(new_task("later")).await.unwrap();

        assert!(created.created_at > seeded.created_at);
        assert_eq!(store.list(None).await.unwrap()[0].id, created.id);
    }
}
