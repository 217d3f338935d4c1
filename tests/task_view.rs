//! Integration tests for the task view against the real service.
//!
//! The view talks to [`common::InProcessApi`], which forwards to a
//! `TaskService` and can be switched into failure mode between actions.

mod common;

use rstest::rstest;

use common::{InProcessApi, create_test_service};
use taskboard::domain::TaskStatus;
use taskboard::view::{StatusFilter, TaskView};

async fn loaded_view(titles: &[&str]) -> TaskView<InProcessApi> {
    let service = create_test_service();
    for title in titles {
        service.create(title, None).await.unwrap();
    }
    TaskView::load(InProcessApi::new(service)).await.unwrap()
}

#[rstest]
#[tokio::test]
async fn test_load_matches_server() {
    let view = loaded_view(&["a", "b", "c"]).await;

    let server = view.api().service().list(None).await.unwrap();
    assert_eq!(view.state().tasks(), server.as_slice());
    assert_eq!(view.initial_stats().total, 3);
    assert_eq!(view.metrics().summary(), "0 of 3 tasks completed");
}

#[rstest]
#[tokio::test]
async fn test_toggle_three_times_returns_to_todo() {
    let mut view = loaded_view(&["cycle"]).await;
    let id = view.state().tasks()[0].id;

    let mut seen = Vec::new();
    for _ in 0..3 {
        seen.push(view.toggle_status(&id).await.unwrap().unwrap().status);
    }

    assert_eq!(
        seen,
        vec![TaskStatus::Doing, TaskStatus::Done, TaskStatus::Todo]
    );
    let server = view.api().service().get_for_mutation(&id).await.unwrap();
    assert_eq!(server.status, TaskStatus::Todo);
}

#[rstest]
#[tokio::test]
async fn test_toggle_failure_rolls_back_only_that_task() {
    let mut view = loaded_view(&["a", "b"]).await;
    let first = view.state().tasks()[0].id;
    let second = view.state().tasks()[1].id;
    view.toggle_status(&first).await.unwrap();

    view.api().set_failing(true);
    let result = view.toggle_status(&second).await;

    assert!(result.is_err());
    assert_eq!(view.state().task(&first).unwrap().status, TaskStatus::Doing);
    assert_eq!(view.state().task(&second).unwrap().status, TaskStatus::Todo);
}

#[rstest]
#[tokio::test]
async fn test_delete_failure_restores_confirmed_snapshot() {
    let mut view = loaded_view(&["keep", "drop"]).await;
    let created = view.create("newest").await.unwrap().unwrap();
    let before = view.state().tasks().to_vec();

    view.api().set_failing(true);
    let result = view.delete(&before[1].id).await;

    assert!(result.is_err());
    assert_eq!(view.state().tasks(), before.as_slice());
    assert_eq!(view.state().tasks()[0], created);
}

#[rstest]
#[tokio::test]
async fn test_create_failure_leaves_list_unchanged() {
    let mut view = loaded_view(&["a"]).await;
    view.set_draft("b");
    let before = view.state().tasks().to_vec();

    view.api().set_failing(true);
    let result = view.submit_draft().await;

    assert!(result.is_err());
    assert_eq!(view.state().tasks(), before.as_slice());
    assert_eq!(view.state().draft(), "b");
}

#[rstest]
#[tokio::test]
async fn test_metrics_diverge_from_initial_stats() {
    let mut view = loaded_view(&["a", "b"]).await;
    let id = view.state().tasks()[0].id;

    view.toggle_status(&id).await.unwrap();
    view.toggle_status(&id).await.unwrap();

    assert_eq!(view.metrics().done, 1);
    assert_eq!(view.metrics().percent, 50);
    assert_eq!(view.initial_stats().done, 0);
    assert_eq!(view.api().service().stats().await.unwrap().done, 1);
}

#[rstest]
#[tokio::test]
async fn test_filter_is_local() {
    let mut view = loaded_view(&["a", "b"]).await;
    let id = view.state().tasks()[0].id;
    view.toggle_status(&id).await.unwrap();

    view.api().set_failing(true);
    view.set_filter(StatusFilter::Only(TaskStatus::Doing));

    let visible: Vec<_> = view.state().visible().map(|task| task.id).collect();
    assert_eq!(visible, vec![id]);
}
