//! End-to-end behaviour of `TaskSync` against the in-memory document store.

#![allow(missing_docs, clippy::indexing_slicing)]

use std::sync::Arc;

use kanban_app::{SessionIdentity, SyncError, SyncPhase, TaskSync};
use kanban_core::{NewTask, TaskId, TaskPriority, TaskStatus};
use kanban_store_memory::{MemoryStore, MemoryStoreError};
use time::macros::datetime;

type BoardSync = TaskSync<MemoryStore, Arc<SessionIdentity>>;

fn setup(user: Option<&str>) -> (Arc<MemoryStore>, Arc<SessionIdentity>, BoardSync) {
    let store = Arc::new(MemoryStore::new());
    let identity = Arc::new(
        user.map_or_else(SessionIdentity::signed_out, SessionIdentity::signed_in),
    );
    let sync = TaskSync::new(Arc::clone(&store), Arc::clone(&identity));
    (store, identity, sync)
}

fn ids(tasks: &[kanban_core::Task]) -> Vec<String> {
    tasks.iter().map(|task| task.id.to_string()).collect()
}

#[tokio::test]
async fn created_task_arrives_through_snapshot() -> Result<(), SyncError> {
    let (_store, _identity, sync) = setup(Some("alice"));
    let mut todo = sync.tasks_for_status(TaskStatus::Todo);
    sync.start_current_user()?;
    assert_eq!(*sync.phase().borrow(), SyncPhase::Active);
    assert!(todo.current().is_empty());

    let id = sync
        .create_task(NewTask {
            title: "Write report".into(),
            priority: TaskPriority::Low,
            ..NewTask::default()
        })
        .await?;

    let Some(column) = todo.changed().await else {
        panic!("sync dropped");
    };
    assert_eq!(ids(&column), vec![id.to_string()]);
    assert_eq!(column[0].priority, TaskPriority::Low);
    assert_eq!(column[0].owner_id.as_str(), "alice");
    Ok(())
}

#[tokio::test]
async fn create_without_user_is_rejected_and_board_untouched() -> Result<(), SyncError> {
    let (store, identity, sync) = setup(Some("alice"));
    sync.start_current_user()?;
    let before = sync.board();

    identity.sign_out();
    let result = sync
        .create_task(NewTask {
            title: "Write report".into(),
            priority: TaskPriority::Low,
            ..NewTask::default()
        })
        .await;

    assert_eq!(result, Err(SyncError::AuthRequired));
    assert_eq!(sync.board(), before);
    assert_eq!(sync.errors().borrow().as_deref(), Some("sign in required"));
    assert!(
        store
            .get("tasks", "anything")
            .map_err(|err| SyncError::Remote(err.to_string()))?
            .is_none()
    );
    Ok(())
}

#[tokio::test]
async fn change_status_moves_task_and_keeps_due_date_order() -> Result<(), SyncError> {
    let (_store, _identity, sync) = setup(Some("alice"));
    sync.start("alice")?;

    let a = sync
        .create_task(NewTask {
            due_date: Some(datetime!(2025-05-01 9:00 UTC)),
            ..NewTask::titled("A")
        })
        .await?;
    let b = sync
        .create_task(NewTask {
            due_date: Some(datetime!(2025-05-02 9:00 UTC)),
            status: TaskStatus::Done,
            ..NewTask::titled("B")
        })
        .await?;

    let Some(task_a) = sync.board().find(&a).cloned() else {
        panic!("A should be on the board");
    };
    let moved = sync.change_status(&task_a, TaskStatus::Done).await?;
    assert_eq!(moved.status, TaskStatus::Done);

    let done = sync.tasks_for_status(TaskStatus::Done).current();
    assert_eq!(ids(&done), vec![a.to_string(), b.to_string()]);
    assert!(sync.tasks_for_status(TaskStatus::Todo).current().is_empty());
    Ok(())
}

#[tokio::test]
async fn undated_tasks_sort_last() -> Result<(), SyncError> {
    let (_store, _identity, sync) = setup(Some("alice"));
    sync.start("alice")?;
    let undated = sync.create_task(NewTask::titled("someday")).await?;
    let dated = sync
        .create_task(NewTask {
            due_date: Some(datetime!(2030-01-01 0:00 UTC)),
            ..NewTask::titled("dated")
        })
        .await?;

    assert_eq!(
        ids(sync.board().tasks()),
        vec![dated.to_string(), undated.to_string()]
    );
    Ok(())
}

#[tokio::test]
async fn views_match_filter_of_canonical_list() -> Result<(), SyncError> {
    let (store, _identity, sync) = setup(Some("alice"));
    sync.start("alice")?;
    for (title, status) in [
        ("one", TaskStatus::InProgress),
        ("two", TaskStatus::Todo),
        ("three", TaskStatus::InProgress),
        ("four", TaskStatus::Done),
    ] {
        sync.create_task(NewTask {
            status,
            ..NewTask::titled(title)
        })
        .await?;
    }

    let board = sync.board();
    for status in TaskStatus::ALL {
        let expected: Vec<_> = board
            .tasks()
            .iter()
            .filter(|task| task.status == status)
            .cloned()
            .collect();
        assert_eq!(sync.tasks_for_status(status).current(), expected);
    }
    assert_eq!(store.active_subscriptions(), 1);
    Ok(())
}

#[tokio::test]
async fn other_users_tasks_stay_off_the_board() -> Result<(), SyncError> {
    let store = Arc::new(MemoryStore::new());
    let bob = TaskSync::new(Arc::clone(&store), SessionIdentity::signed_in("bob"));
    bob.create_task(NewTask::titled("bob's")).await?;

    let alice = TaskSync::new(Arc::clone(&store), SessionIdentity::signed_in("alice"));
    alice.start("alice")?;
    assert!(alice.board().is_empty());
    Ok(())
}

#[tokio::test]
async fn restart_keeps_one_subscription_and_stop_is_idempotent() -> Result<(), SyncError> {
    let (store, _identity, sync) = setup(Some("alice"));
    sync.start("alice")?;
    sync.start("alice")?;
    assert_eq!(store.active_subscriptions(), 1);

    sync.stop();
    sync.stop();
    assert_eq!(store.active_subscriptions(), 0);
    assert_eq!(*sync.phase().borrow(), SyncPhase::Unsubscribed);
    Ok(())
}

#[tokio::test]
async fn writes_after_stop_do_not_reach_board() -> Result<(), SyncError> {
    let (_store, _identity, sync) = setup(Some("alice"));
    sync.start("alice")?;
    sync.create_task(NewTask::titled("before")).await?;
    sync.stop();

    sync.create_task(NewTask::titled("after")).await?;
    assert_eq!(sync.board().len(), 1);
    Ok(())
}

#[tokio::test]
async fn delete_twice_succeeds() -> Result<(), SyncError> {
    let (_store, _identity, sync) = setup(Some("alice"));
    sync.start("alice")?;
    let id = sync.create_task(NewTask::titled("short-lived")).await?;

    sync.delete_task(&id).await?;
    sync.delete_task(&id).await?;
    assert!(sync.board().is_empty());
    Ok(())
}

#[tokio::test]
async fn update_of_deleted_task_is_not_found() -> Result<(), SyncError> {
    let (_store, _identity, sync) = setup(Some("alice"));
    sync.start("alice")?;
    let id = sync.create_task(NewTask::titled("doomed")).await?;
    let Some(task) = sync.board().find(&id).cloned() else {
        panic!("task should be on the board");
    };
    sync.delete_task(&id).await?;

    assert!(matches!(
        sync.change_status(&task, TaskStatus::Done).await,
        Err(SyncError::NotFound(_))
    ));
    Ok(())
}

#[tokio::test]
async fn store_failures_surface_and_clear() -> Result<(), SyncError> {
    let (store, _identity, sync) = setup(Some("alice"));
    sync.start("alice")?;
    let errors = sync.errors();

    store.fail_next_operation(MemoryStoreError::Unavailable("offline".into()));
    assert!(matches!(
        sync.create_task(NewTask::titled("lost")).await,
        Err(SyncError::Remote(_))
    ));
    assert!(errors.borrow().is_some());
    assert_eq!(*sync.pending().borrow(), 0);

    sync.create_task(NewTask::titled("kept")).await?;
    assert_eq!(*errors.borrow(), None);
    assert_eq!(sync.board().len(), 1);
    Ok(())
}

#[tokio::test]
async fn listener_failure_keeps_last_board() -> Result<(), SyncError> {
    let (store, _identity, sync) = setup(Some("alice"));
    sync.start("alice")?;
    sync.create_task(NewTask::titled("survivor")).await?;

    store.broadcast_failure("tasks", "permission revoked");
    assert_eq!(sync.errors().borrow().as_deref(), Some("permission revoked"));
    assert_eq!(sync.board().len(), 1);
    Ok(())
}

#[tokio::test]
async fn foreign_task_ids_are_left_alone() -> Result<(), SyncError> {
    let (_store, _identity, sync) = setup(Some("alice"));
    sync.start("alice")?;
    sync.delete_task(&TaskId::from("never-existed")).await?;
    Ok(())
}
