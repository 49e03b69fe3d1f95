#![allow(missing_docs)]

use anyhow::Result;
use kanban_core::{
    Direction, NewTask, NullsOrder, Query, SnapshotEvent, SnapshotListener, TaskPriority,
    TaskStatus, UserId, decode, encode,
};
use kanban_store_memory::MemoryStore;
use std::sync::{Arc, Mutex, PoisonError};
use time::macros::datetime;

fn by_due_date(owner: &str, nulls: NullsOrder) -> Query {
    Query::collection("tasks")
        .where_eq("userId", owner)
        .order_by("dueDate", Direction::Ascending, nulls)
}

#[test]
fn tasks_survive_store_file_round_trip() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("store.json");
    let mut task = NewTask {
        description: "outline sections".into(),
        due_date: Some(datetime!(2025-06-30 17:00 UTC)),
        priority: TaskPriority::High,
        status: TaskStatus::InProgress,
        ..NewTask::titled("Write report")
    }
    .into_task(UserId::from("alice"), datetime!(2025-06-01 9:00 UTC));

    let id = MemoryStore::open(&path)?.insert("tasks", encode(&task))?;
    task.id = id.as_str().into();

    let reopened = MemoryStore::open(&path)?;
    let Some(doc) = reopened.get("tasks", &id)? else {
        panic!("document should be persisted");
    };
    assert_eq!(decode(&doc, &id), task);
    Ok(())
}

#[test]
fn null_placement_follows_query() -> Result<()> {
    let store = MemoryStore::new();
    let owner = UserId::from("alice");
    let now = datetime!(2025-01-01 0:00 UTC);
    let undated = store.insert(
        "tasks",
        encode(&NewTask::titled("undated").into_task(owner.clone(), now)),
    )?;
    let dated = store.insert(
        "tasks",
        encode(
            &NewTask {
                due_date: Some(datetime!(2025-02-01 0:00 UTC)),
                ..NewTask::titled("dated")
            }
            .into_task(owner, now),
        ),
    )?;

    let seen = Arc::new(Mutex::new(Vec::new()));
    for nulls in [NullsOrder::Last, NullsOrder::First] {
        let sink = Arc::clone(&seen);
        let listener: SnapshotListener = Arc::new(move |event| {
            if let SnapshotEvent::Documents(docs) = event {
                let ids: Vec<String> = docs.into_iter().map(|doc| doc.id).collect();
                sink.lock().unwrap_or_else(PoisonError::into_inner).push(ids);
            }
        });
        let id = store.subscribe(by_due_date("alice", nulls), listener);
        store.unsubscribe(id);
    }

    let seen = seen.lock().unwrap_or_else(PoisonError::into_inner).clone();
    assert_eq!(
        seen,
        vec![
            vec![dated.clone(), undated.clone()],
            vec![undated, dated],
        ]
    );
    Ok(())
}
