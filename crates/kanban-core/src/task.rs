use crate::id::{TaskId, UserId};
use crate::status::{TaskPriority, TaskStatus};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// A card on the board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Store-assigned identifier (empty until inserted).
    pub id: TaskId,
    /// Display title, never blank once persisted.
    pub title: String,
    /// Free-form description.
    pub description: String,
    /// Optional deadline.
    #[serde(with = "time::serde::rfc3339::option")]
    pub due_date: Option<OffsetDateTime>,
    /// Column the task sits in.
    pub status: TaskStatus,
    /// Urgency.
    pub priority: TaskPriority,
    /// Owning user.
    pub owner_id: UserId,
    /// Creation time.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    /// Last mutation time.
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl Task {
    /// Copy with a different status.
    #[must_use]
    pub fn with_status(&self, status: TaskStatus) -> Self {
        Self {
            status,
            ..self.clone()
        }
    }

    /// True when the task has a due date strictly before `now` and is not done.
    #[must_use]
    pub fn is_overdue(&self, now: OffsetDateTime) -> bool {
        self.status != TaskStatus::Done && self.due_date.is_some_and(|due| due < now)
    }
}

/// Caller-supplied fields for a new task.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewTask {
    /// Title, must not be blank.
    pub title: String,
    /// Description.
    pub description: String,
    /// Optional deadline.
    pub due_date: Option<OffsetDateTime>,
    /// Initial priority.
    pub priority: TaskPriority,
    /// Initial column.
    pub status: TaskStatus,
}

impl NewTask {
    /// New task with the given title and default everything else.
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    /// Stamp ownership and timestamps, producing an unsaved [`Task`].
    #[must_use]
    pub fn into_task(self, owner_id: UserId, now: OffsetDateTime) -> Task {
        Task {
            id: TaskId::default(),
            title: self.title.trim().to_owned(),
            description: self.description,
            due_date: self.due_date,
            status: self.status,
            priority: self.priority,
            owner_id,
            created_at: now,
            updated_at: now,
        }
    }
}
