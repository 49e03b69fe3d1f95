//! Canonical task list and the status columns derived from it.

use std::sync::Arc;

use kanban_core::{Task, TaskId, TaskStatus};

/// Immutable snapshot of the signed-in user's tasks in store order.
///
/// Cloning is cheap; a new board replaces the old one wholesale, so holders
/// of an older clone keep a consistent view.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskBoard {
    tasks: Arc<[Task]>,
}

impl TaskBoard {
    /// Wrap tasks already in canonical order.
    #[must_use]
    pub fn from_tasks(tasks: Vec<Task>) -> Self {
        Self {
            tasks: tasks.into(),
        }
    }

    /// All tasks in canonical order.
    #[must_use]
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// Number of tasks across all columns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// True when the board holds no tasks.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Tasks of one column, canonical order preserved.
    #[must_use]
    pub fn column(&self, status: TaskStatus) -> Vec<Task> {
        tasks_with_status(&self.tasks, status)
    }

    /// Every column in board order.
    #[must_use]
    pub fn columns(&self) -> Vec<(TaskStatus, Vec<Task>)> {
        TaskStatus::ALL
            .into_iter()
            .map(|status| (status, self.column(status)))
            .collect()
    }

    /// Number of tasks in one column.
    #[must_use]
    pub fn count(&self, status: TaskStatus) -> usize {
        self.tasks.iter().filter(|task| task.status == status).count()
    }

    /// Look a task up by id.
    #[must_use]
    pub fn find(&self, id: &TaskId) -> Option<&Task> {
        self.tasks.iter().find(|task| &task.id == id)
    }
}

/// Pure status filter preserving input order.
#[must_use]
pub fn tasks_with_status(tasks: &[Task], status: TaskStatus) -> Vec<Task> {
    tasks
        .iter()
        .filter(|task| task.status == status)
        .cloned()
        .collect()
}
