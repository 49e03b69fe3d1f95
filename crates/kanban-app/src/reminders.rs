//! Due-date reminders computed from the board.

use kanban_core::{Task, TaskId, TaskStatus};
use time::{Duration, OffsetDateTime};

/// A task worth nudging the user about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reminder {
    /// Task the reminder refers to.
    pub task_id: TaskId,
    /// Title at the time of evaluation.
    pub title: String,
    /// Due date.
    pub due: OffsetDateTime,
    /// Already past due.
    pub overdue: bool,
}

/// Open tasks that are overdue or due within `window` of `now`, soonest first.
///
/// A window reaching past the representable range has no upper bound.
#[must_use]
pub fn due_reminders(tasks: &[Task], now: OffsetDateTime, window: Duration) -> Vec<Reminder> {
    let horizon = now.checked_add(window);
    let mut reminders: Vec<Reminder> = tasks
        .iter()
        .filter(|task| task.status != TaskStatus::Done)
        .filter_map(|task| {
            let due = task.due_date?;
            horizon.is_none_or(|horizon| due <= horizon).then(|| Reminder {
                task_id: task.id.clone(),
                title: task.title.clone(),
                due,
                overdue: due < now,
            })
        })
        .collect();
    reminders.sort_by(|a, b| a.due.cmp(&b.due).then_with(|| a.task_id.cmp(&b.task_id)));
    reminders
}
