use std::fmt::Write as _;

use anyhow::{Context, Result, anyhow};
use kanban_app::{BoardConfig, Reminder, SyncError, TaskBoard, due_reminders};
use kanban_core::{NewTask, Task, TaskId, TaskPriority, TaskStatus, User, UserPreference};
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, Duration, OffsetDateTime};

use super::Workspace;

pub struct NewInput {
    pub title: String,
    pub description: Option<String>,
    pub due: Option<String>,
    pub priority: TaskPriority,
    pub status: TaskStatus,
}

pub struct EditInput {
    pub title: Option<String>,
    pub description: Option<String>,
    pub due: Option<String>,
    pub clear_due: bool,
    pub priority: Option<TaskPriority>,
}

pub struct PrefsInput {
    pub dark_mode: Option<bool>,
    pub notifications: Option<bool>,
    pub name: Option<String>,
    pub push_token: Option<String>,
}

pub fn board(workspace: &Workspace, only: Option<TaskStatus>) -> Result<()> {
    workspace.sync.start_current_user()?;
    let board = workspace.sync.board();
    print!(
        "{}",
        render_board(&board, &workspace.config.board, only, OffsetDateTime::now_utc())
    );
    Ok(())
}

pub async fn new(workspace: &Workspace, input: NewInput) -> Result<()> {
    let NewInput {
        title,
        description,
        due,
        priority,
        status,
    } = input;
    let due_date = due.as_deref().map(parse_due).transpose()?;
    let id = workspace
        .sync
        .create_task(NewTask {
            title,
            description: description.unwrap_or_default(),
            due_date,
            priority,
            status,
        })
        .await?;
    println!("created task: {id}");
    Ok(())
}

pub async fn edit(workspace: &Workspace, id: &str, input: EditInput) -> Result<()> {
    let mut task = find_task(workspace, id)?;
    if let Some(title) = input.title {
        task.title = title.trim().to_owned();
    }
    if let Some(description) = input.description {
        task.description = description;
    }
    if input.clear_due {
        task.due_date = None;
    } else if let Some(due) = input.due.as_deref() {
        task.due_date = Some(parse_due(due)?);
    }
    if let Some(priority) = input.priority {
        task.priority = priority;
    }

    let updated = workspace.sync.update_task(&task).await?;
    println!("updated task: {}", updated.id);
    Ok(())
}

pub async fn move_task(workspace: &Workspace, id: &str, status: TaskStatus) -> Result<()> {
    let task = find_task(workspace, id)?;
    let from = task.status;
    let moved = workspace.sync.change_status(&task, status).await?;
    println!("moved task: {} ({from} -> {})", moved.id, moved.status);
    Ok(())
}

pub async fn remove(workspace: &Workspace, id: &str) -> Result<()> {
    workspace.sync.delete_task(&TaskId::from(id)).await?;
    println!("deleted task: {id}");
    Ok(())
}

pub fn due(workspace: &Workspace, hours: Option<u32>) -> Result<()> {
    workspace.sync.start_current_user()?;
    let window = hours.map_or_else(
        || workspace.config.board.reminder_window(),
        |hours| Duration::hours(i64::from(hours)),
    );
    let reminders = due_reminders(
        workspace.sync.board().tasks(),
        OffsetDateTime::now_utc(),
        window,
    );
    print!("{}", render_reminders(&reminders));
    Ok(())
}

pub async fn signup(workspace: &Workspace, email: &str, name: &str) -> Result<()> {
    let user = workspace.user.clone().ok_or(SyncError::AuthRequired)?;
    let profile = workspace.profiles.create_profile(user, email, name).await?;
    print!("{}", render_profile(&profile));
    Ok(())
}

pub async fn prefs(workspace: &Workspace, input: PrefsInput) -> Result<()> {
    let preferences = [
        input.dark_mode.map(UserPreference::DarkMode),
        input.notifications.map(UserPreference::NotificationsEnabled),
        input.name.map(UserPreference::DisplayName),
    ];
    for preference in preferences.into_iter().flatten() {
        workspace.profiles.update_preference(preference).await?;
    }
    if let Some(token) = input.push_token.as_deref() {
        workspace.profiles.register_push_token(token).await?;
    }

    match workspace.profiles.current_profile().await? {
        Some(profile) => print!("{}", render_profile(&profile)),
        None => println!("no profile yet; run `kanban signup` first"),
    }
    Ok(())
}

fn find_task(workspace: &Workspace, id: &str) -> Result<Task> {
    workspace.sync.start_current_user()?;
    workspace
        .sync
        .board()
        .find(&TaskId::from(id))
        .cloned()
        .ok_or_else(|| anyhow!("task {id} not found"))
}

/// Accept a full RFC 3339 timestamp or a bare `YYYY-MM-DD` (midnight UTC).
fn parse_due(raw: &str) -> Result<OffsetDateTime> {
    let raw = raw.trim();
    if let Ok(at) = OffsetDateTime::parse(raw, &Rfc3339) {
        return Ok(at);
    }
    let date = Date::parse(raw, format_description!("[year]-[month]-[day]"))
        .with_context(|| format!("invalid due date '{raw}' (expected YYYY-MM-DD or RFC 3339)"))?;
    Ok(date.midnight().assume_utc())
}

fn format_due(at: OffsetDateTime) -> String {
    at.format(&Rfc3339).unwrap_or_else(|_| at.date().to_string())
}

fn render_task(task: &Task, now: OffsetDateTime) -> String {
    let mut line = format!("- {}  {}  [{}]", task.id, task.title, task.priority);
    if let Some(due) = task.due_date {
        let _ = write!(line, "  due {}", format_due(due));
        if task.is_overdue(now) {
            line.push_str(" (overdue)");
        }
    }
    line
}

fn render_board(
    board: &TaskBoard,
    config: &BoardConfig,
    only: Option<TaskStatus>,
    now: OffsetDateTime,
) -> String {
    let mut out = String::new();
    for (status, tasks) in board.columns() {
        if only.is_some_and(|wanted| wanted != status) {
            continue;
        }
        let _ = writeln!(out, "{} ({})", config.column_label(status), tasks.len());
        for task in &tasks {
            let _ = writeln!(out, "{}", render_task(task, now));
        }
        out.push('\n');
    }
    out
}

fn render_reminders(reminders: &[Reminder]) -> String {
    if reminders.is_empty() {
        return "nothing due\n".to_owned();
    }
    let mut out = String::new();
    for reminder in reminders {
        let tag = if reminder.overdue { "OVERDUE" } else { "due" };
        let _ = writeln!(
            out,
            "{tag:<7} {}  {}  {}",
            format_due(reminder.due),
            reminder.task_id,
            reminder.title
        );
    }
    out
}

fn render_profile(user: &User) -> String {
    let on_off = |flag: bool| if flag { "on" } else { "off" };
    format!(
        "user: {}\nemail: {}\nname: {}\ndark mode: {}\nnotifications: {}\npush token: {}\n",
        user.id,
        user.email,
        user.display_name,
        on_off(user.dark_mode_enabled),
        on_off(user.notifications_enabled),
        user.push_token.as_deref().unwrap_or("-"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use kanban_app::ProjectConfig;
    use kanban_core::UserId;
    use time::macros::datetime;

    fn task(id: &str, status: TaskStatus, due: Option<OffsetDateTime>) -> Task {
        let mut task = NewTask {
            status,
            due_date: due,
            ..NewTask::titled(format!("task {id}"))
        }
        .into_task(UserId::from("alice"), datetime!(2025-01-01 0:00 UTC));
        task.id = TaskId::from(id);
        task
    }

    #[test]
    fn due_accepts_date_or_timestamp() -> Result<()> {
        assert_eq!(parse_due("2025-07-01")?, datetime!(2025-07-01 0:00 UTC));
        assert_eq!(
            parse_due("2025-07-01T09:30:00+02:00")?,
            datetime!(2025-07-01 7:30 UTC)
        );
        let Err(err) = parse_due("next tuesday") else {
            panic!("free text should not parse");
        };
        assert!(err.to_string().contains("invalid due date"));
        Ok(())
    }

    #[test]
    fn board_uses_configured_labels_and_flags_overdue() -> Result<()> {
        let config = ProjectConfig::parse("[board.labels]\nIN_PROGRESS = \"Doing\"")?;
        let board = TaskBoard::from_tasks(vec![
            task("a", TaskStatus::Todo, Some(datetime!(2025-03-01 0:00 UTC))),
            task("b", TaskStatus::InProgress, None),
        ]);

        let rendered = render_board(&board, &config.board, None, datetime!(2025-03-02 0:00 UTC));
        assert!(rendered.contains("To Do (1)"));
        assert!(rendered.contains("Doing (1)"));
        assert!(rendered.contains("Done (0)"));
        assert!(rendered.contains("- a  task a  [MEDIUM]  due 2025-03-01T00:00:00Z (overdue)"));

        let only_done = render_board(
            &board,
            &config.board,
            Some(TaskStatus::Done),
            datetime!(2025-03-02 0:00 UTC),
        );
        assert_eq!(only_done, "Done (0)\n\n");
        Ok(())
    }

    #[test]
    fn reminders_render_overdue_first() {
        let reminders = due_reminders(
            &[
                task("soon", TaskStatus::Todo, Some(datetime!(2025-03-02 6:00 UTC))),
                task("late", TaskStatus::Todo, Some(datetime!(2025-03-01 6:00 UTC))),
            ],
            datetime!(2025-03-01 12:00 UTC),
            Duration::hours(24),
        );
        let rendered = render_reminders(&reminders);
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("OVERDUE"));
        assert!(lines[1].starts_with("due"));
        assert_eq!(render_reminders(&[]), "nothing due\n");
    }
}
