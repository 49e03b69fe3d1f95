//! CLI entry point for the kanban board.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use kanban_core::{TaskPriority, TaskStatus};
use tracing_subscriber::{EnvFilter, fmt::format::FmtSpan};

mod commands;

/// Personal kanban board kept in sync with a document store.
#[derive(Parser, Debug)]
#[command(
    name = "kanban",
    version,
    about = "kanban: a three-column task board over a live document store"
)]
struct Cli {
    /// Store file (defaults to the user data directory).
    #[arg(long, global = true)]
    data: Option<PathBuf>,

    /// Signed-in user id (falls back to KANBAN_USER).
    #[arg(long, global = true)]
    user: Option<String>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the board, one section per column.
    Board {
        /// Only show one column.
        #[arg(long)]
        status: Option<TaskStatus>,
    },

    /// Create a task.
    New {
        #[arg(long)]
        title: String,
        #[arg(long)]
        description: Option<String>,
        /// RFC 3339 timestamp or YYYY-MM-DD.
        #[arg(long)]
        due: Option<String>,
        #[arg(long, default_value = "MEDIUM")]
        priority: TaskPriority,
        #[arg(long, default_value = "TODO")]
        status: TaskStatus,
    },

    /// Change fields of an existing task.
    Edit {
        task: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long, conflicts_with = "clear_due")]
        due: Option<String>,
        /// Remove the due date.
        #[arg(long)]
        clear_due: bool,
        #[arg(long)]
        priority: Option<TaskPriority>,
    },

    /// Move a task to another column.
    Move { task: String, status: TaskStatus },

    /// Delete a task.
    Rm { task: String },

    /// List overdue tasks and tasks due soon.
    Due {
        /// Look-ahead in hours (defaults to the configured window).
        #[arg(long)]
        hours: Option<u32>,
    },

    /// Create the profile of the signed-in user.
    Signup {
        #[arg(long)]
        email: String,
        #[arg(long)]
        name: String,
    },

    /// Show or change profile preferences.
    Prefs {
        #[arg(long)]
        dark_mode: Option<bool>,
        #[arg(long)]
        notifications: Option<bool>,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        push_token: Option<String>,
    },
}

fn main() -> Result<()> {
    let Cli { data, user, cmd } = Cli::parse();
    install_tracing();

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async move {
        let workspace = commands::Workspace::open(".", data, user.as_deref())?;
        commands::run(cmd, &workspace).await
    })
}

fn install_tracing() {
    // RUST_LOG is honoured; INFO otherwise.
    let filter = EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into());
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_span_events(FmtSpan::NONE)
        .compact()
        .with_writer(std::io::stderr)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_new_command() {
        let cli = Cli::parse_from([
            "kanban",
            "--user",
            "alice",
            "new",
            "--title",
            "Write report",
            "--priority",
            "low",
            "--due",
            "2025-07-01",
        ]);

        assert_eq!(cli.user.as_deref(), Some("alice"));
        match cli.cmd {
            Command::New {
                title,
                priority,
                status,
                due,
                ..
            } => {
                assert_eq!(title, "Write report");
                assert_eq!(priority, TaskPriority::Low);
                assert_eq!(status, TaskStatus::Todo);
                assert_eq!(due.as_deref(), Some("2025-07-01"));
            }
            _ => panic!("expected new command"),
        }
    }

    #[test]
    fn parse_move_command_with_trailing_globals() {
        let cli = Cli::parse_from(["kanban", "move", "t1", "in_progress", "--data", "/tmp/b.json"]);
        assert_eq!(cli.data, Some(PathBuf::from("/tmp/b.json")));
        match cli.cmd {
            Command::Move { task, status } => {
                assert_eq!(task, "t1");
                assert_eq!(status, TaskStatus::InProgress);
            }
            _ => panic!("expected move command"),
        }
    }

    #[test]
    fn unknown_status_is_rejected() {
        assert!(Cli::try_parse_from(["kanban", "move", "t1", "BLOCKED"]).is_err());
    }

    #[test]
    fn due_and_clear_due_conflict() {
        assert!(
            Cli::try_parse_from(["kanban", "edit", "t1", "--due", "2025-01-01", "--clear-due"])
                .is_err()
        );
    }

    #[test]
    fn parse_prefs_command() {
        let cli = Cli::parse_from(["kanban", "prefs", "--dark-mode", "true", "--name", "Ann"]);
        match cli.cmd {
            Command::Prefs {
                dark_mode,
                notifications,
                name,
                push_token,
            } => {
                assert_eq!(dark_mode, Some(true));
                assert_eq!(notifications, None);
                assert_eq!(name.as_deref(), Some("Ann"));
                assert_eq!(push_token, None);
            }
            _ => panic!("expected prefs command"),
        }
    }
}
