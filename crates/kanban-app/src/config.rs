use std::{collections::BTreeMap, fs, path::Path};

use anyhow::{Context, Result, bail};
use kanban_core::{NullsOrder, TaskStatus};
use serde::Deserialize;

/// Directory holding project-local configuration and data.
pub const CONFIG_DIR: &str = ".kanban";
const CONFIG_FILE: &str = "config.toml";

const DEFAULT_TASKS_COLLECTION: &str = "tasks";
const DEFAULT_USERS_COLLECTION: &str = "users";
const DEFAULT_REMINDER_WINDOW_HOURS: u32 = 24;

/// Top-level configuration loaded from `.kanban/config.toml`.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ProjectConfig {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub board: BoardConfig,
}

impl ProjectConfig {
    /// Load configuration from `<workdir>/.kanban/config.toml`, or defaults if absent.
    pub fn from_workdir(workdir: impl AsRef<Path>) -> Result<Self> {
        let config_path = workdir.as_ref().join(CONFIG_DIR).join(CONFIG_FILE);
        if !config_path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&config_path)
            .with_context(|| format!("failed to read {}", config_path.display()))?;
        Self::parse(&contents).with_context(|| format!("failed to parse {}", config_path.display()))
    }

    /// Parse and validate configuration text.
    pub fn parse(contents: &str) -> Result<Self> {
        let config: Self = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        self.store.ensure_distinct_collections()?;
        self.board.ensure_known_columns()
    }
}

/// Where tasks and profiles live in the document store.
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_tasks_collection")]
    pub tasks_collection: String,
    #[serde(default = "default_users_collection")]
    pub users_collection: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            tasks_collection: default_tasks_collection(),
            users_collection: default_users_collection(),
        }
    }
}

impl StoreConfig {
    fn ensure_distinct_collections(&self) -> Result<()> {
        if self.tasks_collection.trim().is_empty() || self.users_collection.trim().is_empty() {
            bail!("collection names must not be empty");
        }
        if self.tasks_collection == self.users_collection {
            bail!(
                "tasks and users must use different collections (both are '{}')",
                self.tasks_collection
            );
        }
        Ok(())
    }
}

fn default_tasks_collection() -> String {
    DEFAULT_TASKS_COLLECTION.to_owned()
}

fn default_users_collection() -> String {
    DEFAULT_USERS_COLLECTION.to_owned()
}

/// Board presentation and ordering.
#[derive(Debug, Clone, Deserialize)]
pub struct BoardConfig {
    /// Placement of undated tasks within each column.
    #[serde(default)]
    pub due_date_nulls: NullsOrder,
    /// Look-ahead for due reminders, in hours.
    #[serde(default = "default_reminder_window_hours")]
    pub reminder_window_hours: u32,
    /// Column heading overrides keyed by status name.
    #[serde(default)]
    labels: BTreeMap<String, String>,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            due_date_nulls: NullsOrder::Last,
            reminder_window_hours: DEFAULT_REMINDER_WINDOW_HOURS,
            labels: BTreeMap::new(),
        }
    }
}

const fn default_reminder_window_hours() -> u32 {
    DEFAULT_REMINDER_WINDOW_HOURS
}

impl BoardConfig {
    /// Reminder look-ahead as a duration.
    #[must_use]
    pub fn reminder_window(&self) -> time::Duration {
        time::Duration::hours(i64::from(self.reminder_window_hours))
    }

    /// Heading for a column, honouring overrides.
    #[must_use]
    pub fn column_label(&self, status: TaskStatus) -> &str {
        self.labels
            .iter()
            .find(|(key, _)| key.parse::<TaskStatus>().ok() == Some(status))
            .map_or(status.label(), |(_, label)| label.as_str())
    }

    fn ensure_known_columns(&self) -> Result<()> {
        for key in self.labels.keys() {
            if key.parse::<TaskStatus>().is_err() {
                let known = TaskStatus::ALL.map(TaskStatus::as_str).join(", ");
                bail!("unknown column '{key}' in [board.labels]. Allowed values: {known}.");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn missing_config_returns_defaults() -> Result<()> {
        let dir = tempdir()?;
        let cfg = ProjectConfig::from_workdir(dir.path())?;
        assert_eq!(cfg.store.tasks_collection, "tasks");
        assert_eq!(cfg.store.users_collection, "users");
        assert_eq!(cfg.board.due_date_nulls, NullsOrder::Last);
        assert_eq!(cfg.board.reminder_window(), time::Duration::hours(24));
        assert_eq!(cfg.board.column_label(TaskStatus::Todo), "To Do");
        Ok(())
    }

    #[test]
    fn load_config_from_file() -> Result<()> {
        let dir = tempdir()?;
        let cfg_dir = dir.path().join(CONFIG_DIR);
        fs::create_dir_all(&cfg_dir)?;
        let mut file = fs::File::create(cfg_dir.join(CONFIG_FILE))?;
        writeln!(
            file,
            "[store]\ntasks_collection = \"cards\"\n\n\
             [board]\ndue_date_nulls = \"first\"\nreminder_window_hours = 48\n\n\
             [board.labels]\nIN_PROGRESS = \"Doing\""
        )?;

        let cfg = ProjectConfig::from_workdir(dir.path())?;
        assert_eq!(cfg.store.tasks_collection, "cards");
        assert_eq!(cfg.store.users_collection, "users");
        assert_eq!(cfg.board.due_date_nulls, NullsOrder::First);
        assert_eq!(cfg.board.reminder_window(), time::Duration::hours(48));
        assert_eq!(cfg.board.column_label(TaskStatus::InProgress), "Doing");
        assert_eq!(cfg.board.column_label(TaskStatus::Done), "Done");
        Ok(())
    }

    #[test]
    fn shared_collection_is_rejected() {
        let Err(err) = ProjectConfig::parse(
            "[store]\ntasks_collection = \"docs\"\nusers_collection = \"docs\"",
        ) else {
            panic!("shared collection should error");
        };
        assert!(err.to_string().contains("different collections"));
    }

    #[test]
    fn blank_collection_is_rejected() {
        let Err(err) = ProjectConfig::parse("[store]\ntasks_collection = \"  \"") else {
            panic!("blank collection should error");
        };
        assert!(err.to_string().contains("must not be empty"));
    }

    #[test]
    fn unknown_label_column_is_rejected() {
        let Err(err) = ProjectConfig::parse("[board.labels]\nBLOCKED = \"Stuck\"") else {
            panic!("unknown column should error");
        };
        let message = err.to_string();
        assert!(message.contains("unknown column 'BLOCKED'"));
        assert!(message.contains("TODO, IN_PROGRESS, DONE"));
    }

    #[test]
    fn bad_file_reports_its_path() -> Result<()> {
        let dir = tempdir()?;
        let cfg_dir = dir.path().join(CONFIG_DIR);
        fs::create_dir_all(&cfg_dir)?;
        fs::write(cfg_dir.join(CONFIG_FILE), "[board]\ndue_date_nulls = \"middle\"")?;

        let Err(err) = ProjectConfig::from_workdir(dir.path()) else {
            panic!("invalid null placement should error");
        };
        assert!(err.to_string().contains("failed to parse"));
        Ok(())
    }
}
