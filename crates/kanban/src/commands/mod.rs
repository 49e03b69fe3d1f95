use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use kanban_app::config::CONFIG_DIR;
use kanban_app::{
    ProjectConfig, SessionIdentity, SyncSettings, TaskSync, UserProfiles, user_from_param_or_env,
};
use kanban_core::UserId;
use kanban_store_memory::MemoryStore;
use tracing::debug;

use crate::Command;

mod handlers;

const STORE_FILE: &str = "store.json";

type Identity = Arc<SessionIdentity>;

/// Everything a command needs: configuration, the sync core and profiles.
pub struct Workspace {
    config: ProjectConfig,
    user: Option<UserId>,
    sync: TaskSync<MemoryStore, Identity>,
    profiles: UserProfiles<MemoryStore, Identity>,
}

impl Workspace {
    /// Resolve the user from `user` or `KANBAN_USER`, then [`Workspace::open_as`].
    pub fn open(
        workdir: impl AsRef<Path>,
        data: Option<PathBuf>,
        user: Option<&str>,
    ) -> Result<Self> {
        Self::open_as(workdir, data, user_from_param_or_env(user))
    }

    /// Load `<workdir>/.kanban/config.toml` and open the store file as `user`.
    pub fn open_as(
        workdir: impl AsRef<Path>,
        data: Option<PathBuf>,
        user: Option<UserId>,
    ) -> Result<Self> {
        let config = ProjectConfig::from_workdir(workdir)?;
        let path = data.unwrap_or_else(default_data_path);
        debug!(path = %path.display(), "Opening store");
        let store = Arc::new(
            MemoryStore::open(&path)
                .with_context(|| format!("failed to open store {}", path.display()))?,
        );

        let identity: Identity = Arc::new(
            user.clone()
                .map_or_else(SessionIdentity::signed_out, SessionIdentity::signed_in),
        );
        let sync = TaskSync::with_settings(
            Arc::clone(&store),
            Arc::clone(&identity),
            SyncSettings::from(&config),
        );
        let profiles = UserProfiles::with_config(store, identity, &config);

        Ok(Self {
            config,
            user,
            sync,
            profiles,
        })
    }
}

fn default_data_path() -> PathBuf {
    dirs::data_dir()
        .map_or_else(|| PathBuf::from(CONFIG_DIR), |dir| dir.join("kanban"))
        .join(STORE_FILE)
}

/// Execute one CLI command.
pub async fn run(command: Command, workspace: &Workspace) -> Result<()> {
    match command {
        Command::Board { status } => handlers::board(workspace, status),
        Command::New {
            title,
            description,
            due,
            priority,
            status,
        } => {
            let input = handlers::NewInput {
                title,
                description,
                due,
                priority,
                status,
            };
            handlers::new(workspace, input).await
        }
        Command::Edit {
            task,
            title,
            description,
            due,
            clear_due,
            priority,
        } => {
            let input = handlers::EditInput {
                title,
                description,
                due,
                clear_due,
                priority,
            };
            handlers::edit(workspace, &task, input).await
        }
        Command::Move { task, status } => handlers::move_task(workspace, &task, status).await,
        Command::Rm { task } => handlers::remove(workspace, &task).await,
        Command::Due { hours } => handlers::due(workspace, hours),
        Command::Signup { email, name } => handlers::signup(workspace, &email, &name).await,
        Command::Prefs {
            dark_mode,
            notifications,
            name,
            push_token,
        } => {
            let input = handlers::PrefsInput {
                dark_mode,
                notifications,
                name,
                push_token,
            };
            handlers::prefs(workspace, input).await
        }
    }
}
