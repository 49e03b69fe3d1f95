//! Application layer for the kanban board.
//!
//! Keeps a live, ordered copy of the signed-in user's tasks in sync with a
//! document store, derives per-status columns from it, and forwards task and
//! profile mutations to the store.

pub mod board;
pub mod config;
pub mod error;
pub mod identity;
pub mod profile;
pub mod reminders;
pub mod remote;
pub mod sync;

// Re-exports for convenience
pub use board::{TaskBoard, tasks_with_status};
pub use config::{BoardConfig, ProjectConfig, StoreConfig};
pub use error::SyncError;
pub use identity::{IdentityProvider, SessionIdentity, user_from_param_or_env};
pub use profile::UserProfiles;
pub use reminders::{Reminder, due_reminders};
pub use remote::{RemoteError, RemoteStore};
pub use sync::{StatusView, SyncPhase, SyncSettings, TaskSync};
