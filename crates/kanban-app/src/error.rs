//! Failure taxonomy surfaced by the sync core.

use thiserror::Error;

/// Errors returned by task and profile operations.
///
/// None of these are fatal: every one is recoverable by retrying the user
/// action once the cause is addressed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyncError {
    /// No signed-in user where one is required.
    #[error("sign in required")]
    AuthRequired,

    /// Caller-supplied fields were rejected before reaching the store.
    #[error("invalid input: {0}")]
    Validation(String),

    /// The mutation target no longer exists remotely, named as
    /// `task <id>` or `profile <user>`.
    #[error("{0} no longer exists")]
    NotFound(String),

    /// Transport, permission or unclassified store failure.
    #[error("remote store error: {0}")]
    Remote(String),
}
