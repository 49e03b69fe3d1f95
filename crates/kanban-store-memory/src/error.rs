//! Error types for memory store operations.

use thiserror::Error;

/// Errors that can occur during `MemoryStore` operations.
#[derive(Error, Debug)]
pub enum MemoryStoreError {
    /// Document does not exist.
    #[error("Document not found: {collection}/{id}")]
    NotFound {
        /// Collection that was searched.
        collection: String,
        /// Requested document id.
        id: String,
    },

    /// Write rejected by access rules.
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// Store could not be reached.
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// I/O operation on the backing file failed.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Backing file could not be (de)serialized.
    #[error("Failed to (de)serialize store file: {0}")]
    Serde(#[from] serde_json::Error),
}
