//! Async seam between the sync core and a document store.

use kanban_core::{Document, Query, SnapshotListener, SubscriptionId};
use kanban_store_memory::{MemoryStore, MemoryStoreError};
use thiserror::Error;

use crate::error::SyncError;

/// Store failure, classified the way the sync core cares about.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteError {
    /// Target document is absent.
    #[error("{collection}/{id} not found")]
    NotFound {
        /// Collection searched.
        collection: String,
        /// Document id.
        id: String,
    },

    /// Access rules rejected the request.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// Store unreachable or failed for another reason.
    #[error("unavailable: {0}")]
    Unavailable(String),
}

impl RemoteError {
    /// Map into the caller-facing taxonomy.
    #[must_use]
    pub fn into_sync_error(self) -> SyncError {
        match self {
            Self::NotFound { collection, id } => SyncError::NotFound(format!("{collection}/{id}")),
            other => SyncError::Remote(other.to_string()),
        }
    }
}

/// Convert a store-specific error into the shared taxonomy.
pub(crate) fn classify<E: Into<RemoteError>>(err: E) -> RemoteError {
    err.into()
}

/// Document store consumed by the sync core.
///
/// Subscriptions are synchronous registrations whose listener the store
/// invokes serially; mutations are async requests that each resolve
/// independently.
#[allow(async_fn_in_trait)]
pub trait RemoteStore: Send + Sync {
    /// Error type bubbled up from the backing store.
    type Error: Into<RemoteError> + Send;

    /// Register a live query.
    ///
    /// # Errors
    /// Returns a store-specific error when registration fails.
    fn subscribe(
        &self,
        query: Query,
        listener: SnapshotListener,
    ) -> Result<SubscriptionId, Self::Error>;

    /// Cancel a live query. Unknown ids are ignored.
    fn unsubscribe(&self, id: SubscriptionId);

    /// Insert a document and return its assigned id.
    ///
    /// # Errors
    /// Returns a store-specific error when the write fails.
    async fn insert(&self, collection: &str, document: Document) -> Result<String, Self::Error>;

    /// Merge fields into an existing document.
    ///
    /// # Errors
    /// Returns a not-found error when the document is absent.
    async fn update(&self, collection: &str, id: &str, fields: Document) -> Result<(), Self::Error>;

    /// Delete a document.
    ///
    /// # Errors
    /// Returns a store-specific error when the write fails.
    async fn delete(&self, collection: &str, id: &str) -> Result<(), Self::Error>;

    /// Read a single document.
    ///
    /// # Errors
    /// Returns a store-specific error when the read fails.
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, Self::Error>;

    /// Create or overwrite a document under a known id.
    ///
    /// # Errors
    /// Returns a store-specific error when the write fails.
    async fn set(&self, collection: &str, id: &str, document: Document) -> Result<(), Self::Error>;
}

impl From<MemoryStoreError> for RemoteError {
    fn from(err: MemoryStoreError) -> Self {
        match err {
            MemoryStoreError::NotFound { collection, id } => Self::NotFound { collection, id },
            MemoryStoreError::PermissionDenied(msg) => Self::PermissionDenied(msg),
            other => Self::Unavailable(other.to_string()),
        }
    }
}

impl RemoteStore for MemoryStore {
    type Error = MemoryStoreError;

    fn subscribe(
        &self,
        query: Query,
        listener: SnapshotListener,
    ) -> Result<SubscriptionId, Self::Error> {
        Ok(Self::subscribe(self, query, listener))
    }

    fn unsubscribe(&self, id: SubscriptionId) {
        Self::unsubscribe(self, id);
    }

    async fn insert(&self, collection: &str, document: Document) -> Result<String, Self::Error> {
        Self::insert(self, collection, document)
    }

    async fn update(
        &self,
        collection: &str,
        id: &str,
        fields: Document,
    ) -> Result<(), Self::Error> {
        Self::update(self, collection, id, fields)
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), Self::Error> {
        Self::delete(self, collection, id)
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, Self::Error> {
        Self::get(self, collection, id)
    }

    async fn set(&self, collection: &str, id: &str, document: Document) -> Result<(), Self::Error> {
        Self::set(self, collection, id, document)
    }
}
