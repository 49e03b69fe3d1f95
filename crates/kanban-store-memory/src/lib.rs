//! In-process document store with live queries for kanban-sync.
//!
//! Documents live in named collections behind a mutex. Every write
//! re-evaluates the queries of registered listeners on the touched collection
//! and delivers the complete result set to them. Listener callbacks run
//! outside the data lock but are serialized with respect to each other, so
//! they may read from the store but must not write to it.

mod error;

pub use error::MemoryStoreError;

use kanban_core::{Document, Query, SnapshotEvent, SnapshotListener, SubscriptionId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Result alias for store operations.
pub type Result<T> = std::result::Result<T, MemoryStoreError>;

type Collections = BTreeMap<String, BTreeMap<String, Document>>;

struct Listener {
    query: Query,
    callback: SnapshotListener,
}

#[derive(Default)]
struct State {
    collections: Collections,
    listeners: BTreeMap<SubscriptionId, Listener>,
    next_subscription: u64,
    pending_failure: Option<MemoryStoreError>,
}

#[derive(Deserialize, Default)]
struct StoreFile {
    collections: Collections,
}

#[derive(Serialize)]
struct StoreFileRef<'a> {
    collections: &'a Collections,
}

type Delivery = Vec<(SnapshotListener, SnapshotEvent)>;

/// Document store with real-time query listeners.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
    delivery: Mutex<()>,
    path: Option<PathBuf>,
}

impl MemoryStore {
    /// Empty, purely in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a store persisted as JSON at `path`, creating it on first write.
    ///
    /// # Errors
    /// Returns an error if an existing file cannot be read or parsed.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let collections = if path.exists() {
            let raw = fs::read_to_string(&path)?;
            let file: StoreFile = serde_json::from_str(&raw)?;
            info!(path = %path.display(), "Loaded store file");
            file.collections
        } else {
            Collections::new()
        };
        Ok(Self {
            state: Mutex::new(State {
                collections,
                ..State::default()
            }),
            delivery: Mutex::new(()),
            path: Some(path),
        })
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn delivery(&self) -> MutexGuard<'_, ()> {
        self.delivery.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a listener. The current result set is delivered before this returns.
    pub fn subscribe(&self, query: Query, callback: SnapshotListener) -> SubscriptionId {
        let _serial = self.delivery();
        let (id, initial) = {
            let mut state = self.state();
            state.next_subscription += 1;
            let id = SubscriptionId(state.next_subscription);
            let initial = Self::snapshot_of(&state.collections, &query);
            state.listeners.insert(
                id,
                Listener {
                    query,
                    callback: SnapshotListener::clone(&callback),
                },
            );
            (id, initial)
        };
        debug!(%id, "Registered listener");
        callback(initial);
        id
    }

    /// Remove a listener. Returns false if it was not registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let removed = self.state().listeners.remove(&id).is_some();
        debug!(%id, removed, "Unregistered listener");
        removed
    }

    /// Number of registered listeners.
    pub fn active_subscriptions(&self) -> usize {
        self.state().listeners.len()
    }

    /// Insert a document under a fresh id.
    ///
    /// # Errors
    /// Returns an injected failure or a persistence error.
    pub fn insert(&self, collection: &str, document: Document) -> Result<String> {
        let id = Uuid::now_v7().simple().to_string();
        self.write(collection, |docs| {
            docs.insert(id.clone(), document);
            Ok(())
        })?;
        Ok(id)
    }

    /// Create or overwrite the document with the given id.
    ///
    /// # Errors
    /// Returns an injected failure or a persistence error.
    pub fn set(&self, collection: &str, id: &str, document: Document) -> Result<()> {
        self.write(collection, |docs| {
            docs.insert(id.to_owned(), document);
            Ok(())
        })
    }

    /// Merge `fields` into an existing document.
    ///
    /// # Errors
    /// Returns [`MemoryStoreError::NotFound`] if the document is absent.
    pub fn update(&self, collection: &str, id: &str, fields: Document) -> Result<()> {
        self.write(collection, |docs| {
            let doc = docs.get_mut(id).ok_or_else(|| MemoryStoreError::NotFound {
                collection: collection.to_owned(),
                id: id.to_owned(),
            })?;
            doc.extend(fields);
            Ok(())
        })
    }

    /// Delete a document. Deleting an absent document succeeds.
    ///
    /// # Errors
    /// Returns an injected failure or a persistence error.
    pub fn delete(&self, collection: &str, id: &str) -> Result<()> {
        self.write(collection, |docs| {
            if docs.remove(id).is_none() {
                debug!(collection, id, "Delete of absent document");
            }
            Ok(())
        })
    }

    /// Read one document.
    ///
    /// # Errors
    /// Returns an injected failure.
    pub fn get(&self, collection: &str, id: &str) -> Result<Option<Document>> {
        let mut state = self.state();
        if let Some(err) = state.pending_failure.take() {
            return Err(err);
        }
        Ok(state
            .collections
            .get(collection)
            .and_then(|docs| docs.get(id))
            .cloned())
    }

    /// Make the next read or write fail with `err`.
    pub fn fail_next_operation(&self, err: MemoryStoreError) {
        self.state().pending_failure = Some(err);
    }

    /// Deliver a failure to every listener on `collection`.
    pub fn broadcast_failure(&self, collection: &str, message: &str) {
        let _serial = self.delivery();
        let targets: Delivery = self
            .state()
            .listeners
            .values()
            .filter(|listener| listener.query.collection == collection)
            .map(|listener| {
                (
                    SnapshotListener::clone(&listener.callback),
                    SnapshotEvent::Failed(message.to_owned()),
                )
            })
            .collect();
        warn!(collection, listeners = targets.len(), "Broadcasting listener failure");
        Self::deliver(targets);
    }

    fn write<F>(&self, collection: &str, apply: F) -> Result<()>
    where
        F: FnOnce(&mut BTreeMap<String, Document>) -> Result<()>,
    {
        let _serial = self.delivery();
        let targets = {
            let mut state = self.state();
            if let Some(err) = state.pending_failure.take() {
                return Err(err);
            }
            let mut staged = state.collections.clone();
            apply(staged.entry(collection.to_owned()).or_default())?;
            self.persist(&staged)?;
            state.collections = staged;
            state
                .listeners
                .values()
                .filter(|listener| listener.query.collection == collection)
                .map(|listener| {
                    (
                        SnapshotListener::clone(&listener.callback),
                        Self::snapshot_of(&state.collections, &listener.query),
                    )
                })
                .collect::<Delivery>()
        };
        Self::deliver(targets);
        Ok(())
    }

    fn snapshot_of(collections: &Collections, query: &Query) -> SnapshotEvent {
        let docs = collections
            .get(&query.collection)
            .map(|docs| query.evaluate(docs))
            .unwrap_or_default();
        SnapshotEvent::Documents(docs)
    }

    fn deliver(targets: Delivery) {
        for (callback, event) in targets {
            callback(event);
        }
    }

    fn persist(&self, collections: &Collections) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        let file = StoreFileRef { collections };
        fs::write(path, serde_json::to_string_pretty(&file)?)?;
        debug!(path = %path.display(), "Persisted store file");
        Ok(())
    }
}
