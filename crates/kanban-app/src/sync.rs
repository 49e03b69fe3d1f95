//! Live synchronization between a document store and the local task board.
//!
//! One [`TaskSync`] owns at most one store subscription. Every snapshot the
//! store delivers replaces the canonical [`TaskBoard`] wholesale; per-status
//! [`StatusView`]s are derived from that board and never reach the store.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use kanban_core::codec::{FIELD_DUE_DATE, FIELD_OWNER, decode_at, encode};
use kanban_core::validate::is_valid_title;
use kanban_core::{
    Direction, NewTask, NullsOrder, Query, SnapshotEvent, SnapshotListener, SubscriptionId, Task,
    TaskId, TaskStatus, UserId,
};
use time::OffsetDateTime;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::board::TaskBoard;
use crate::config::ProjectConfig;
use crate::error::SyncError;
use crate::identity::IdentityProvider;
use crate::remote::{RemoteError, RemoteStore, classify};

/// Lifecycle of a sync session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncPhase {
    /// No subscription.
    Unsubscribed,
    /// Subscription registered, first snapshot pending.
    Subscribing,
    /// At least one snapshot applied.
    Active,
}

/// Store location and ordering used by a [`TaskSync`].
#[derive(Debug, Clone)]
pub struct SyncSettings {
    /// Collection holding task documents.
    pub tasks_collection: String,
    /// Placement of undated tasks.
    pub due_date_nulls: NullsOrder,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self::from(&ProjectConfig::default())
    }
}

impl From<&ProjectConfig> for SyncSettings {
    fn from(config: &ProjectConfig) -> Self {
        Self {
            tasks_collection: config.store.tasks_collection.clone(),
            due_date_nulls: config.board.due_date_nulls,
        }
    }
}

#[derive(Default)]
struct Session {
    generation: u64,
    live: Option<u64>,
    subscription: Option<SubscriptionId>,
    user: Option<UserId>,
}

struct Shared {
    session: Mutex<Session>,
    board: watch::Sender<TaskBoard>,
    phase: watch::Sender<SyncPhase>,
    errors: watch::Sender<Option<String>>,
    pending: watch::Sender<usize>,
}

impl Shared {
    fn new() -> Self {
        Self {
            session: Mutex::new(Session::default()),
            board: watch::channel(TaskBoard::default()).0,
            phase: watch::channel(SyncPhase::Unsubscribed).0,
            errors: watch::channel(None).0,
            pending: watch::channel(0).0,
        }
    }

    fn session(&self) -> MutexGuard<'_, Session> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Apply a store notification if it belongs to the live session.
    fn on_snapshot(&self, generation: u64, event: SnapshotEvent) {
        let session = self.session();
        if session.live != Some(generation) {
            debug!(generation, "Dropping snapshot from a stale session");
            return;
        }
        match event {
            SnapshotEvent::Documents(docs) => {
                let now = OffsetDateTime::now_utc();
                let tasks: Vec<Task> = docs
                    .iter()
                    .map(|doc| decode_at(&doc.fields, &doc.id, now))
                    .collect();
                debug!(generation, tasks = tasks.len(), "Applying snapshot");
                self.board.send_replace(TaskBoard::from_tasks(tasks));
                self.phase.send_replace(SyncPhase::Active);
                self.errors.send_replace(None);
            }
            SnapshotEvent::Failed(message) => {
                warn!(generation, %message, "Subscription failed; keeping last board");
                self.errors.send_replace(Some(message));
            }
        }
        drop(session);
    }

    fn begin_mutation(&self) -> PendingGuard<'_> {
        self.pending.send_modify(|count| *count += 1);
        PendingGuard(&self.pending)
    }
}

struct PendingGuard<'a>(&'a watch::Sender<usize>);

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.0.send_modify(|count| *count = count.saturating_sub(1));
    }
}

/// Live, read-only projection of one status column.
#[derive(Debug, Clone)]
pub struct StatusView {
    status: TaskStatus,
    board: watch::Receiver<TaskBoard>,
}

impl StatusView {
    /// Column this view filters on.
    #[must_use]
    pub const fn status(&self) -> TaskStatus {
        self.status
    }

    /// Current tasks of the column in canonical order.
    #[must_use]
    pub fn current(&self) -> Vec<Task> {
        self.board.borrow().column(self.status)
    }

    /// Whether the canonical board changed since the last read.
    #[must_use]
    pub fn has_changed(&self) -> bool {
        self.board.has_changed().unwrap_or(false)
    }

    /// Wait for the next canonical update and return the refreshed column.
    /// Returns `None` once the owning [`TaskSync`] is gone.
    pub async fn changed(&mut self) -> Option<Vec<Task>> {
        self.board.changed().await.ok()?;
        Some(self.board.borrow_and_update().column(self.status))
    }
}

/// Synchronizes the signed-in user's tasks with a document store.
pub struct TaskSync<S: RemoteStore, I: IdentityProvider> {
    store: Arc<S>,
    identity: I,
    settings: SyncSettings,
    shared: Arc<Shared>,
}

impl<S: RemoteStore, I: IdentityProvider> TaskSync<S, I> {
    /// Sync core with default collection names and ordering.
    pub fn new(store: Arc<S>, identity: I) -> Self {
        Self::with_settings(store, identity, SyncSettings::default())
    }

    /// Sync core with explicit settings.
    pub fn with_settings(store: Arc<S>, identity: I, settings: SyncSettings) -> Self {
        Self {
            store,
            identity,
            settings,
            shared: Arc::new(Shared::new()),
        }
    }

    /// Start (or restart) the live subscription for `user_id`.
    ///
    /// Any previous subscription is torn down first, so at most one is ever
    /// registered. The board is cleared when the user changes.
    ///
    /// # Errors
    /// [`SyncError::AuthRequired`] for a blank user id, [`SyncError::Remote`]
    /// when the store refuses the subscription.
    pub fn start(&self, user_id: impl Into<UserId>) -> Result<(), SyncError> {
        let user = user_id.into();
        if user.is_blank() {
            return Err(SyncError::AuthRequired);
        }

        let (generation, previous) = {
            let mut session = self.shared.session();
            session.generation += 1;
            let generation = session.generation;
            session.live = Some(generation);
            if session.user.as_ref() != Some(&user) {
                self.shared.board.send_replace(TaskBoard::default());
            }
            session.user = Some(user.clone());
            self.shared.phase.send_replace(SyncPhase::Subscribing);
            (generation, session.subscription.take())
        };
        if let Some(previous) = previous {
            debug!(%previous, "Tearing down previous subscription");
            self.store.unsubscribe(previous);
        }

        let query = self.task_query(&user);
        let subscription = match self.store.subscribe(query, self.listener(generation)) {
            Ok(subscription) => subscription,
            Err(err) => {
                let err = classify(err).into_sync_error();
                {
                    let mut session = self.shared.session();
                    if session.live == Some(generation) {
                        session.live = None;
                        self.shared.phase.send_replace(SyncPhase::Unsubscribed);
                    }
                }
                self.shared.errors.send_replace(Some(err.to_string()));
                return Err(err);
            }
        };

        let superseded = {
            let mut session = self.shared.session();
            if session.live == Some(generation) {
                session.subscription = Some(subscription);
                false
            } else {
                true
            }
        };
        if superseded {
            debug!(%subscription, "Session replaced while subscribing");
            self.store.unsubscribe(subscription);
        } else {
            info!(user = %user, %subscription, "Started task sync");
        }
        Ok(())
    }

    /// Start for whoever the identity provider reports as signed in.
    ///
    /// # Errors
    /// [`SyncError::AuthRequired`] when nobody is signed in.
    pub fn start_current_user(&self) -> Result<(), SyncError> {
        let user = self.require_user()?;
        self.start(user)
    }

    /// Cancel the live subscription. Safe to call repeatedly.
    pub fn stop(&self) {
        let previous = {
            let mut session = self.shared.session();
            session.live = None;
            self.shared.phase.send_replace(SyncPhase::Unsubscribed);
            session.subscription.take()
        };
        if let Some(previous) = previous {
            self.store.unsubscribe(previous);
            info!(subscription = %previous, "Stopped task sync");
        }
    }

    /// Current canonical board.
    #[must_use]
    pub fn board(&self) -> TaskBoard {
        self.shared.board.borrow().clone()
    }

    /// Live view of one status column, derived from the shared subscription.
    #[must_use]
    pub fn tasks_for_status(&self, status: TaskStatus) -> StatusView {
        StatusView {
            status,
            board: self.shared.board.subscribe(),
        }
    }

    /// Session lifecycle.
    #[must_use]
    pub fn phase(&self) -> watch::Receiver<SyncPhase> {
        self.shared.phase.subscribe()
    }

    /// Latest failure message, cleared by the next success.
    #[must_use]
    pub fn errors(&self) -> watch::Receiver<Option<String>> {
        self.shared.errors.subscribe()
    }

    /// Number of mutations in flight.
    #[must_use]
    pub fn pending(&self) -> watch::Receiver<usize> {
        self.shared.pending.subscribe()
    }

    /// Create a task owned by the signed-in user and return its id.
    ///
    /// The board picks the task up with the next snapshot, not before.
    ///
    /// # Errors
    /// [`SyncError::AuthRequired`], [`SyncError::Validation`] for a blank
    /// title, [`SyncError::Remote`] when the insert fails.
    pub async fn create_task(&self, fields: NewTask) -> Result<TaskId, SyncError> {
        let outcome = self.create_inner(fields).await;
        self.record(outcome)
    }

    async fn create_inner(&self, fields: NewTask) -> Result<TaskId, SyncError> {
        let owner = self.require_user()?;
        if !is_valid_title(&fields.title) {
            return Err(SyncError::Validation("title must not be empty".into()));
        }
        let task = fields.into_task(owner, OffsetDateTime::now_utc());

        let _pending = self.shared.begin_mutation();
        let id = self
            .store
            .insert(&self.settings.tasks_collection, encode(&task))
            .await
            .map_err(|err| classify(err).into_sync_error())?;
        debug!(task = %id, "Created task");
        Ok(TaskId::from(id))
    }

    /// Replace every field of an existing task, refreshing `updated_at`.
    ///
    /// Returns the task as written.
    ///
    /// # Errors
    /// [`SyncError::AuthRequired`], [`SyncError::Validation`] for a blank
    /// title, an unsaved task or a task owned by someone else,
    /// [`SyncError::NotFound`] when the task was deleted remotely,
    /// [`SyncError::Remote`] otherwise.
    pub async fn update_task(&self, task: &Task) -> Result<Task, SyncError> {
        let outcome = self.update_inner(task).await;
        self.record(outcome)
    }

    async fn update_inner(&self, task: &Task) -> Result<Task, SyncError> {
        let user = self.require_user()?;
        if task.id.is_unassigned() {
            return Err(SyncError::Validation("task has not been saved yet".into()));
        }
        if task.owner_id != user {
            return Err(SyncError::Validation(format!(
                "task {} belongs to another user",
                task.id
            )));
        }
        if !is_valid_title(&task.title) {
            return Err(SyncError::Validation("title must not be empty".into()));
        }

        let mut updated = task.clone();
        updated.updated_at = OffsetDateTime::now_utc();

        let _pending = self.shared.begin_mutation();
        self.store
            .update(&self.settings.tasks_collection, task.id.as_str(), encode(&updated))
            .await
            .map_err(|err| match classify(err) {
                RemoteError::NotFound { .. } => SyncError::NotFound(format!("task {}", task.id)),
                other => other.into_sync_error(),
            })?;
        debug!(task = %task.id, status = %updated.status, "Updated task");
        Ok(updated)
    }

    /// Move a task to another column. Every transition is allowed.
    ///
    /// # Errors
    /// Same as [`update_task`](Self::update_task).
    pub async fn change_status(&self, task: &Task, status: TaskStatus) -> Result<Task, SyncError> {
        self.update_task(&task.with_status(status)).await
    }

    /// Delete a task. Deleting a task that is already gone succeeds.
    ///
    /// # Errors
    /// [`SyncError::AuthRequired`], [`SyncError::Remote`] when the delete fails.
    pub async fn delete_task(&self, id: &TaskId) -> Result<(), SyncError> {
        let outcome = self.delete_inner(id).await;
        self.record(outcome)
    }

    async fn delete_inner(&self, id: &TaskId) -> Result<(), SyncError> {
        self.require_user()?;
        let _pending = self.shared.begin_mutation();
        match self
            .store
            .delete(&self.settings.tasks_collection, id.as_str())
            .await
            .map_err(classify)
        {
            Ok(()) | Err(RemoteError::NotFound { .. }) => {
                debug!(task = %id, "Deleted task");
                Ok(())
            }
            Err(other) => Err(other.into_sync_error()),
        }
    }

    fn require_user(&self) -> Result<UserId, SyncError> {
        self.identity
            .current_user_id()
            .filter(|user| !user.is_blank())
            .ok_or(SyncError::AuthRequired)
    }

    fn record<T>(&self, outcome: Result<T, SyncError>) -> Result<T, SyncError> {
        match &outcome {
            Ok(_) => {
                self.shared.errors.send_replace(None);
            }
            Err(err) => {
                warn!(error = %err, "Task mutation failed");
                self.shared.errors.send_replace(Some(err.to_string()));
            }
        }
        outcome
    }

    fn task_query(&self, user: &UserId) -> Query {
        Query::collection(self.settings.tasks_collection.as_str())
            .where_eq(FIELD_OWNER, user.as_str())
            .order_by(
                FIELD_DUE_DATE,
                Direction::Ascending,
                self.settings.due_date_nulls,
            )
    }

    fn listener(&self, generation: u64) -> SnapshotListener {
        let shared: Weak<Shared> = Arc::downgrade(&self.shared);
        Arc::new(move |event| {
            if let Some(shared) = shared.upgrade() {
                shared.on_snapshot(generation, event);
            }
        })
    }
}

impl<S: RemoteStore, I: IdentityProvider> Drop for TaskSync<S, I> {
    fn drop(&mut self) {
        self.stop();
    }
}
