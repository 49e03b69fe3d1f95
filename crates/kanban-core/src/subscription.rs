//! Real-time listener plumbing shared by stores and the sync core.

use crate::document::DocumentSnapshot;
use std::fmt;
use std::sync::Arc;

/// Handle for one registered listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionId(pub u64);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

/// What a listener receives on every change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnapshotEvent {
    /// Complete, ordered result set of the query.
    Documents(Vec<DocumentSnapshot>),
    /// The subscription failed; the message is user-presentable.
    Failed(String),
}

/// Callback invoked serially by the store for a subscription.
pub type SnapshotListener = Arc<dyn Fn(SnapshotEvent) + Send + Sync>;
