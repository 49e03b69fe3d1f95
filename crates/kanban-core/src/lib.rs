//! Domain types & document codec for the kanban sync core.

/// Task document encoding/decoding.
pub mod codec;
/// Store-neutral document model.
pub mod document;
/// Identifier types.
pub mod id;
/// Store query description.
pub mod query;
/// Status and priority enums.
pub mod status;
/// Listener types for live queries.
pub mod subscription;
/// Task entity.
pub mod task;
/// User profile entity.
pub mod user;
/// Input validators.
pub mod validate;

pub use codec::{decode, encode};
pub use document::{Document, DocumentSnapshot, FieldValue};
pub use id::{TaskId, UserId};
pub use query::{Direction, NullsOrder, OrderBy, Query};
pub use status::{ParseEnumError, TaskPriority, TaskStatus};
pub use subscription::{SnapshotEvent, SnapshotListener, SubscriptionId};
pub use task::{NewTask, Task};
pub use user::{User, UserPreference, decode_user, encode_user};
