//! Conversion between [`Task`] and the store document layout.
//!
//! Decoding is lenient: a missing or mistyped field yields its default so
//! partially written or legacy documents still show up on the board.

use crate::document::{Document, FieldValue};
use crate::id::{TaskId, UserId};
use crate::status::{TaskPriority, TaskStatus};
use crate::task::Task;
use time::OffsetDateTime;

/// Document field holding the title.
pub const FIELD_TITLE: &str = "title";
/// Document field holding the description.
pub const FIELD_DESCRIPTION: &str = "description";
/// Document field holding the due date (timestamp or null).
pub const FIELD_DUE_DATE: &str = "dueDate";
/// Document field holding the status name.
pub const FIELD_STATUS: &str = "status";
/// Document field holding the priority name.
pub const FIELD_PRIORITY: &str = "priority";
/// Document field holding the owner id.
pub const FIELD_OWNER: &str = "userId";
/// Document field holding the creation timestamp.
pub const FIELD_CREATED_AT: &str = "createdAt";
/// Document field holding the last update timestamp.
pub const FIELD_UPDATED_AT: &str = "updatedAt";

/// Encode a task into its document fields. The id is not part of the body.
#[must_use]
pub fn encode(task: &Task) -> Document {
    let mut doc = Document::new();
    doc.insert(FIELD_TITLE.into(), FieldValue::from(task.title.as_str()));
    doc.insert(
        FIELD_DESCRIPTION.into(),
        FieldValue::from(task.description.as_str()),
    );
    doc.insert(FIELD_DUE_DATE.into(), FieldValue::from(task.due_date));
    doc.insert(FIELD_STATUS.into(), FieldValue::from(task.status.as_str()));
    doc.insert(
        FIELD_PRIORITY.into(),
        FieldValue::from(task.priority.as_str()),
    );
    doc.insert(FIELD_OWNER.into(), FieldValue::from(task.owner_id.as_str()));
    doc.insert(FIELD_CREATED_AT.into(), FieldValue::from(task.created_at));
    doc.insert(FIELD_UPDATED_AT.into(), FieldValue::from(task.updated_at));
    doc
}

/// Decode a stored document. Never fails.
#[must_use]
pub fn decode(doc: &Document, id: &str) -> Task {
    decode_at(doc, id, OffsetDateTime::now_utc())
}

/// Decode using `now` as the fallback for missing timestamps.
#[must_use]
pub fn decode_at(doc: &Document, id: &str, now: OffsetDateTime) -> Task {
    Task {
        id: TaskId::from(id),
        title: string_field(doc, FIELD_TITLE),
        description: string_field(doc, FIELD_DESCRIPTION),
        due_date: doc.get(FIELD_DUE_DATE).and_then(FieldValue::as_timestamp),
        status: doc
            .get(FIELD_STATUS)
            .and_then(FieldValue::as_str)
            .and_then(|raw| raw.parse::<TaskStatus>().ok())
            .unwrap_or_default(),
        priority: doc
            .get(FIELD_PRIORITY)
            .and_then(FieldValue::as_str)
            .and_then(|raw| raw.parse::<TaskPriority>().ok())
            .unwrap_or_default(),
        owner_id: UserId::from(string_field(doc, FIELD_OWNER)),
        created_at: timestamp_field(doc, FIELD_CREATED_AT).unwrap_or(now),
        updated_at: timestamp_field(doc, FIELD_UPDATED_AT).unwrap_or(now),
    }
}

pub(crate) fn string_field(doc: &Document, field: &str) -> String {
    doc.get(field)
        .and_then(FieldValue::as_str)
        .map(str::to_owned)
        .unwrap_or_default()
}

fn timestamp_field(doc: &Document, field: &str) -> Option<OffsetDateTime> {
    doc.get(field).and_then(FieldValue::as_timestamp)
}
