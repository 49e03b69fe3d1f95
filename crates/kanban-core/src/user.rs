use crate::codec::string_field;
use crate::document::{Document, FieldValue};
use crate::id::UserId;
use serde::{Deserialize, Serialize};

const FIELD_EMAIL: &str = "email";
const FIELD_NAME: &str = "name";
const FIELD_DARK_MODE: &str = "darkMode";
const FIELD_NOTIFICATIONS: &str = "notificationsEnabled";
const FIELD_PUSH_TOKEN: &str = "fcmToken";

/// Profile and preference record of a signed-up user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Identity-provider id; also the profile document id.
    pub id: UserId,
    /// Sign-up email.
    pub email: String,
    /// Name shown in the app.
    pub display_name: String,
    /// Dark theme preference.
    pub dark_mode_enabled: bool,
    /// Whether push reminders are wanted.
    pub notifications_enabled: bool,
    /// Latest push registration token, if any.
    pub push_token: Option<String>,
}

impl User {
    /// Fresh profile as written at sign-up.
    pub fn new(id: UserId, email: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id,
            email: email.into(),
            display_name: display_name.into(),
            dark_mode_enabled: false,
            notifications_enabled: true,
            push_token: None,
        }
    }

    /// Apply a preference change in place.
    pub fn apply(&mut self, preference: &UserPreference) {
        match preference {
            UserPreference::DarkMode(enabled) => self.dark_mode_enabled = *enabled,
            UserPreference::NotificationsEnabled(enabled) => self.notifications_enabled = *enabled,
            UserPreference::DisplayName(name) => self.display_name.clone_from(name),
        }
    }
}

/// A single preference update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserPreference {
    /// Toggle the dark theme.
    DarkMode(bool),
    /// Toggle push reminders.
    NotificationsEnabled(bool),
    /// Rename the user.
    DisplayName(String),
}

impl UserPreference {
    /// The partial document written for this preference.
    #[must_use]
    pub fn to_fields(&self) -> Document {
        let (field, value) = match self {
            Self::DarkMode(enabled) => (FIELD_DARK_MODE, FieldValue::Bool(*enabled)),
            Self::NotificationsEnabled(enabled) => {
                (FIELD_NOTIFICATIONS, FieldValue::Bool(*enabled))
            }
            Self::DisplayName(name) => (FIELD_NAME, FieldValue::from(name.as_str())),
        };
        Document::from([(field.to_owned(), value)])
    }
}

/// Document fields holding a push token.
#[must_use]
pub fn push_token_fields(token: &str) -> Document {
    Document::from([(FIELD_PUSH_TOKEN.to_owned(), FieldValue::from(token))])
}

/// Encode a profile. The id is the document key, not a field.
#[must_use]
pub fn encode_user(user: &User) -> Document {
    let mut doc = Document::new();
    doc.insert(FIELD_EMAIL.into(), FieldValue::from(user.email.as_str()));
    doc.insert(FIELD_NAME.into(), FieldValue::from(user.display_name.as_str()));
    doc.insert(FIELD_DARK_MODE.into(), FieldValue::Bool(user.dark_mode_enabled));
    doc.insert(
        FIELD_NOTIFICATIONS.into(),
        FieldValue::Bool(user.notifications_enabled),
    );
    doc.insert(
        FIELD_PUSH_TOKEN.into(),
        user.push_token
            .as_deref()
            .map_or(FieldValue::Null, FieldValue::from),
    );
    doc
}

/// Decode a profile, defaulting anything missing.
#[must_use]
pub fn decode_user(doc: &Document, id: &str) -> User {
    User {
        id: UserId::from(id),
        email: string_field(doc, FIELD_EMAIL),
        display_name: string_field(doc, FIELD_NAME),
        dark_mode_enabled: doc
            .get(FIELD_DARK_MODE)
            .and_then(FieldValue::as_bool)
            .unwrap_or(false),
        notifications_enabled: doc
            .get(FIELD_NOTIFICATIONS)
            .and_then(FieldValue::as_bool)
            .unwrap_or(true),
        push_token: doc
            .get(FIELD_PUSH_TOKEN)
            .and_then(FieldValue::as_str)
            .map(str::to_owned),
    }
}
