//! User profile documents: sign-up record, preferences and push token.

use std::sync::Arc;

use kanban_core::user::push_token_fields;
use kanban_core::validate::{is_valid_email, is_valid_name};
use kanban_core::{User, UserId, UserPreference, decode_user, encode_user};
use tracing::{debug, info};

use crate::config::ProjectConfig;
use crate::error::SyncError;
use crate::identity::IdentityProvider;
use crate::remote::{RemoteError, RemoteStore, classify};

/// Profile operations for the signed-in user.
pub struct UserProfiles<S: RemoteStore, I: IdentityProvider> {
    store: Arc<S>,
    identity: I,
    collection: String,
}

impl<S: RemoteStore, I: IdentityProvider> UserProfiles<S, I> {
    /// Profiles stored in the default `users` collection.
    pub fn new(store: Arc<S>, identity: I) -> Self {
        Self::with_config(store, identity, &ProjectConfig::default())
    }

    /// Profiles stored where the project configuration says.
    pub fn with_config(store: Arc<S>, identity: I, config: &ProjectConfig) -> Self {
        Self {
            store,
            identity,
            collection: config.store.users_collection.clone(),
        }
    }

    /// Write the initial profile right after sign-up.
    ///
    /// # Errors
    /// [`SyncError::AuthRequired`] unless `id` is the signed-in user,
    /// [`SyncError::Validation`] for a malformed email or name,
    /// [`SyncError::Remote`] when the write fails.
    pub async fn create_profile(
        &self,
        id: impl Into<UserId>,
        email: &str,
        name: &str,
    ) -> Result<User, SyncError> {
        let id = id.into();
        if self.require_user()? != id {
            return Err(SyncError::AuthRequired);
        }
        let email = email.trim();
        let name = name.trim();
        if !is_valid_email(email) {
            return Err(SyncError::Validation(format!("invalid email '{email}'")));
        }
        if !is_valid_name(name) {
            return Err(SyncError::Validation(
                "name must be at least two letters".into(),
            ));
        }

        let user = User::new(id, email, name);
        self.store
            .set(&self.collection, user.id.as_str(), encode_user(&user))
            .await
            .map_err(|err| classify(err).into_sync_error())?;
        info!(user = %user.id, "Created profile");
        Ok(user)
    }

    /// Profile of the signed-in user, `None` if it was never created.
    ///
    /// # Errors
    /// [`SyncError::AuthRequired`], [`SyncError::Remote`] when the read fails.
    pub async fn current_profile(&self) -> Result<Option<User>, SyncError> {
        let user = self.require_user()?;
        let doc = self
            .store
            .get(&self.collection, user.as_str())
            .await
            .map_err(|err| classify(err).into_sync_error())?;
        Ok(doc.map(|doc| decode_user(&doc, user.as_str())))
    }

    /// Change one preference and return the updated profile.
    ///
    /// # Errors
    /// [`SyncError::AuthRequired`], [`SyncError::Validation`] for an invalid
    /// display name, [`SyncError::NotFound`] when no profile exists.
    pub async fn update_preference(&self, preference: UserPreference) -> Result<User, SyncError> {
        let user = self.require_user()?;
        if let UserPreference::DisplayName(name) = &preference
            && !is_valid_name(name.trim())
        {
            return Err(SyncError::Validation(
                "name must be at least two letters".into(),
            ));
        }
        let preference = match preference {
            UserPreference::DisplayName(name) => {
                UserPreference::DisplayName(name.trim().to_owned())
            }
            other => other,
        };

        let mut profile = self
            .current_profile()
            .await?
            .ok_or_else(|| SyncError::NotFound(format!("profile {user}")))?;
        self.merge(&user, preference.to_fields()).await?;
        profile.apply(&preference);
        debug!(user = %user, ?preference, "Updated preference");
        Ok(profile)
    }

    /// Store the device's push registration token on the profile.
    ///
    /// # Errors
    /// [`SyncError::AuthRequired`], [`SyncError::Validation`] for a blank
    /// token, [`SyncError::NotFound`] when no profile exists.
    pub async fn register_push_token(&self, token: &str) -> Result<(), SyncError> {
        let user = self.require_user()?;
        let token = token.trim();
        if token.is_empty() {
            return Err(SyncError::Validation("push token must not be empty".into()));
        }
        self.merge(&user, push_token_fields(token)).await?;
        debug!(user = %user, "Registered push token");
        Ok(())
    }

    async fn merge(&self, user: &UserId, fields: kanban_core::Document) -> Result<(), SyncError> {
        self.store
            .update(&self.collection, user.as_str(), fields)
            .await
            .map_err(|err| match classify(err) {
                RemoteError::NotFound { .. } => SyncError::NotFound(format!("profile {user}")),
                other => other.into_sync_error(),
            })
    }

    fn require_user(&self) -> Result<UserId, SyncError> {
        self.identity
            .current_user_id()
            .filter(|user| !user.is_blank())
            .ok_or(SyncError::AuthRequired)
    }
}
