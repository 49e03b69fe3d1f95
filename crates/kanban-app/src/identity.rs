//! Who is signed in: the identity-provider seam plus local resolvers.

use std::env;
use std::sync::{Arc, PoisonError, RwLock};

use kanban_core::UserId;

/// Environment variable checked for the signed-in user id.
pub const ENV_USER: &str = "KANBAN_USER";

/// Source of the currently authenticated user.
///
/// Authentication itself happens elsewhere; the sync core only asks who the
/// current user is.
pub trait IdentityProvider: Send + Sync {
    /// Id of the signed-in user, if any.
    fn current_user_id(&self) -> Option<UserId>;
}

impl<T: IdentityProvider + ?Sized> IdentityProvider for Arc<T> {
    fn current_user_id(&self) -> Option<UserId> {
        (**self).current_user_id()
    }
}

/// In-process session: signed in until told otherwise.
#[derive(Debug, Default)]
pub struct SessionIdentity {
    current: RwLock<Option<UserId>>,
}

impl SessionIdentity {
    /// Session with `user` already signed in.
    pub fn signed_in(user: impl Into<UserId>) -> Self {
        Self {
            current: RwLock::new(Some(user.into())),
        }
    }

    /// Session with nobody signed in.
    #[must_use]
    pub fn signed_out() -> Self {
        Self::default()
    }

    /// Switch the signed-in user.
    pub fn sign_in(&self, user: impl Into<UserId>) {
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = Some(user.into());
    }

    /// Forget the signed-in user.
    pub fn sign_out(&self) {
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

impl IdentityProvider for SessionIdentity {
    fn current_user_id(&self) -> Option<UserId> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .filter(|user| !user.is_blank())
    }
}

/// Prefer an explicit parameter, falling back to the environment.
#[must_use]
pub fn user_from_param_or_env(param: Option<&str>) -> Option<UserId> {
    let mut fetch = |key: &'static str| env::var(key).ok();
    user_from_param_or_env_with(param, &mut fetch)
}

fn user_from_param_or_env_with(
    param: Option<&str>,
    fetch: &mut impl FnMut(&'static str) -> Option<String>,
) -> Option<UserId> {
    param
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(UserId::from)
        .or_else(|| user_from_env_with(fetch))
}

fn user_from_env_with(
    fetch: &mut impl FnMut(&'static str) -> Option<String>,
) -> Option<UserId> {
    fetch(ENV_USER)
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
        .map(UserId::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_user_is_trimmed_and_blank_ignored() {
        let mut fetch = |key: &'static str| match key {
            ENV_USER => Some("  alice ".into()),
            _ => None,
        };
        assert_eq!(user_from_env_with(&mut fetch), Some(UserId::from("alice")));

        let mut blank = |_: &'static str| Some("   ".to_owned());
        assert_eq!(user_from_env_with(&mut blank), None);
    }

    #[test]
    fn explicit_parameter_wins_over_environment() {
        let mut fetch = |_: &'static str| Some("env-user".to_owned());
        assert_eq!(
            user_from_param_or_env_with(Some("cli-user"), &mut fetch),
            Some(UserId::from("cli-user"))
        );
        assert_eq!(
            user_from_param_or_env_with(Some(" "), &mut fetch),
            Some(UserId::from("env-user"))
        );
        let mut empty = |_: &'static str| None;
        assert_eq!(user_from_param_or_env_with(None, &mut empty), None);
    }

    #[test]
    fn session_tracks_sign_in_and_out() {
        let session = SessionIdentity::signed_out();
        assert_eq!(session.current_user_id(), None);
        session.sign_in("bob");
        assert_eq!(session.current_user_id(), Some(UserId::from("bob")));
        session.sign_out();
        assert_eq!(session.current_user_id(), None);

        let shared = Arc::new(SessionIdentity::signed_in("carol"));
        assert_eq!(shared.current_user_id(), Some(UserId::from("carol")));
    }
}
