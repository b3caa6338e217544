//! Authentication session state.
//!
//! A [`Session`] is either authenticated or anonymous. It starts
//! authenticated iff an access token is stored, and only
//! [`Session::login_user`] and [`Session::logout_user`] move it afterwards.
//! Observers follow it through a `watch` channel.

use serde::Serialize;
use tokio::sync::watch;
use tracing::info;

use crate::token_store::TokenStore;

/// Whether a user is currently logged in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// An access token is held.
    Authenticated,
    /// Nobody is logged in.
    Anonymous,
}

impl SessionState {
    /// Returns true for [`SessionState::Authenticated`].
    pub fn is_authenticated(self) -> bool {
        matches!(self, Self::Authenticated)
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Authenticated => write!(f, "authenticated"),
            Self::Anonymous => write!(f, "anonymous"),
        }
    }
}

/// Process-wide authentication session.
#[derive(Debug)]
pub struct Session {
    tokens: TokenStore,
    state: watch::Sender<SessionState>,
}

impl Session {
    /// Creates a session, authenticated iff `tokens` holds an access token.
    pub fn new(tokens: TokenStore) -> Self {
        let initial = if tokens.access_token().is_some() {
            SessionState::Authenticated
        } else {
            SessionState::Anonymous
        };
        let (state, _) = watch::channel(initial);
        Self { tokens, state }
    }

    /// Returns the current state.
    pub fn state(&self) -> SessionState {
        *self.state.borrow()
    }

    /// Returns true if a user is logged in.
    pub fn is_authenticated(&self) -> bool {
        self.state().is_authenticated()
    }

    /// Returns the token store backing this session.
    pub fn tokens(&self) -> &TokenStore {
        &self.tokens
    }

    /// Marks the session authenticated. Tokens are stored by the login call.
    pub fn login_user(&self) {
        self.transition(SessionState::Authenticated);
    }

    /// Clears stored tokens and marks the session anonymous.
    ///
    /// The token store is cleared before any observer is notified.
    pub fn logout_user(&self) {
        self.tokens.clear_tokens();
        self.transition(SessionState::Anonymous);
    }

    /// Subscribes to state changes.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    fn transition(&self, next: SessionState) {
        let changed = self.state.send_if_modified(|current| {
            let changed = *current != next;
            *current = next;
            changed
        });
        if changed {
            info!(state = %next, "Session state changed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state_follows_access_token() {
        let tokens = TokenStore::in_memory();
        assert_eq!(Session::new(tokens.clone()).state(), SessionState::Anonymous);

        tokens.set_access_token("a");
        assert_eq!(Session::new(tokens).state(), SessionState::Authenticated);
    }

    #[test]
    fn test_logout_clears_tokens_synchronously() {
        let tokens = TokenStore::in_memory();
        tokens.set_tokens("a", "r");
        let session = Session::new(tokens.clone());

        session.logout_user();

        assert!(!session.is_authenticated());
        assert_eq!(tokens.access_token(), None);
        assert_eq!(tokens.refresh_token(), None);
    }

    #[test]
    fn test_login_does_not_touch_tokens() {
        let tokens = TokenStore::in_memory();
        let session = Session::new(tokens.clone());

        session.login_user();

        assert!(session.is_authenticated());
        assert!(!tokens.has_valid_tokens());
    }

    #[tokio::test]
    async fn test_subscribers_observe_transitions() {
        let session = Session::new(TokenStore::in_memory());
        let mut rx = session.subscribe();

        session.login_user();
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow_and_update(), SessionState::Authenticated);

        session.logout_user();
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow_and_update(), SessionState::Anonymous);
    }

    #[test]
    fn test_repeated_login_does_not_notify() {
        let session = Session::new(TokenStore::in_memory());
        session.login_user();

        let rx = session.subscribe();
        session.login_user();
        assert!(!rx.has_changed().unwrap());
    }
}
