//! Access/refresh token storage.
//!
//! The token store never fails: backend errors are logged and reads degrade
//! to "no token", which the rest of the client treats as logged out.

use std::sync::Arc;

use tracing::{debug, instrument, warn};

use crate::kv::{KeyValueStore, MemoryStore};

/// Storage key of the access token.
pub const ACCESS_TOKEN_KEY: &str = "accessToken";

/// Storage key of the refresh token.
pub const REFRESH_TOKEN_KEY: &str = "refreshToken";

/// Which token of the credential pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// Short-lived bearer credential.
    Access,
    /// Longer-lived credential exchanged for new access tokens.
    Refresh,
}

impl TokenKind {
    /// Returns the storage key for this token.
    pub fn key(self) -> &'static str {
        match self {
            Self::Access => ACCESS_TOKEN_KEY,
            Self::Refresh => REFRESH_TOKEN_KEY,
        }
    }
}

/// Persistent holder of the process-wide credential pair.
#[derive(Clone)]
pub struct TokenStore {
    backend: Arc<dyn KeyValueStore>,
}

impl std::fmt::Debug for TokenStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenStore").finish_non_exhaustive()
    }
}

impl TokenStore {
    /// Creates a token store over the given backend.
    pub fn new(backend: Arc<dyn KeyValueStore>) -> Self {
        Self { backend }
    }

    /// Creates a token store backed by process memory.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    /// Reads one token. Empty values read as absent.
    pub fn get(&self, kind: TokenKind) -> Option<String> {
        match self.backend.get(kind.key()) {
            Ok(value) => value.filter(|v| !v.is_empty()),
            Err(e) => {
                warn!(key = kind.key(), error = %e, "Failed to read token, treating as absent");
                None
            }
        }
    }

    /// Returns the access token, if any.
    pub fn access_token(&self) -> Option<String> {
        self.get(TokenKind::Access)
    }

    /// Returns the refresh token, if any.
    pub fn refresh_token(&self) -> Option<String> {
        self.get(TokenKind::Refresh)
    }

    /// Stores a fresh credential pair.
    #[instrument(skip_all)]
    pub fn set_tokens(&self, access: &str, refresh: &str) {
        self.write(TokenKind::Access, access);
        self.write(TokenKind::Refresh, refresh);
        debug!("Credential pair stored");
    }

    /// Replaces the access token after a refresh.
    #[instrument(skip_all)]
    pub fn set_access_token(&self, access: &str) {
        self.write(TokenKind::Access, access);
        debug!("Access token replaced");
    }

    /// Removes both tokens.
    pub fn clear_tokens(&self) {
        for kind in [TokenKind::Access, TokenKind::Refresh] {
            if let Err(e) = self.backend.remove(kind.key()) {
                warn!(key = kind.key(), error = %e, "Failed to remove token");
            }
        }
        debug!("Tokens cleared");
    }

    /// Returns true if both tokens are present.
    pub fn has_valid_tokens(&self) -> bool {
        self.access_token().is_some() && self.refresh_token().is_some()
    }

    fn write(&self, kind: TokenKind, value: &str) {
        if let Err(e) = self.backend.set(kind.key(), value) {
            warn!(key = kind.key(), error = %e, "Failed to store token");
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;

    /// Backend whose every operation fails.
    struct BrokenStore;

    impl KeyValueStore for BrokenStore {
        fn get(&self, _key: &str) -> Result<Option<String>, StoreError> {
            Err(StoreError::Poisoned)
        }

        fn set(&self, _key: &str, _value: &str) -> Result<(), StoreError> {
            Err(StoreError::Poisoned)
        }

        fn remove(&self, _key: &str) -> Result<(), StoreError> {
            Err(StoreError::Poisoned)
        }
    }

    #[test]
    fn test_round_trip() {
        let store = TokenStore::in_memory();
        store.set_tokens("a", "r");

        assert_eq!(store.access_token().as_deref(), Some("a"));
        assert_eq!(store.refresh_token().as_deref(), Some("r"));
        assert!(store.has_valid_tokens());

        store.clear_tokens();
        assert_eq!(store.access_token(), None);
        assert_eq!(store.refresh_token(), None);
        assert!(!store.has_valid_tokens());
    }

    #[test]
    fn test_set_access_token_keeps_refresh() {
        let store = TokenStore::in_memory();
        store.set_tokens("old", "r");
        store.set_access_token("new");

        assert_eq!(store.get(TokenKind::Access).as_deref(), Some("new"));
        assert_eq!(store.get(TokenKind::Refresh).as_deref(), Some("r"));
    }

    #[test]
    fn test_access_only_is_not_valid_pair() {
        let store = TokenStore::in_memory();
        store.set_access_token("a");
        assert!(!store.has_valid_tokens());
    }

    #[test]
    fn test_broken_backend_fails_open() {
        let store = TokenStore::new(Arc::new(BrokenStore));

        store.set_tokens("a", "r");
        store.set_access_token("b");
        store.clear_tokens();

        assert_eq!(store.access_token(), None);
        assert!(!store.has_valid_tokens());
    }

    #[test]
    fn test_empty_value_reads_absent() {
        let backend = Arc::new(MemoryStore::new());
        backend.set(ACCESS_TOKEN_KEY, "").unwrap();

        let store = TokenStore::new(backend);
        assert_eq!(store.access_token(), None);
    }

    #[test]
    fn test_storage_keys() {
        assert_eq!(TokenKind::Access.key(), "accessToken");
        assert_eq!(TokenKind::Refresh.key(), "refreshToken");
    }
}
