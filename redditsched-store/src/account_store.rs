//! Persisted selection of the current linked account.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::kv::{KeyValueStore, MemoryStore};

/// Storage key of the selected account id.
pub const SELECTED_ACCOUNT_KEY: &str = "selectedRedditAccountId";

/// Persists the id of the selected Reddit account.
///
/// Same contract as [`crate::TokenStore`]: never fails, degrades to "no
/// selection".
#[derive(Clone)]
pub struct AccountStore {
    backend: Arc<dyn KeyValueStore>,
}

impl std::fmt::Debug for AccountStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountStore").finish_non_exhaustive()
    }
}

impl AccountStore {
    /// Creates an account store over the given backend.
    pub fn new(backend: Arc<dyn KeyValueStore>) -> Self {
        Self { backend }
    }

    /// Creates an account store backed by process memory.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    /// Returns the persisted account id.
    pub fn selected_account_id(&self) -> Option<i64> {
        let raw = match self.backend.get(SELECTED_ACCOUNT_KEY) {
            Ok(value) => value?,
            Err(e) => {
                warn!(error = %e, "Failed to read selected account");
                return None;
            }
        };

        match raw.trim().parse() {
            Ok(id) => Some(id),
            Err(_) => {
                warn!(value = %raw, "Ignoring non-numeric selected account id");
                None
            }
        }
    }

    /// Persists `account_id` as the selection.
    pub fn set_selected_account_id(&self, account_id: i64) {
        match self.backend.set(SELECTED_ACCOUNT_KEY, &account_id.to_string()) {
            Ok(()) => debug!(account_id, "Selected account persisted"),
            Err(e) => warn!(account_id, error = %e, "Failed to persist selected account"),
        }
    }

    /// Forgets the selection.
    pub fn clear_selected_account_id(&self) {
        if let Err(e) = self.backend.remove(SELECTED_ACCOUNT_KEY) {
            warn!(error = %e, "Failed to clear selected account");
        }
    }

    /// Returns true if a selection is persisted.
    pub fn has_selected_account(&self) -> bool {
        self.selected_account_id().is_some()
    }
}
