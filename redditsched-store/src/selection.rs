//! Selected-account state.
//!
//! [`AccountSelection`] tracks the linked accounts known to the client and
//! which one is selected. Selection changes requested by the user are
//! debounced so that rapid switching only applies the last choice. The
//! selected id is persisted through [`AccountStore`].

use std::sync::Arc;
use std::time::Duration;

use redditsched_core::RedditAccount;
use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::account_store::AccountStore;
use crate::debounce::Debouncer;

/// Default quiet period before a selection change applies.
pub const DEFAULT_SELECTION_DEBOUNCE: Duration = Duration::from_millis(300);

/// Snapshot of the selection state.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SelectionState {
    /// Accounts from the most recent listing.
    pub accounts: Vec<RedditAccount>,
    /// The selected account, always a member of `accounts`.
    pub selected: Option<RedditAccount>,
}

impl SelectionState {
    fn find(&self, account_id: i64) -> Option<&RedditAccount> {
        self.accounts.iter().find(|a| a.id == account_id)
    }
}

/// Known accounts plus the current selection.
pub struct AccountSelection {
    state: Arc<watch::Sender<SelectionState>>,
    store: AccountStore,
    debouncer: Debouncer,
    delay: Duration,
}

impl std::fmt::Debug for AccountSelection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountSelection")
            .field("state", &*self.state.borrow())
            .field("delay", &self.delay)
            .finish_non_exhaustive()
    }
}

impl AccountSelection {
    /// Creates an empty selection persisted through `store`.
    pub fn new(store: AccountStore) -> Self {
        Self::with_debounce(store, DEFAULT_SELECTION_DEBOUNCE)
    }

    /// Creates an empty selection with a custom debounce period.
    pub fn with_debounce(store: AccountStore, delay: Duration) -> Self {
        let (state, _) = watch::channel(SelectionState::default());
        Self {
            state: Arc::new(state),
            store,
            debouncer: Debouncer::new(),
            delay,
        }
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Returns a copy of the current state.
    pub fn snapshot(&self) -> SelectionState {
        self.state.borrow().clone()
    }

    /// Returns the known accounts.
    pub fn accounts(&self) -> Vec<RedditAccount> {
        self.state.borrow().accounts.clone()
    }

    /// Returns the selected account.
    pub fn selected_account(&self) -> Option<RedditAccount> {
        self.state.borrow().selected.clone()
    }

    /// Returns the id of the selected account.
    pub fn selected_account_id(&self) -> Option<i64> {
        self.state.borrow().selected.as_ref().map(|a| a.id)
    }

    /// Subscribes to state changes.
    pub fn subscribe(&self) -> watch::Receiver<SelectionState> {
        self.state.subscribe()
    }

    /// Returns true while a debounced change is waiting to apply.
    pub fn has_pending_change(&self) -> bool {
        self.debouncer.is_pending()
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    /// Replaces the known accounts.
    ///
    /// With no current selection (or one that vanished from `accounts`), the
    /// persisted account is selected if it is still linked, otherwise the
    /// first one. The choice is persisted.
    pub fn initialize(&self, accounts: Vec<RedditAccount>) {
        let persisted = self.store.selected_account_id();
        let store = &self.store;

        self.state.send_modify(|state| {
            state.accounts = accounts;

            let current = state.selected.as_ref().map(|a| a.id);
            if let Some(id) = current {
                // Keep the selection, refreshed from the new listing.
                state.selected = state.find(id).cloned();
                if state.selected.is_some() {
                    return;
                }
                debug!(account_id = id, "Selected account no longer listed");
            }

            let chosen = persisted
                .and_then(|id| state.find(id))
                .or_else(|| state.accounts.first())
                .cloned();

            match &chosen {
                Some(account) => {
                    store.set_selected_account_id(account.id);
                    info!(
                        account_id = account.id,
                        username = %account.reddit_username,
                        restored = persisted == Some(account.id),
                        "Account selected"
                    );
                }
                None if current.is_some() => store.clear_selected_account_id(),
                None => {}
            }
            state.selected = chosen;
        });
    }

    /// Requests a switch to `account_id` after the debounce period.
    ///
    /// Later requests replace earlier ones. An id that is not known when the
    /// timer fires is ignored.
    pub fn change_selection(&self, account_id: i64) {
        let state = Arc::clone(&self.state);
        let store = self.store.clone();

        debug!(account_id, delay = ?self.delay, "Selection change scheduled");
        self.debouncer.schedule(self.delay, move || {
            state.send_if_modified(|state| {
                let Some(account) = state.find(account_id).cloned() else {
                    warn!(account_id, "Ignoring selection of unknown account");
                    return false;
                };
                store.set_selected_account_id(account.id);
                info!(account_id, username = %account.reddit_username, "Account selected");
                let changed = state.selected.as_ref() != Some(&account);
                state.selected = Some(account);
                changed
            });
        });
    }

    /// Removes an account, e.g. after unlinking it.
    ///
    /// If it was selected, the new first account (or nothing) is selected.
    pub fn remove_account(&self, account_id: i64) {
        let store = &self.store;

        self.state.send_if_modified(|state| {
            let before = state.accounts.len();
            state.accounts.retain(|a| a.id != account_id);
            let removed = state.accounts.len() != before;

            let was_selected = state.selected.as_ref().is_some_and(|a| a.id == account_id);
            if was_selected {
                state.selected = state.accounts.first().cloned();
                match &state.selected {
                    Some(next) => store.set_selected_account_id(next.id),
                    None => store.clear_selected_account_id(),
                }
                debug!(
                    account_id,
                    next = ?state.selected.as_ref().map(|a| a.id),
                    "Selected account removed"
                );
            }

            removed || was_selected
        });
    }

    /// Forgets all accounts and the selection, including the persisted id.
    pub fn clear(&self) {
        self.debouncer.cancel();
        self.store.clear_selected_account_id();
        self.state.send_if_modified(|state| {
            let changed = !state.accounts.is_empty() || state.selected.is_some();
            *state = SelectionState::default();
            changed
        });
        debug!("Selection cleared");
    }

    /// Waits until any pending selection change has applied.
    pub async fn settle(&self) {
        self.debouncer.settle().await;
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn accounts() -> Vec<RedditAccount> {
        vec![
            RedditAccount::new(1, "first"),
            RedditAccount::new(2, "second"),
            RedditAccount::new(3, "third"),
        ]
    }

    #[test]
    fn test_initialize_selects_first_without_persisted() {
        let store = AccountStore::in_memory();
        let selection = AccountSelection::new(store.clone());

        selection.initialize(accounts());

        assert_eq!(selection.selected_account_id(), Some(1));
        assert_eq!(store.selected_account_id(), Some(1));
        assert_eq!(selection.accounts().len(), 3);
    }

    #[test]
    fn test_initialize_restores_persisted() {
        let store = AccountStore::in_memory();
        store.set_selected_account_id(2);
        let selection = AccountSelection::new(store);

        selection.initialize(accounts());

        assert_eq!(selection.selected_account_id(), Some(2));
    }

    #[test]
    fn test_initialize_ignores_stale_persisted() {
        let store = AccountStore::in_memory();
        store.set_selected_account_id(99);
        let selection = AccountSelection::new(store.clone());

        selection.initialize(accounts());

        assert_eq!(selection.selected_account_id(), Some(1));
        assert_eq!(store.selected_account_id(), Some(1));
    }

    #[test]
    fn test_initialize_empty_list_selects_nothing() {
        let store = AccountStore::in_memory();
        let selection = AccountSelection::new(store.clone());

        selection.initialize(Vec::new());

        assert_eq!(selection.selected_account(), None);
        assert!(!store.has_selected_account());
    }

    #[test]
    fn test_initialize_keeps_existing_selection() {
        let store = AccountStore::in_memory();
        let selection = AccountSelection::new(store.clone());
        selection.initialize(accounts());
        store.set_selected_account_id(3);

        selection.initialize(accounts());

        assert_eq!(selection.selected_account_id(), Some(1));
    }

    #[test]
    fn test_initialize_reselects_when_selection_vanishes() {
        let store = AccountStore::in_memory();
        let selection = AccountSelection::new(store.clone());
        selection.initialize(accounts());

        selection.initialize(vec![RedditAccount::new(3, "third")]);

        assert_eq!(selection.selected_account_id(), Some(3));
        assert_eq!(store.selected_account_id(), Some(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_change_selection_is_debounced() {
        let store = AccountStore::in_memory();
        let selection = AccountSelection::new(store.clone());
        selection.initialize(accounts());

        selection.change_selection(2);
        tokio::time::sleep(Duration::from_millis(100)).await;
        selection.change_selection(3);

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(selection.selected_account_id(), Some(1));
        assert!(selection.has_pending_change());

        selection.settle().await;
        assert_eq!(selection.selected_account_id(), Some(3));
        assert_eq!(store.selected_account_id(), Some(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_rapid_changes_notify_once_with_last_choice() {
        let store = AccountStore::in_memory();
        let selection = AccountSelection::new(store.clone());
        selection.initialize(accounts());
        let mut rx = selection.subscribe();
        let _ = rx.borrow_and_update();

        selection.change_selection(2);
        tokio::time::sleep(Duration::from_millis(50)).await;
        selection.change_selection(1);
        tokio::time::sleep(Duration::from_millis(50)).await;
        selection.change_selection(3);

        let mut notifications = 0;
        let deadline = tokio::time::sleep(Duration::from_secs(2));
        tokio::pin!(deadline);
        loop {
            tokio::select! {
                changed = rx.changed() => {
                    changed.unwrap();
                    let _ = rx.borrow_and_update();
                    notifications += 1;
                }
                _ = &mut deadline => break,
            }
        }

        assert_eq!(notifications, 1);
        assert_eq!(selection.selected_account_id(), Some(3));
        assert_eq!(store.selected_account_id(), Some(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_change_to_unknown_account_is_ignored() {
        let store = AccountStore::in_memory();
        let selection = AccountSelection::new(store.clone());
        selection.initialize(accounts());

        selection.change_selection(42);
        selection.settle().await;

        assert_eq!(selection.selected_account_id(), Some(1));
        assert_eq!(store.selected_account_id(), Some(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_subscribers_see_debounced_change() {
        let selection = AccountSelection::new(AccountStore::in_memory());
        selection.initialize(accounts());
        let mut rx = selection.subscribe();

        selection.change_selection(2);
        rx.changed().await.unwrap();

        assert_eq!(rx.borrow().selected.as_ref().map(|a| a.id), Some(2));
    }

    #[test]
    fn test_remove_selected_account_selects_next() {
        let store = AccountStore::in_memory();
        let selection = AccountSelection::new(store.clone());
        selection.initialize(accounts());

        selection.remove_account(1);

        assert_eq!(selection.selected_account_id(), Some(2));
        assert_eq!(store.selected_account_id(), Some(2));
        assert_eq!(selection.accounts().len(), 2);
    }

    #[test]
    fn test_remove_last_account_clears_selection() {
        let store = AccountStore::in_memory();
        let selection = AccountSelection::new(store.clone());
        selection.initialize(vec![RedditAccount::new(5, "only")]);

        selection.remove_account(5);

        assert_eq!(selection.selected_account(), None);
        assert!(!store.has_selected_account());
    }

    #[test]
    fn test_remove_unselected_account_keeps_selection() {
        let store = AccountStore::in_memory();
        let selection = AccountSelection::new(store.clone());
        selection.initialize(accounts());

        selection.remove_account(3);

        assert_eq!(selection.selected_account_id(), Some(1));
        assert_eq!(selection.accounts().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_clear_cancels_pending_and_forgets() {
        let store = AccountStore::in_memory();
        let selection = AccountSelection::new(store.clone());
        selection.initialize(accounts());
        selection.change_selection(2);

        selection.clear();
        tokio::time::sleep(Duration::from_secs(1)).await;

        assert_eq!(selection.snapshot(), SelectionState::default());
        assert!(!store.has_selected_account());
    }
}
