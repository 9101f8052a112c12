//! Session state machine
//!
//! Tracks the wallet's lock state and the active network/account selection.
//! "Authorized" is a per-origin overlay on top of `Unlocked` (tracked in the
//! authorization store), not a separate global state.

use serde::{Deserialize, Serialize};
use skiff_core::{default_network, Network};
use tracing::debug;

/// Global wallet lock state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WalletState {
    /// No secret box exists yet
    Uninitialized,
    /// A secret box exists; no key material in memory
    Locked,
    /// Keyring derived and resident in memory
    Unlocked,
}

/// Active session: lock state plus network/account selection.
///
/// `selected_account` is only meaningful while unlocked, but the persisted
/// selection survives a lock so the same account is active after the next
/// unlock.
pub struct Session {
    state: WalletState,
    selected_network: Network,
    selected_account: Option<String>,
}

impl Session {
    /// Fresh session with no wallet
    pub fn uninitialized() -> Self {
        Self {
            state: WalletState::Uninitialized,
            selected_network: default_network(),
            selected_account: None,
        }
    }

    /// Session restored from persisted state; starts locked.
    pub fn locked(selected_network: Network, selected_account: Option<String>) -> Self {
        Self {
            state: WalletState::Locked,
            selected_network,
            selected_account,
        }
    }

    /// Current lock state
    pub fn state(&self) -> WalletState {
        self.state
    }

    /// Active network; always carries a valid endpoint
    pub fn selected_network(&self) -> &Network {
        &self.selected_network
    }

    /// Active account, if any
    pub fn selected_account(&self) -> Option<&String> {
        self.selected_account.as_ref()
    }

    /// Transition to `Unlocked`
    pub fn set_unlocked(&mut self) {
        debug!(from = ?self.state, "session -> unlocked");
        self.state = WalletState::Unlocked;
    }

    /// Transition to `Locked`; idempotent
    pub fn set_locked(&mut self) {
        debug!(from = ?self.state, "session -> locked");
        self.state = WalletState::Locked;
    }

    /// Switch the active network
    pub fn set_network(&mut self, network: Network) {
        self.selected_network = network;
    }

    /// Switch the active account
    pub fn set_account(&mut self, account: String) {
        self.selected_account = Some(account);
    }

    /// Reconcile the selection with the unlocked account list: keep it if
    /// still a member, otherwise fall back to the first account.
    pub fn reconcile_account(&mut self, accounts: &[String]) {
        let keep = self
            .selected_account
            .as_ref()
            .map(|a| accounts.iter().any(|k| k == a))
            .unwrap_or(false);
        if !keep {
            self.selected_account = accounts.first().cloned();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uninitialized_defaults() {
        let session = Session::uninitialized();
        assert_eq!(session.state(), WalletState::Uninitialized);
        assert_eq!(session.selected_network().cluster, "devnet");
        assert!(session.selected_account().is_none());
    }

    #[test]
    fn test_lock_unlock_transitions() {
        let mut session = Session::uninitialized();
        session.set_unlocked();
        assert_eq!(session.state(), WalletState::Unlocked);
        session.set_locked();
        assert_eq!(session.state(), WalletState::Locked);
        // Idempotent
        session.set_locked();
        assert_eq!(session.state(), WalletState::Locked);
    }

    #[test]
    fn test_reconcile_keeps_member_selection() {
        let mut session = Session::uninitialized();
        session.set_account("b".to_string());
        session.reconcile_account(&["a".to_string(), "b".to_string()]);
        assert_eq!(session.selected_account().unwrap(), "b");
    }

    #[test]
    fn test_reconcile_falls_back_to_first() {
        let mut session = Session::uninitialized();
        session.set_account("gone".to_string());
        session.reconcile_account(&["a".to_string()]);
        assert_eq!(session.selected_account().unwrap(), "a");
    }

    #[test]
    fn test_state_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&WalletState::Unlocked).unwrap(),
            "\"unlocked\""
        );
    }
}
