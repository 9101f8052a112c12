//! Notification fan-out
//!
//! Commands emit notifications describing what changed; the notifier
//! broadcasts them best-effort to every connected domain. A dead subscriber
//! is pruned and never fails the originating command or blocks the others.
//! Secret material never appears in a payload.

use crate::command::PopupState;
use crate::session::WalletState;
use parking_lot::RwLock;
use serde::Serialize;
use skiff_core::Network;
use tokio::sync::mpsc;
use tracing::debug;

/// Session state as communicated to a domain
///
/// `Authorized` means "unlocked, and this origin has standing access"; it is
/// a per-origin view, not a global state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StateLabel {
    /// Vault locked
    Locked,
    /// Vault unlocked
    Unlocked,
    /// Unlocked and the receiving origin is authorized
    Authorized,
}

impl From<WalletState> for StateLabel {
    fn from(state: WalletState) -> Self {
        match state {
            WalletState::Unlocked => StateLabel::Unlocked,
            WalletState::Locked | WalletState::Uninitialized => StateLabel::Locked,
        }
    }
}

/// Fan-out payloads, independent of any command's direct response
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "camelCase")]
pub enum Notification {
    /// Lock state changed
    StateChanged {
        /// New state as seen by the receiving domain
        state: StateLabel,
    },
    /// The account list changed
    AccountsChanged(Vec<String>),
    /// The active network changed
    ClusterChanged(Network),
    /// Full snapshot for popup re-render
    PopupStateChanged(PopupState),
}

/// Best-effort broadcaster over unbounded channels
#[derive(Default)]
pub struct Notifier {
    subscribers: RwLock<Vec<mpsc::UnboundedSender<Notification>>>,
}

impl Notifier {
    /// Notifier with no subscribers
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new domain; returns its notification stream.
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<Notification> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.write().push(tx);
        rx
    }

    /// Broadcast to all live subscribers, pruning dead ones.
    pub fn broadcast(&self, notification: Notification) {
        let mut subscribers = self.subscribers.write();
        let before = subscribers.len();
        subscribers.retain(|tx| tx.send(notification.clone()).is_ok());
        let dropped = before - subscribers.len();
        if dropped > 0 {
            debug!(dropped, "pruned dead notification subscribers");
        }
    }

    /// Number of live subscribers
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_broadcast_reaches_all_subscribers() {
        let notifier = Notifier::new();
        let mut a = notifier.subscribe();
        let mut b = notifier.subscribe();

        notifier.broadcast(Notification::StateChanged {
            state: StateLabel::Unlocked,
        });

        assert!(matches!(
            a.try_recv().unwrap(),
            Notification::StateChanged { state: StateLabel::Unlocked }
        ));
        assert!(b.try_recv().is_ok());
    }

    #[test]
    fn test_dead_subscriber_is_pruned_not_fatal() {
        let notifier = Notifier::new();
        let rx = notifier.subscribe();
        let mut live = notifier.subscribe();
        drop(rx);

        notifier.broadcast(Notification::AccountsChanged(vec!["pk".to_string()]));

        assert_eq!(notifier.subscriber_count(), 1);
        assert!(live.try_recv().is_ok());
    }

    #[test]
    fn test_wire_shape() {
        let json = serde_json::to_value(Notification::StateChanged {
            state: StateLabel::Authorized,
        })
        .unwrap();
        assert_eq!(json["type"], "stateChanged");
        assert_eq!(json["data"]["state"], "authorized");
    }
}
