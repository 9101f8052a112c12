//! Request arbitration registry
//!
//! Bridges the synchronous command stream with asynchronously arriving user
//! decisions. A dApp registers a request and receives a oneshot receiver to
//! await; the popup settles it much later through a different command.
//! Settling consumes the stored sender, so every request is resolved or
//! rejected at most once; a second settle of the same key is reported as
//! `RequestNotFound`, never a double fire.
//!
//! Duplicate registration for an occupied key replaces the entry and rejects
//! the superseded handle, so no waiting caller leaks.

use crate::{Error, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use tokio::sync::oneshot;
use tracing::{debug, warn};

/// Outcome delivered to a waiting account-access request: the wallet's
/// public keys on approval, a reason string on decline.
pub type AccountsReply = std::result::Result<Vec<String>, String>;

/// Outcome delivered to a waiting transaction request.
pub type SignatureReply = std::result::Result<Vec<SignatureResult>, String>;

/// One detached signature paired with its signer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignatureResult {
    /// Base58 signer public key
    pub public_key: String,
    /// Base58 detached 64-byte signature
    pub signature: String,
}

/// Snapshot entry for a pending account-access request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingAccountInfo {
    /// Requesting origin
    pub origin: String,
    /// Browser tab the request came from
    pub tab_id: String,
}

/// Snapshot entry for a pending transaction request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingTransactionInfo {
    /// Browser tab the request came from
    pub tab_id: String,
    /// Base58 serialized unsigned transaction message
    pub message: String,
    /// Base58 public keys expected to sign
    pub signers: Vec<String>,
}

/// A pending transaction taken out of the registry for settlement.
///
/// Holds the reply channel; exactly one of `resolve`/`reject` consumes it.
pub struct PendingTransaction {
    info: PendingTransactionInfo,
    reply: oneshot::Sender<SignatureReply>,
}

impl PendingTransaction {
    /// Request details
    pub fn info(&self) -> &PendingTransactionInfo {
        &self.info
    }

    /// Resolve the waiting caller with the ordered signature list.
    pub fn resolve(self, signatures: Vec<SignatureResult>) {
        if self.reply.send(Ok(signatures)).is_err() {
            debug!(tab_id = %self.info.tab_id, "transaction requester went away before resolve");
        }
    }

    /// Reject the waiting caller with a reason.
    pub fn reject(self, reason: &str) {
        if self.reply.send(Err(reason.to_string())).is_err() {
            debug!(tab_id = %self.info.tab_id, "transaction requester went away before reject");
        }
    }
}

const SUPERSEDED: &str = "superseded by a newer request";

/// Pending account-access and transaction-signing requests
#[derive(Default)]
pub struct RequestRegistry {
    account_requests: BTreeMap<String, BTreeMap<String, oneshot::Sender<AccountsReply>>>,
    transaction_requests: BTreeMap<String, PendingTransaction>,
}

impl RequestRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an account-access request for (origin, tab).
    ///
    /// An existing entry under the same key is rejected as superseded and
    /// replaced.
    pub fn register_account_request(
        &mut self,
        origin: &str,
        tab_id: &str,
    ) -> oneshot::Receiver<AccountsReply> {
        let (tx, rx) = oneshot::channel();
        let tabs = self.account_requests.entry(origin.to_string()).or_default();
        if let Some(old) = tabs.insert(tab_id.to_string(), tx) {
            warn!(%origin, %tab_id, "replacing pending account request");
            let _ = old.send(Err(SUPERSEDED.to_string()));
        }
        debug!(%origin, %tab_id, "account request registered");
        rx
    }

    /// Whether any tab is waiting on account access for an origin.
    pub fn has_account_requests(&self, origin: &str) -> bool {
        self.account_requests.contains_key(origin)
    }

    /// Take every pending tab for an origin, for approve-all settlement.
    pub fn take_account_requests_for_origin(
        &mut self,
        origin: &str,
    ) -> Result<Vec<(String, oneshot::Sender<AccountsReply>)>> {
        let tabs = self
            .account_requests
            .remove(origin)
            .ok_or_else(|| Error::RequestNotFound(format!("no account requests for {origin}")))?;
        Ok(tabs.into_iter().collect())
    }

    /// Reject exactly one (origin, tab) account request.
    ///
    /// Other pending tabs for the same origin are unaffected.
    pub fn decline_account_request(&mut self, origin: &str, tab_id: &str, reason: &str) -> Result<()> {
        let tabs = self
            .account_requests
            .get_mut(origin)
            .ok_or_else(|| Error::RequestNotFound(format!("no account requests for {origin}")))?;
        let sender = tabs.remove(tab_id).ok_or_else(|| {
            Error::RequestNotFound(format!("no account request for {origin} tab {tab_id}"))
        })?;
        if tabs.is_empty() {
            self.account_requests.remove(origin);
        }
        if sender.send(Err(reason.to_string())).is_err() {
            debug!(%origin, %tab_id, "account requester went away before decline");
        }
        Ok(())
    }

    /// Register a transaction-signing request for a tab.
    pub fn register_transaction_request(
        &mut self,
        tab_id: &str,
        message: &str,
        signers: Vec<String>,
    ) -> oneshot::Receiver<SignatureReply> {
        let (tx, rx) = oneshot::channel();
        let pending = PendingTransaction {
            info: PendingTransactionInfo {
                tab_id: tab_id.to_string(),
                message: message.to_string(),
                signers,
            },
            reply: tx,
        };
        if let Some(old) = self.transaction_requests.insert(tab_id.to_string(), pending) {
            warn!(%tab_id, "replacing pending transaction request");
            old.reject(SUPERSEDED);
        }
        debug!(%tab_id, "transaction request registered");
        rx
    }

    /// Take the pending transaction for a tab out of the registry.
    ///
    /// The caller must settle it; a missing entry means the request was
    /// already settled or never existed.
    pub fn take_transaction(&mut self, tab_id: &str) -> Result<PendingTransaction> {
        self.transaction_requests
            .remove(tab_id)
            .ok_or_else(|| Error::RequestNotFound(format!("no transaction request for tab {tab_id}")))
    }

    /// Pending account requests for the state snapshot.
    pub fn pending_account_requests(&self) -> Vec<PendingAccountInfo> {
        self.account_requests
            .iter()
            .flat_map(|(origin, tabs)| {
                tabs.keys().map(move |tab_id| PendingAccountInfo {
                    origin: origin.clone(),
                    tab_id: tab_id.clone(),
                })
            })
            .collect()
    }

    /// Pending transaction requests for the state snapshot.
    pub fn pending_transactions(&self) -> Vec<PendingTransactionInfo> {
        self.transaction_requests
            .values()
            .map(|p| p.info.clone())
            .collect()
    }

    /// Reject everything; used at teardown so no caller hangs forever.
    pub fn reject_all(&mut self, reason: &str) {
        for (origin, tabs) in std::mem::take(&mut self.account_requests) {
            for (tab_id, sender) in tabs {
                debug!(%origin, %tab_id, "rejecting pending account request at teardown");
                let _ = sender.send(Err(reason.to_string()));
            }
        }
        for (_, pending) in std::mem::take(&mut self.transaction_requests) {
            pending.reject(reason);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signers() -> Vec<String> {
        vec!["signer1".to_string()]
    }

    #[test]
    fn test_account_request_settled_once() {
        let mut registry = RequestRegistry::new();
        let mut rx = registry.register_account_request("https://a", "1");

        let taken = registry.take_account_requests_for_origin("https://a").unwrap();
        assert_eq!(taken.len(), 1);
        for (_, sender) in taken {
            sender.send(Ok(vec!["pk".to_string()])).unwrap();
        }
        assert_eq!(rx.try_recv().unwrap().unwrap(), vec!["pk".to_string()]);

        // Second settle of the same origin is a stale request
        assert!(matches!(
            registry.take_account_requests_for_origin("https://a"),
            Err(Error::RequestNotFound(_))
        ));
    }

    #[test]
    fn test_has_account_requests_tracks_registration() {
        let mut registry = RequestRegistry::new();
        assert!(!registry.has_account_requests("https://a"));
        registry.register_account_request("https://a", "1");
        assert!(registry.has_account_requests("https://a"));

        registry.take_account_requests_for_origin("https://a").unwrap();
        assert!(!registry.has_account_requests("https://a"));
    }

    #[test]
    fn test_take_for_origin_collects_all_tabs() {
        let mut registry = RequestRegistry::new();
        registry.register_account_request("https://a", "1");
        registry.register_account_request("https://a", "2");
        registry.register_account_request("https://b", "3");

        let taken = registry.take_account_requests_for_origin("https://a").unwrap();
        assert_eq!(taken.len(), 2);
        // https://b untouched
        assert_eq!(registry.pending_account_requests().len(), 1);
    }

    #[test]
    fn test_duplicate_registration_rejects_superseded() {
        let mut registry = RequestRegistry::new();
        let mut first = registry.register_account_request("https://a", "1");
        let _second = registry.register_account_request("https://a", "1");

        let reply = first.try_recv().unwrap();
        assert_eq!(reply.unwrap_err(), SUPERSEDED);
        // Only the replacement remains pending
        assert_eq!(registry.pending_account_requests().len(), 1);
    }

    #[test]
    fn test_decline_affects_one_tab_only() {
        let mut registry = RequestRegistry::new();
        let mut declined = registry.register_account_request("https://a", "1");
        let mut other = registry.register_account_request("https://a", "2");

        registry
            .decline_account_request("https://a", "1", "access denied")
            .unwrap();
        assert_eq!(declined.try_recv().unwrap().unwrap_err(), "access denied");
        // The sibling tab is still pending and unsettled
        assert!(other.try_recv().is_err());
        assert_eq!(registry.pending_account_requests().len(), 1);
    }

    #[test]
    fn test_decline_unknown_is_request_not_found() {
        let mut registry = RequestRegistry::new();
        assert!(matches!(
            registry.decline_account_request("https://a", "1", "x"),
            Err(Error::RequestNotFound(_))
        ));
    }

    #[test]
    fn test_transaction_take_consumes_entry() {
        let mut registry = RequestRegistry::new();
        let mut rx = registry.register_transaction_request("2", "bs58msg", signers());

        let pending = registry.take_transaction("2").unwrap();
        assert_eq!(pending.info().message, "bs58msg");
        pending.resolve(vec![SignatureResult {
            public_key: "signer1".to_string(),
            signature: "sig".to_string(),
        }]);
        assert!(rx.try_recv().unwrap().is_ok());

        // Double approve never re-signs
        assert!(matches!(
            registry.take_transaction("2"),
            Err(Error::RequestNotFound(_))
        ));
    }

    #[test]
    fn test_settle_to_dropped_receiver_is_not_an_error() {
        let mut registry = RequestRegistry::new();
        let rx = registry.register_transaction_request("2", "m", signers());
        drop(rx);
        // Must not panic
        registry.take_transaction("2").unwrap().reject("declined");
    }

    #[test]
    fn test_reject_all_drains_everything() {
        let mut registry = RequestRegistry::new();
        let mut a = registry.register_account_request("https://a", "1");
        let mut t = registry.register_transaction_request("2", "m", signers());

        registry.reject_all("shutting down");
        assert_eq!(a.try_recv().unwrap().unwrap_err(), "shutting down");
        assert_eq!(t.try_recv().unwrap().unwrap_err(), "shutting down");
        assert!(registry.pending_account_requests().is_empty());
        assert!(registry.pending_transactions().is_empty());
    }
}
