//! Wallet service handle
//!
//! Cheap-to-clone handle over the controller for embedding in a host
//! process. All work funnels through one async mutex, so commands and
//! provider requests are serialized: each one observes the state left by the
//! previous one, and interleavings inside a command are impossible.

use crate::chain::ChainClient;
use crate::command::{EngineResponse, PopupCommand, PopupState};
use crate::controller::PopupController;
use crate::notify::{Notification, Notifier};
use crate::registry::{AccountsReply, SignatureReply};
use crate::store::StorageBackend;
use crate::Result;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, Mutex};
use tracing::info;

/// Shared wallet engine handle
#[derive(Clone)]
pub struct WalletService {
    controller: Arc<Mutex<PopupController>>,
    notifier: Arc<Notifier>,
}

impl WalletService {
    /// Open the engine over a storage backend and chain client.
    pub async fn open(
        backend: Box<dyn StorageBackend>,
        chain: Arc<dyn ChainClient>,
    ) -> Result<Self> {
        let controller = PopupController::open(backend, chain).await?;
        let notifier = controller.notifier();
        info!("wallet service started");
        Ok(Self {
            controller: Arc::new(Mutex::new(controller)),
            notifier,
        })
    }

    /// Handle one popup command.
    pub async fn handle(&self, command: PopupCommand) -> EngineResponse {
        self.controller.lock().await.handle(command).await
    }

    /// Current state snapshot without a command round-trip.
    pub async fn state(&self) -> PopupState {
        self.controller.lock().await.snapshot()
    }

    /// dApp entry: request account access for (origin, tab).
    ///
    /// The receiver resolves whenever the user decides, which may be much
    /// later; awaiting it does not hold the engine lock.
    pub async fn request_accounts(
        &self,
        origin: &str,
        tab_id: &str,
    ) -> Result<oneshot::Receiver<AccountsReply>> {
        self.controller.lock().await.request_accounts(origin, tab_id)
    }

    /// dApp entry: request signatures over a base58 transaction message.
    pub async fn request_sign_transaction(
        &self,
        tab_id: &str,
        message: &str,
        signers: Vec<String>,
    ) -> Result<oneshot::Receiver<SignatureReply>> {
        self.controller
            .lock()
            .await
            .request_sign_transaction(tab_id, message, signers)
    }

    /// Subscribe to the notification fan-out.
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<Notification> {
        self.notifier.subscribe()
    }

    /// Reject all pending requests so no dApp caller hangs past teardown.
    pub async fn shutdown(&self) {
        info!("wallet service shutting down");
        self.controller.lock().await.shutdown();
    }
}
