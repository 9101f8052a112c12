//! Engine façade
//!
//! `PopupController` is the single entry point of the wallet engine. It
//! receives one command at a time, validates it, dispatches across the
//! session, store, registry and authorization store, fans out notifications
//! describing what changed, and always returns the current state snapshot.
//! Failed commands mutate nothing observable; the snapshot still comes back
//! so the popup can resynchronize.

use crate::chain::ChainClient;
use crate::command::{EngineResponse, PopupCommand, PopupState, TransferParams};
use crate::notify::{Notification, Notifier, StateLabel};
use crate::origins::AuthorizedOrigins;
use crate::registry::{AccountsReply, RequestRegistry, SignatureReply, SignatureResult};
use crate::session::Session;
use crate::store::{StorageBackend, WalletStore};
use crate::tokens::{Mint, TokenRegistry};
use crate::{Error, Result};
use skiff_core::{available_networks, find_network, Keyring, Network};
use std::sync::Arc;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

const DECLINE_ACCOUNTS_REASON: &str = "access to accounts denied";
const DECLINE_TRANSACTION_REASON: &str = "Transaction declined";

/// The wallet engine controller
pub struct PopupController {
    store: WalletStore,
    session: Session,
    registry: RequestRegistry,
    origins: AuthorizedOrigins,
    tokens: TokenRegistry,
    notifier: Arc<Notifier>,
    chain: Arc<dyn ChainClient>,
}

impl PopupController {
    /// Open the controller over a storage backend and chain client.
    ///
    /// Loads any persisted wallet, seeds the session from it (a created
    /// wallet starts locked), and points the chain client at the persisted
    /// network.
    pub async fn open(
        backend: Box<dyn StorageBackend>,
        chain: Arc<dyn ChainClient>,
    ) -> Result<Self> {
        let (store, stored) = WalletStore::open(backend)?;
        let session = if store.is_initialized() {
            Session::locked(stored.selected_network.clone(), stored.selected_account.clone())
        } else {
            Session::uninitialized()
        };
        chain.set_network(session.selected_network().clone()).await?;
        Ok(Self {
            store,
            session,
            registry: RequestRegistry::new(),
            origins: AuthorizedOrigins::from_vec(stored.authorized_origins),
            tokens: TokenRegistry::from_map(stored.tokens),
            notifier: Arc::new(Notifier::new()),
            chain,
        })
    }

    /// Notification fan-out handle
    pub fn notifier(&self) -> Arc<Notifier> {
        self.notifier.clone()
    }

    /// Handle one command: dispatch, then return the error (if any) with
    /// the current snapshot. Nothing thrown past this boundary.
    pub async fn handle(&mut self, command: PopupCommand) -> EngineResponse {
        let mutating = !matches!(command, PopupCommand::GetState);
        let result = self.dispatch(command).await;
        let state = self.snapshot();
        match &result {
            Ok(()) => {
                if mutating {
                    self.notifier
                        .broadcast(Notification::PopupStateChanged(state.clone()));
                }
            }
            Err(err) => warn!(%err, "command failed"),
        }
        EngineResponse {
            error: result.err(),
            state,
        }
    }

    async fn dispatch(&mut self, command: PopupCommand) -> Result<()> {
        match command {
            PopupCommand::GetState => Ok(()),
            PopupCommand::CreateWallet {
                mnemonic,
                seed,
                password,
            } => self.create_wallet(&mnemonic, &seed, &password),
            PopupCommand::UnlockWallet { password, origin } => {
                self.unlock_wallet(&password, origin.as_deref())
            }
            PopupCommand::LockWallet => self.lock_wallet(),
            PopupCommand::ApproveAccountRequest { origin, tab_id } => {
                self.approve_account_request(&origin, &tab_id)
            }
            PopupCommand::DeclineAccountRequest { origin, tab_id } => {
                self.decline_account_request(&origin, &tab_id)
            }
            PopupCommand::DeleteAuthorizedWebsite { origin } => {
                self.delete_authorized_website(&origin)
            }
            PopupCommand::ApproveTransaction { tab_id } => self.approve_transaction(&tab_id),
            PopupCommand::DeclineTransaction { tab_id } => self.decline_transaction(&tab_id),
            PopupCommand::AddToken { mint } => self.add_token(mint),
            PopupCommand::RemoveToken { mint_address } => self.remove_token(&mint_address),
            PopupCommand::UpdateToken { public_key, mint } => {
                self.update_token(&public_key, mint)
            }
            PopupCommand::AddWalletAccount => self.add_wallet_account(),
            PopupCommand::ChangeNetwork { cluster, endpoint } => {
                self.change_network(&cluster, endpoint.as_deref()).await
            }
            PopupCommand::ChangeAccount { account } => self.change_account(&account),
            PopupCommand::SendToken { transfer } => self.send_token(&transfer).await,
        }
    }

    // ------------------------------------------------------------------
    // Provider-side entry points (dApp path)
    // ------------------------------------------------------------------

    /// Register an account-access request from a dApp.
    ///
    /// An already-authorized origin with an unlocked wallet resolves
    /// immediately; everything else waits for a popup decision.
    pub fn request_accounts(
        &mut self,
        origin: &str,
        tab_id: &str,
    ) -> Result<oneshot::Receiver<AccountsReply>> {
        require_param(origin, "origin")?;
        require_param(tab_id, "tabId")?;

        if self.origins.contains(origin) && self.store.is_unlocked() {
            debug!(%origin, "origin already authorized; resolving immediately");
            let (tx, rx) = oneshot::channel();
            let keys = self.store.keyring()?.public_keys();
            let _ = tx.send(Ok(keys));
            return Ok(rx);
        }

        let rx = self.registry.register_account_request(origin, tab_id);
        let state = self.snapshot();
        self.notifier.broadcast(Notification::PopupStateChanged(state));
        Ok(rx)
    }

    /// Register a transaction-signing request from a dApp.
    pub fn request_sign_transaction(
        &mut self,
        tab_id: &str,
        message: &str,
        signers: Vec<String>,
    ) -> Result<oneshot::Receiver<SignatureReply>> {
        require_param(tab_id, "tabId")?;
        require_param(message, "message")?;
        bs58::decode(message)
            .into_vec()
            .map_err(|_| Error::InvalidParams("message is not valid base58".to_string()))?;

        let rx = self.registry.register_transaction_request(tab_id, message, signers);
        let state = self.snapshot();
        self.notifier.broadcast(Notification::PopupStateChanged(state));
        Ok(rx)
    }

    /// Reject every pending request; called at teardown so no dApp caller
    /// is left hanging.
    pub fn shutdown(&mut self) {
        self.registry.reject_all("wallet shutting down");
    }

    /// Current full state snapshot
    pub fn snapshot(&self) -> PopupState {
        let accounts = self
            .store
            .keyring()
            .map(Keyring::public_keys)
            .unwrap_or_default();
        PopupState {
            wallet_state: self.session.state(),
            accounts,
            selected_account: self.session.selected_account().cloned(),
            selected_network: self.session.selected_network().clone(),
            available_networks: available_networks().to_vec(),
            pending_transactions: self.registry.pending_transactions(),
            pending_request_accounts: self.registry.pending_account_requests(),
            authorized_origins: self.origins.to_vec(),
            tokens: self.tokens.list(&self.session.selected_network().cluster),
        }
    }

    // ------------------------------------------------------------------
    // Command handlers
    // ------------------------------------------------------------------

    fn create_wallet(&mut self, mnemonic: &str, seed: &[u8], password: &str) -> Result<()> {
        require_param(mnemonic, "mnemonic")?;
        require_param(password, "password")?;
        if seed.is_empty() {
            return Err(Error::InvalidParams("seed is required".to_string()));
        }

        self.store.create_secret_box(mnemonic, seed, password, false)?;
        self.session.set_unlocked();
        let keys = self.store.keyring()?.public_keys();
        self.session.reconcile_account(&keys);
        self.persist()?;

        info!("wallet created");
        self.notifier.broadcast(Notification::StateChanged {
            state: StateLabel::Unlocked,
        });
        Ok(())
    }

    fn unlock_wallet(&mut self, password: &str, origin: Option<&str>) -> Result<()> {
        self.store.unlock(password)?;
        self.session.set_unlocked();
        let keys = self.store.keyring()?.public_keys();
        self.session.reconcile_account(&keys);

        // An already-trusted origin learns it still has standing access
        let state = match origin {
            Some(origin) if self.origins.contains(origin) => StateLabel::Authorized,
            _ => StateLabel::Unlocked,
        };
        self.notifier.broadcast(Notification::StateChanged { state });
        Ok(())
    }

    fn lock_wallet(&mut self) -> Result<()> {
        if !self.store.is_initialized() {
            return Err(Error::NoWalletLoaded);
        }
        self.store.lock();
        self.session.set_locked();
        self.notifier.broadcast(Notification::StateChanged {
            state: StateLabel::Locked,
        });
        Ok(())
    }

    fn approve_account_request(&mut self, origin: &str, tab_id: &str) -> Result<()> {
        require_param(origin, "origin")?;
        require_param(tab_id, "tabId")?;
        let keys = self.store.keyring()?.public_keys();
        if !self.registry.has_account_requests(origin) {
            return Err(Error::RequestNotFound(format!(
                "no account requests for {origin}"
            )));
        }

        // Persist the grant before settling: a storage failure must leave
        // the requests pending and the origin unauthorized.
        self.origins.add(origin);
        if let Err(err) = self.persist() {
            self.origins.remove(origin);
            return Err(err);
        }

        // Authorization is per-origin: approve every tab waiting under it
        for (tab, sender) in self.registry.take_account_requests_for_origin(origin)? {
            debug!(%origin, tab_id = %tab, "resolving account request");
            if sender.send(Ok(keys.clone())).is_err() {
                debug!(%origin, tab_id = %tab, "account requester went away before resolve");
            }
        }

        self.notifier.broadcast(Notification::StateChanged {
            state: StateLabel::Authorized,
        });
        Ok(())
    }

    fn decline_account_request(&mut self, origin: &str, tab_id: &str) -> Result<()> {
        require_param(origin, "origin")?;
        require_param(tab_id, "tabId")?;
        self.registry
            .decline_account_request(origin, tab_id, DECLINE_ACCOUNTS_REASON)
    }

    fn delete_authorized_website(&mut self, origin: &str) -> Result<()> {
        require_param(origin, "origin")?;
        if self.origins.remove(origin) {
            info!(%origin, "standing authorization revoked");
        }
        self.persist()
    }

    fn approve_transaction(&mut self, tab_id: &str) -> Result<()> {
        require_param(tab_id, "tabId")?;
        // Check the keyring before taking: a locked wallet must not consume
        // the pending request.
        self.store.keyring()?;

        let pending = self.registry.take_transaction(tab_id)?;
        let message = match bs58::decode(&pending.info().message).into_vec() {
            Ok(bytes) => bytes,
            Err(_) => {
                pending.reject("malformed transaction message");
                return Err(Error::InvalidParams(
                    "transaction message is not valid base58".to_string(),
                ));
            }
        };

        let keyring = self.store.keyring()?;
        let signers = pending.info().signers.clone();
        let mut signatures = Vec::with_capacity(signers.len());
        for signer in &signers {
            let Some(account) = keyring.find_account(signer) else {
                // Whole request fails: no partial signature list escapes
                let reason = format!("no account found for signer key: {signer}");
                pending.reject(&reason);
                return Err(Error::SignerNotFound(signer.clone()));
            };
            signatures.push(sign_with(account, &message));
        }

        info!(%tab_id, signers = signatures.len(), "transaction approved");
        pending.resolve(signatures);
        Ok(())
    }

    fn decline_transaction(&mut self, tab_id: &str) -> Result<()> {
        require_param(tab_id, "tabId")?;
        let pending = self.registry.take_transaction(tab_id)?;
        pending.reject(DECLINE_TRANSACTION_REASON);
        Ok(())
    }

    fn add_token(&mut self, mint: Mint) -> Result<()> {
        let cluster = self.session.selected_network().cluster.clone();
        self.tokens.add_mint(&cluster, mint)?;
        self.persist()
    }

    fn remove_token(&mut self, mint_address: &str) -> Result<()> {
        require_param(mint_address, "mintAddress")?;
        let cluster = self.session.selected_network().cluster.clone();
        self.tokens.remove_mint(&cluster, mint_address);
        self.persist()
    }

    fn update_token(&mut self, public_key: &str, mint: Mint) -> Result<()> {
        require_param(public_key, "publicKey")?;
        let cluster = self.session.selected_network().cluster.clone();
        self.tokens.update_mint(&cluster, public_key, mint)?;
        self.persist()
    }

    fn add_wallet_account(&mut self) -> Result<()> {
        let public_key = self.store.add_account()?;
        self.session.set_account(public_key);
        self.persist()?;

        let keys = self.store.keyring()?.public_keys();
        self.notifier.broadcast(Notification::AccountsChanged(keys));
        Ok(())
    }

    async fn change_network(&mut self, cluster: &str, endpoint: Option<&str>) -> Result<()> {
        if cluster.is_empty() {
            return Err(Error::NetworkUnspecified);
        }
        let network = match find_network(cluster) {
            Some(network) => network,
            None => match endpoint {
                Some(endpoint) if !endpoint.is_empty() => Network::custom(cluster, endpoint),
                _ => return Err(Error::NetworkUnspecified),
            },
        };

        // Retarget first so a failure leaves the session on the old network;
        // the switch and its notification share this critical section, so no
        // command can observe one without the other.
        self.chain.set_network(network.clone()).await?;
        self.session.set_network(network.clone());
        self.persist()?;

        info!(cluster = %network.cluster, "network changed");
        self.notifier
            .broadcast(Notification::ClusterChanged(network));
        Ok(())
    }

    fn change_account(&mut self, account: &str) -> Result<()> {
        require_param(account, "account")?;
        let keys = self.store.keyring()?.public_keys();
        if !keys.iter().any(|k| k == account) {
            return Err(Error::AccountNotFound(account.to_string()));
        }
        self.session.set_account(account.to_string());
        self.persist()
    }

    /// No-confirmation self-transfer: the command already originates from
    /// the popup (the user), so it skips the arbitration registry, but it
    /// signs through the same keyring routine as transaction approval.
    async fn send_token(&mut self, transfer: &TransferParams) -> Result<()> {
        require_param(&transfer.from_pubkey, "transfer.fromPubkey")?;
        require_param(&transfer.to_pubkey, "transfer.toPubkey")?;
        let keyring = self.store.keyring()?;
        let account = keyring
            .find_account(&transfer.from_pubkey)
            .ok_or_else(|| Error::AccountNotFound(transfer.from_pubkey.clone()))?;

        let message = self.chain.build_transfer_message(transfer).await?;
        let signature = sign_with(account, &message);
        let tx_signature = self.chain.submit(&message, &[signature]).await?;
        info!(%tx_signature, lamports = transfer.lamports, "transfer submitted");
        Ok(())
    }

    fn persist(&mut self) -> Result<()> {
        self.store.save(
            self.session.selected_network().clone(),
            self.session.selected_account().cloned(),
            self.origins.to_vec(),
            self.tokens.to_map(),
        )
    }
}

fn require_param(value: &str, name: &str) -> Result<()> {
    if value.is_empty() {
        return Err(Error::InvalidParams(format!("{name} is required")));
    }
    Ok(())
}

fn sign_with(account: &skiff_core::Account, message: &[u8]) -> SignatureResult {
    let signature = account.sign(message);
    SignatureResult {
        public_key: account.public_key().to_string(),
        signature: bs58::encode(signature).into_string(),
    }
}
