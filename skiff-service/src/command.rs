//! Commands and state snapshots
//!
//! The command surface is a closed enum rather than a string-keyed method
//! switch: adding a command is a compile-time-checked change, and the
//! controller matches exhaustively. Each response carries the full state
//! snapshot so callers re-render without diffing, on success and failure
//! alike.

use crate::error::Error;
use crate::registry::{PendingAccountInfo, PendingTransactionInfo};
use crate::session::WalletState;
use crate::tokens::Mint;
use serde::{Deserialize, Serialize};
use skiff_core::Network;

/// Native transfer parameters for the self-transfer convenience flow
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferParams {
    /// Sending wallet account, base58
    pub from_pubkey: String,
    /// Destination, base58
    pub to_pubkey: String,
    /// Amount in lamports
    pub lamports: u64,
}

/// One inbound popup command
#[derive(Debug, Clone)]
pub enum PopupCommand {
    /// Snapshot only, no mutation
    GetState,
    /// Create the vault and unlock the first account
    CreateWallet {
        /// BIP-39 recovery phrase
        mnemonic: String,
        /// Seed bytes accounts derive from
        seed: Vec<u8>,
        /// Vault password
        password: String,
    },
    /// Unlock the vault
    UnlockWallet {
        /// Vault password
        password: String,
        /// Origin of the requesting context, for the authorized overlay
        origin: Option<String>,
    },
    /// Lock the vault
    LockWallet,
    /// Resolve every pending account request for an origin
    ApproveAccountRequest {
        /// Origin to authorize
        origin: String,
        /// Tab the approval came from
        tab_id: String,
    },
    /// Reject one pending account request
    DeclineAccountRequest {
        /// Requesting origin
        origin: String,
        /// Tab whose request is declined
        tab_id: String,
    },
    /// Revoke an origin's standing authorization
    DeleteAuthorizedWebsite {
        /// Origin to revoke
        origin: String,
    },
    /// Sign and resolve the pending transaction for a tab
    ApproveTransaction {
        /// Tab whose request is approved
        tab_id: String,
    },
    /// Reject the pending transaction for a tab
    DeclineTransaction {
        /// Tab whose request is declined
        tab_id: String,
    },
    /// Add token metadata under the active network
    AddToken {
        /// Metadata; `public_key` is the mint address and is required
        mint: Mint,
    },
    /// Remove token metadata from the active network
    RemoveToken {
        /// Mint address
        mint_address: String,
    },
    /// Replace token metadata under the active network
    UpdateToken {
        /// Mint address being updated
        public_key: String,
        /// Replacement metadata
        mint: Mint,
    },
    /// Derive the next wallet account and select it
    AddWalletAccount,
    /// Switch the active network
    ChangeNetwork {
        /// Cluster identifier; known clusters need no endpoint
        cluster: String,
        /// Endpoint for a custom cluster
        endpoint: Option<String>,
    },
    /// Switch the selected account
    ChangeAccount {
        /// Base58 public key, must be a wallet account
        account: String,
    },
    /// Sign and submit a native self-transfer
    SendToken {
        /// Transfer parameters
        transfer: TransferParams,
    },
}

/// Full engine state snapshot returned with every response
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PopupState {
    /// Global lock state
    pub wallet_state: WalletState,
    /// Base58 account list in derivation order (empty while locked)
    pub accounts: Vec<String>,
    /// Selected account
    pub selected_account: Option<String>,
    /// Active network
    pub selected_network: Network,
    /// Known networks
    pub available_networks: Vec<Network>,
    /// Transactions awaiting a decision
    pub pending_transactions: Vec<PendingTransactionInfo>,
    /// Account requests awaiting a decision
    pub pending_request_accounts: Vec<PendingAccountInfo>,
    /// Origins with standing access
    pub authorized_origins: Vec<String>,
    /// Token metadata for the active network
    pub tokens: Vec<Mint>,
}

/// Response to one command: the error (if any) plus the current snapshot.
///
/// The snapshot is present even on failure so the popup can resynchronize
/// without assuming the command took effect.
#[derive(Debug)]
pub struct EngineResponse {
    /// Command error, if the command failed
    pub error: Option<Error>,
    /// Current full state
    pub state: PopupState,
}

impl EngineResponse {
    /// Whether the command succeeded
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}
