//! Wallet session and request-arbitration engine.
//!
//! This crate is the background half of an extension wallet: it owns the
//! session state machine, the pending-request registry, origin
//! authorizations and durable storage, and exposes the whole thing through
//! [`WalletService`]. Vault sealing and key derivation live in
//! [`skiff_core`]; talking to an actual cluster is behind the
//! [`ChainClient`] seam.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod chain;
pub mod command;
pub mod controller;
pub mod error;
pub mod notify;
pub mod origins;
pub mod registry;
pub mod service;
pub mod session;
pub mod store;
pub mod tokens;

pub use chain::{ChainClient, NullChain};
pub use command::{EngineResponse, PopupCommand, PopupState, TransferParams};
pub use controller::PopupController;
pub use error::{Error, Result};
pub use notify::{Notification, Notifier, StateLabel};
pub use origins::AuthorizedOrigins;
pub use registry::{
    AccountsReply, PendingAccountInfo, PendingTransactionInfo, RequestRegistry, SignatureReply,
    SignatureResult,
};
pub use service::WalletService;
pub use session::{Session, WalletState};
pub use store::{FileStorage, MemoryStorage, StorageBackend, StoredData, WalletStore};
pub use tokens::{Mint, MintMap, TokenRegistry};
