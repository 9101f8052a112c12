//! Error types for the wallet engine
//!
//! Every command error is caught at the façade boundary and attached to the
//! response next to an unchanged state snapshot; nothing throws past the
//! controller.

/// Result type
pub type Result<T> = std::result::Result<T, Error>;

/// Wallet engine errors
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Command is missing or carries a malformed parameter; nothing mutated
    #[error("Invalid params: {0}")]
    InvalidParams(String),

    /// Vault authentication failed
    #[error("Invalid password")]
    InvalidPassword,

    /// Mnemonic failed BIP-39 validation
    #[error("Invalid mnemonic: {0}")]
    InvalidMnemonic(String),

    /// Operation requires an unlocked wallet
    #[error("No wallet loaded")]
    NoWalletLoaded,

    /// A secret box already exists and overwrite was not requested
    #[error("Wallet already exists")]
    VaultExists,

    /// Stale or duplicate settle of a pending request
    #[error("Request not found: {0}")]
    RequestNotFound(String),

    /// Referenced public key is not a wallet account
    #[error("Account not found: {0}")]
    AccountNotFound(String),

    /// A transaction signer is absent from the wallet
    #[error("Signer not found: {0}")]
    SignerNotFound(String),

    /// Network change without a usable cluster or endpoint
    #[error("Network unspecified")]
    NetworkUnspecified,

    /// Downstream transaction dispatch failed
    #[error("Submission failure: {0}")]
    SubmissionFailure(String),

    /// Persistence backend failure
    #[error("Storage error: {0}")]
    Storage(String),

    /// Vault or key handling failure not covered above
    #[error("Vault error: {0}")]
    Vault(String),
}

impl From<skiff_core::Error> for Error {
    fn from(err: skiff_core::Error) -> Self {
        match err {
            skiff_core::Error::InvalidPassword => Error::InvalidPassword,
            skiff_core::Error::InvalidMnemonic(msg) => Error::InvalidMnemonic(msg),
            other => Error::Vault(other.to_string()),
        }
    }
}
