//! Error types for Skiff Core
//!
//! Error taxonomy for vault sealing/unsealing and key derivation.

/// Result type
pub type Result<T> = std::result::Result<T, Error>;

/// Skiff Core errors
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Mnemonic failed BIP-39 validation
    #[error("Invalid mnemonic: {0}")]
    InvalidMnemonic(String),

    /// Seed material is unusable
    #[error("Invalid seed: {0}")]
    InvalidSeed(String),

    /// Vault authentication failed
    ///
    /// Deliberately carries no detail: a wrong password, a tampered nonce
    /// and a truncated ciphertext must all look the same to the caller.
    #[error("Invalid password")]
    InvalidPassword,

    /// Stored secret box is malformed (not a wrong password)
    #[error("Invalid secret box: {0}")]
    InvalidSecretBox(String),

    /// Key derivation error
    #[error("Key derivation error: {0}")]
    KeyDerivation(String),

    /// Invalid key
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
