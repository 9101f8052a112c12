//! Skiff wallet core
//!
//! This crate implements the key-handling primitives of the wallet engine:
//! the password-sealed seed vault, the deterministic ed25519 keyring, and
//! the network catalog.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod keyring;
pub mod network;
pub mod vault;

pub use error::{Error, Result};
pub use keyring::{Account, Keyring, SIGNATURE_LENGTH};
pub use network::{available_networks, default_network, find_network, Network};
pub use vault::{KdfDigest, SecretBox, VaultPayload, DEFAULT_KDF_ITERATIONS};
