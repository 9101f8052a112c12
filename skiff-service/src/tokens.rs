//! Token metadata registry
//!
//! Purely descriptive mint metadata keyed by network, then mint address.
//! No invariant beyond key uniqueness.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Descriptive metadata for one token mint
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Mint {
    /// Mint address (the registry key)
    pub public_key: Option<String>,
    /// Display name
    pub name: Option<String>,
    /// Ticker symbol
    pub symbol: Option<String>,
    /// Decimal places
    pub decimals: Option<u8>,
}

/// Mint map for persistence: network -> mint address -> metadata
pub type MintMap = BTreeMap<String, BTreeMap<String, Mint>>;

/// Per-network token metadata registry
#[derive(Debug, Default)]
pub struct TokenRegistry {
    by_network: MintMap,
}

impl TokenRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Restore from the persisted map
    pub fn from_map(by_network: MintMap) -> Self {
        Self { by_network }
    }

    /// Add a mint under a network; the mint address is required.
    pub fn add_mint(&mut self, network: &str, mint: Mint) -> Result<()> {
        let address = mint
            .public_key
            .clone()
            .ok_or_else(|| Error::InvalidParams("mint.publicKey is required".to_string()))?;
        self.by_network
            .entry(network.to_string())
            .or_default()
            .insert(address, mint);
        Ok(())
    }

    /// Remove a mint; absent entries are ignored.
    pub fn remove_mint(&mut self, network: &str, mint_address: &str) {
        if let Some(mints) = self.by_network.get_mut(network) {
            mints.remove(mint_address);
        }
    }

    /// Replace the metadata stored under `public_key`.
    pub fn update_mint(&mut self, network: &str, public_key: &str, mut mint: Mint) -> Result<()> {
        let mints = self
            .by_network
            .get_mut(network)
            .ok_or_else(|| Error::RequestNotFound(format!("no tokens for network {network}")))?;
        if !mints.contains_key(public_key) {
            return Err(Error::RequestNotFound(format!(
                "no token {public_key} on {network}"
            )));
        }
        mint.public_key = Some(public_key.to_string());
        mints.insert(public_key.to_string(), mint);
        Ok(())
    }

    /// Mints known for a network, in address order.
    pub fn list(&self, network: &str) -> Vec<Mint> {
        self.by_network
            .get(network)
            .map(|m| m.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Full map for persistence
    pub fn to_map(&self) -> MintMap {
        self.by_network.clone()
    }
}
