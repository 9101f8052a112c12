//! Network catalog
//!
//! Known clusters the wallet can point at, plus support for user-supplied
//! custom endpoints. The selected network always has a valid endpoint; the
//! default is Devnet.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

/// A network the wallet can target
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Network {
    /// Human-readable name ("Devnet", "Custom", ...)
    pub title: String,
    /// Cluster identifier ("mainnet-beta", "devnet", "testnet", or custom)
    pub cluster: String,
    /// RPC endpoint URL
    pub endpoint: String,
}

impl Network {
    /// Build a custom network entry from a cluster name and endpoint.
    pub fn custom(cluster: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            title: "Custom".to_string(),
            cluster: cluster.into(),
            endpoint: endpoint.into(),
        }
    }
}

static AVAILABLE_NETWORKS: Lazy<Vec<Network>> = Lazy::new(|| {
    vec![
        Network {
            title: "Mainnet Beta".to_string(),
            cluster: "mainnet-beta".to_string(),
            endpoint: "https://api.mainnet-beta.solana.com".to_string(),
        },
        Network {
            title: "Devnet".to_string(),
            cluster: "devnet".to_string(),
            endpoint: "https://api.devnet.solana.com".to_string(),
        },
        Network {
            title: "Testnet".to_string(),
            cluster: "testnet".to_string(),
            endpoint: "https://api.testnet.solana.com".to_string(),
        },
    ]
});

/// All known networks, in display order.
pub fn available_networks() -> &'static [Network] {
    &AVAILABLE_NETWORKS
}

/// The network a fresh wallet starts on.
pub fn default_network() -> Network {
    AVAILABLE_NETWORKS[1].clone()
}

/// Look up a known network by cluster identifier.
pub fn find_network(cluster: &str) -> Option<Network> {
    AVAILABLE_NETWORKS.iter().find(|n| n.cluster == cluster).cloned()
}
