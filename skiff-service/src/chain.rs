//! Chain client seam
//!
//! The engine never talks to a cluster directly: network retargeting and
//! transfer dispatch go through this trait. Failures here are reported to
//! the caller and never become part of the engine's own state. The real RPC
//! client lives outside this crate; `NullChain` is the in-tree double used
//! by tests.

use crate::command::TransferParams;
use crate::registry::SignatureResult;
use crate::{Error, Result};
use async_trait::async_trait;
use parking_lot::Mutex;
use skiff_core::Network;

/// External connection collaborator
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Point the client at a different cluster.
    async fn set_network(&self, network: Network) -> Result<()>;

    /// Serialize the canonical unsigned message for a native transfer.
    ///
    /// Instruction construction is deliberately outside the engine; the
    /// returned bytes are exactly what gets signed.
    async fn build_transfer_message(&self, transfer: &TransferParams) -> Result<Vec<u8>>;

    /// Submit a signed message; returns the network's transaction signature.
    async fn submit(&self, message: &[u8], signatures: &[SignatureResult]) -> Result<String>;
}

/// Recording chain double for tests
#[derive(Default)]
pub struct NullChain {
    state: Mutex<NullChainState>,
}

#[derive(Default)]
struct NullChainState {
    network: Option<Network>,
    submissions: Vec<(Vec<u8>, Vec<SignatureResult>)>,
    fail_submissions: bool,
}

impl NullChain {
    /// Chain double that accepts everything
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `submit` fail
    pub fn fail_submissions(&self) {
        self.state.lock().fail_submissions = true;
    }

    /// Network last set via `set_network`
    pub fn current_network(&self) -> Option<Network> {
        self.state.lock().network.clone()
    }

    /// Number of accepted submissions
    pub fn submission_count(&self) -> usize {
        self.state.lock().submissions.len()
    }

    /// Signatures attached to the most recent submission
    pub fn last_signatures(&self) -> Vec<SignatureResult> {
        self.state
            .lock()
            .submissions
            .last()
            .map(|(_, sigs)| sigs.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl ChainClient for NullChain {
    async fn set_network(&self, network: Network) -> Result<()> {
        self.state.lock().network = Some(network);
        Ok(())
    }

    async fn build_transfer_message(&self, transfer: &TransferParams) -> Result<Vec<u8>> {
        // Deterministic stand-in for the canonical serialization
        serde_json::to_vec(transfer).map_err(|e| Error::SubmissionFailure(e.to_string()))
    }

    async fn submit(&self, message: &[u8], signatures: &[SignatureResult]) -> Result<String> {
        let mut state = self.state.lock();
        if state.fail_submissions {
            return Err(Error::SubmissionFailure("cluster unreachable".to_string()));
        }
        state.submissions.push((message.to_vec(), signatures.to_vec()));
        Ok(signatures
            .first()
            .map(|s| s.signature.clone())
            .unwrap_or_else(|| "unsigned".to_string()))
    }
}
