//! Wallet store
//!
//! Owns the secret box and the unlocked keyring, and persists the versioned
//! wallet layout through a pluggable `StorageBackend`. The controller never
//! touches vault bytes or the account list directly; every mutation goes
//! through this store. The durable account list is just `account_count`:
//! derivation is deterministic, so that count re-derives the exact accounts
//! on the next unlock.

use crate::tokens::MintMap;
use crate::{Error, Result};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use skiff_core::{default_network, Keyring, Network, SecretBox};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Current persisted layout version
pub const STORAGE_VERSION: u32 = 1;

/// Durable wallet state
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredData {
    /// Password-sealed seed vault, if a wallet was created
    pub secret_box: Option<SecretBox>,
    /// Number of accounts to re-derive on unlock
    pub account_count: u32,
    /// Active network selection
    pub selected_network: Network,
    /// Active account selection
    pub selected_account: Option<String>,
    /// Origins with standing account access
    pub authorized_origins: Vec<String>,
    /// Token metadata, keyed by network then mint address
    pub tokens: MintMap,
}

impl Default for StoredData {
    fn default() -> Self {
        Self {
            secret_box: None,
            account_count: 0,
            selected_network: default_network(),
            selected_account: None,
            authorized_origins: Vec::new(),
            tokens: MintMap::new(),
        }
    }
}

/// Versioned envelope around the durable state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionedData {
    /// Layout version
    pub version: u32,
    /// Payload
    pub data: StoredData,
}

/// Persistence seam for the wallet's durable state
pub trait StorageBackend: Send {
    /// Load the persisted state, if any exists.
    fn load(&self) -> Result<Option<VersionedData>>;
    /// Persist the full state, replacing what was there.
    fn save(&self, data: &VersionedData) -> Result<()>;
}

/// In-memory backend for tests and ephemeral sessions
#[derive(Default)]
pub struct MemoryStorage {
    slot: Mutex<Option<VersionedData>>,
}

impl MemoryStorage {
    /// Empty backend
    pub fn new() -> Self {
        Self::default()
    }
}

impl StorageBackend for MemoryStorage {
    fn load(&self) -> Result<Option<VersionedData>> {
        Ok(self.slot.lock().clone())
    }

    fn save(&self, data: &VersionedData) -> Result<()> {
        *self.slot.lock() = Some(data.clone());
        Ok(())
    }
}

/// JSON-file backend
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    /// Backend writing to the given file path
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl StorageBackend for FileStorage {
    fn load(&self) -> Result<Option<VersionedData>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let bytes = std::fs::read(&self.path).map_err(|e| Error::Storage(e.to_string()))?;
        let data = serde_json::from_slice(&bytes)
            .map_err(|e| Error::Storage(format!("corrupt wallet file: {e}")))?;
        Ok(Some(data))
    }

    fn save(&self, data: &VersionedData) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(data).map_err(|e| Error::Storage(e.to_string()))?;
        // Write-then-rename so a crash mid-save never truncates the wallet
        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, bytes).map_err(|e| Error::Storage(e.to_string()))?;
        std::fs::rename(&tmp, &self.path).map_err(|e| Error::Storage(e.to_string()))?;
        Ok(())
    }
}

/// Owner of the vault and the unlocked keyring
pub struct WalletStore {
    backend: Box<dyn StorageBackend>,
    secret_box: Option<SecretBox>,
    keyring: Option<Keyring>,
    account_count: u32,
}

impl WalletStore {
    /// Open the store, loading any persisted wallet.
    ///
    /// Returns the store and the stored data so the caller can seed the
    /// session, authorization store and token registry from it.
    pub fn open(backend: Box<dyn StorageBackend>) -> Result<(Self, StoredData)> {
        let stored = match backend.load()? {
            Some(versioned) => {
                if versioned.version != STORAGE_VERSION {
                    return Err(Error::Storage(format!(
                        "unsupported wallet layout version {}",
                        versioned.version
                    )));
                }
                versioned.data
            }
            None => StoredData::default(),
        };
        debug!(
            has_vault = stored.secret_box.is_some(),
            accounts = stored.account_count,
            "wallet store opened"
        );
        let store = Self {
            backend,
            secret_box: stored.secret_box.clone(),
            keyring: None,
            account_count: stored.account_count,
        };
        Ok((store, stored))
    }

    /// Whether a secret box exists (wallet was created)
    pub fn is_initialized(&self) -> bool {
        self.secret_box.is_some()
    }

    /// Whether key material is resident
    pub fn is_unlocked(&self) -> bool {
        self.keyring.is_some()
    }

    /// The sealed vault, for persistence
    pub fn secret_box(&self) -> Option<&SecretBox> {
        self.secret_box.as_ref()
    }

    /// Number of derived accounts (durable even while locked)
    pub fn account_count(&self) -> u32 {
        self.account_count
    }

    /// The unlocked keyring, or `NoWalletLoaded`
    pub fn keyring(&self) -> Result<&Keyring> {
        self.keyring.as_ref().ok_or(Error::NoWalletLoaded)
    }

    /// Create the vault and unlock the first account.
    ///
    /// Fails with `VaultExists` if a box is already present and `overwrite`
    /// was not requested.
    pub fn create_secret_box(
        &mut self,
        mnemonic: &str,
        seed: &[u8],
        password: &str,
        overwrite: bool,
    ) -> Result<()> {
        if self.secret_box.is_some() && !overwrite {
            return Err(Error::VaultExists);
        }
        let sealed = SecretBox::create(mnemonic, seed, password)?;
        let keyring = Keyring::unlock_with(seed)?;
        info!("secret box created");
        self.secret_box = Some(sealed);
        self.account_count = keyring.account_count();
        self.keyring = Some(keyring);
        Ok(())
    }

    /// Unlock the vault and re-derive the recorded number of accounts.
    ///
    /// A failed unlock leaves no key material behind.
    pub fn unlock(&mut self, password: &str) -> Result<()> {
        let sealed = self.secret_box.as_ref().ok_or(Error::NoWalletLoaded)?;
        let payload = sealed.unlock(password)?;
        let count = self.account_count.max(1);
        let keyring = Keyring::restore(&payload.seed, count)?;
        info!(accounts = count, "wallet unlocked");
        self.account_count = keyring.account_count();
        self.keyring = Some(keyring);
        Ok(())
    }

    /// Drop the keyring; its key material is zeroed on drop. Idempotent.
    pub fn lock(&mut self) {
        if self.keyring.take().is_some() {
            info!("wallet locked");
        }
    }

    /// Derive the next account and return its public key.
    pub fn add_account(&mut self) -> Result<String> {
        let keyring = self.keyring.as_mut().ok_or(Error::NoWalletLoaded)?;
        let public_key = keyring.add_account()?.public_key().to_string();
        self.account_count = keyring.account_count();
        debug!(account = %public_key, "account added");
        Ok(public_key)
    }

    /// Persist the full durable layout.
    pub fn save(
        &self,
        selected_network: Network,
        selected_account: Option<String>,
        authorized_origins: Vec<String>,
        tokens: MintMap,
    ) -> Result<()> {
        let data = VersionedData {
            version: STORAGE_VERSION,
            data: StoredData {
                secret_box: self.secret_box.clone(),
                account_count: self.account_count,
                selected_network,
                selected_account,
                authorized_origins,
                tokens,
            },
        };
        self.backend.save(&data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MNEMONIC: &str =
        "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";
    const SEED: [u8; 32] = [5u8; 32];

    fn open_memory() -> WalletStore {
        WalletStore::open(Box::new(MemoryStorage::new())).unwrap().0
    }

    #[test]
    fn test_create_then_duplicate_create_fails() {
        let mut store = open_memory();
        store.create_secret_box(MNEMONIC, &SEED, "pw", false).unwrap();
        assert!(store.is_unlocked());
        assert!(matches!(
            store.create_secret_box(MNEMONIC, &SEED, "pw", false),
            Err(Error::VaultExists)
        ));
        // Explicit overwrite is allowed
        store.create_secret_box(MNEMONIC, &SEED, "pw2", true).unwrap();
    }

    #[test]
    fn test_unlock_wrong_password_stays_locked() {
        let mut store = open_memory();
        store.create_secret_box(MNEMONIC, &SEED, "pw", false).unwrap();
        store.lock();

        assert!(matches!(store.unlock("nope"), Err(Error::InvalidPassword)));
        assert!(!store.is_unlocked());
        store.unlock("pw").unwrap();
        assert!(store.is_unlocked());
    }

    #[test]
    fn test_account_count_survives_lock_cycle() {
        let mut store = open_memory();
        store.create_secret_box(MNEMONIC, &SEED, "pw", false).unwrap();
        let first = store.keyring().unwrap().public_keys();
        store.add_account().unwrap();
        store.add_account().unwrap();
        let before = store.keyring().unwrap().public_keys();

        store.lock();
        assert!(matches!(store.keyring(), Err(Error::NoWalletLoaded)));
        store.unlock("pw").unwrap();

        let after = store.keyring().unwrap().public_keys();
        assert_eq!(after, before);
        assert_eq!(after[0], first[0]);
        assert_eq!(store.account_count(), 3);
    }

    #[test]
    fn test_persistence_roundtrip_through_backend() {
        let backend = std::sync::Arc::new(MemoryStorage::new());

        struct Shared(std::sync::Arc<MemoryStorage>);
        impl StorageBackend for Shared {
            fn load(&self) -> Result<Option<VersionedData>> {
                self.0.load()
            }
            fn save(&self, data: &VersionedData) -> Result<()> {
                self.0.save(data)
            }
        }

        let (mut store, _) = WalletStore::open(Box::new(Shared(backend.clone()))).unwrap();
        store.create_secret_box(MNEMONIC, &SEED, "pw", false).unwrap();
        store.add_account().unwrap();
        store
            .save(default_network(), None, vec!["https://a".to_string()], MintMap::new())
            .unwrap();

        let (mut reopened, stored) = WalletStore::open(Box::new(Shared(backend))).unwrap();
        assert_eq!(stored.account_count, 2);
        assert_eq!(stored.authorized_origins, vec!["https://a".to_string()]);
        assert!(reopened.is_initialized());
        assert!(!reopened.is_unlocked());

        reopened.unlock("pw").unwrap();
        assert_eq!(reopened.keyring().unwrap().account_count(), 2);
    }

    #[test]
    fn test_file_storage_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wallet.json");

        {
            let (mut store, _) = WalletStore::open(Box::new(FileStorage::new(&path))).unwrap();
            store.create_secret_box(MNEMONIC, &SEED, "pw", false).unwrap();
            store
                .save(default_network(), None, Vec::new(), MintMap::new())
                .unwrap();
        }

        let (mut store, stored) = WalletStore::open(Box::new(FileStorage::new(&path))).unwrap();
        assert!(stored.secret_box.is_some());
        store.unlock("pw").unwrap();
    }

    #[test]
    fn test_unsupported_version_rejected() {
        let backend = MemoryStorage::new();
        backend
            .save(&VersionedData {
                version: 99,
                data: StoredData::default(),
            })
            .unwrap();
        assert!(matches!(
            WalletStore::open(Box::new(backend)),
            Err(Error::Storage(_))
        ));
    }
}
