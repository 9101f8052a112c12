//! Deterministic account keyring
//!
//! In-memory set of ed25519 accounts derived from the vault seed by index.
//! Account `i` is always the same function of the seed, so the persisted
//! account count is enough to rebuild the exact account list on the next
//! unlock. The keyring holds the only plaintext key material of an unlocked
//! session and zeroes it when dropped.

use crate::{Error, Result};
use ed25519_dalek::{Signer, SigningKey};
use hmac::{Hmac, Mac};
use sha2::Sha512;
use zeroize::{Zeroize, Zeroizing};

/// Detached ed25519 signature length
pub const SIGNATURE_LENGTH: usize = 64;

/// Domain tag for account derivation; changing it would change every
/// derived key, so it is part of the wallet's durability contract.
const DERIVATION_TAG: &[u8] = b"skiff/account/v1";

type HmacSha512 = Hmac<Sha512>;

/// A single derived account: an ed25519 keypair at a fixed index.
pub struct Account {
    index: u32,
    signing_key: SigningKey,
    public_key: String,
}

impl Account {
    /// Derivation index of this account
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Base58-encoded public identity
    pub fn public_key(&self) -> &str {
        &self.public_key
    }

    /// Produce a detached signature over the exact bytes given.
    ///
    /// The caller is responsible for `message` being the canonical unsigned
    /// transaction serialization; nothing is re-serialized here.
    pub fn sign(&self, message: &[u8]) -> [u8; SIGNATURE_LENGTH] {
        self.signing_key.sign(message).to_bytes()
    }
}

impl Drop for Account {
    fn drop(&mut self) {
        // SigningKey zeroizes its own secret half on drop (dalek does this
        // internally); scrub the public string for symmetry.
        self.public_key.zeroize();
    }
}

/// Ordered sequence of accounts derived from one seed
pub struct Keyring {
    seed: Zeroizing<Vec<u8>>,
    accounts: Vec<Account>,
}

impl Keyring {
    /// Build a keyring from a seed with the first account derived.
    pub fn unlock_with(seed: &[u8]) -> Result<Self> {
        Self::restore(seed, 1)
    }

    /// Rebuild a keyring with `count` accounts, as recorded at last lock.
    pub fn restore(seed: &[u8], count: u32) -> Result<Self> {
        if seed.len() < 16 {
            return Err(Error::InvalidSeed(
                "Seed must be at least 16 bytes".to_string(),
            ));
        }
        if count == 0 {
            return Err(Error::InvalidKey(
                "A keyring holds at least one account".to_string(),
            ));
        }
        let mut keyring = Self {
            seed: Zeroizing::new(seed.to_vec()),
            accounts: Vec::with_capacity(count as usize),
        };
        for index in 0..count {
            let account = keyring.derive(index)?;
            keyring.accounts.push(account);
        }
        Ok(keyring)
    }

    /// Derive the account at the next index, append it, and return it.
    ///
    /// Indices are never reused; accounts are never removed.
    pub fn add_account(&mut self) -> Result<&Account> {
        let index = self.accounts.len();
        let account = self.derive(index as u32)?;
        self.accounts.push(account);
        Ok(&self.accounts[index])
    }

    /// Look up an account by its base58 public key.
    ///
    /// Engine-internal: used for signature issuance only.
    pub fn find_account(&self, public_key: &str) -> Option<&Account> {
        self.accounts.iter().find(|a| a.public_key == public_key)
    }

    /// Base58 public identities in derivation order.
    ///
    /// This ordering is user-visible and stable across restarts for the
    /// same seed.
    pub fn public_keys(&self) -> Vec<String> {
        self.accounts.iter().map(|a| a.public_key.clone()).collect()
    }

    /// Number of derived accounts
    pub fn account_count(&self) -> u32 {
        self.accounts.len() as u32
    }

    fn derive(&self, index: u32) -> Result<Account> {
        let mut mac = HmacSha512::new_from_slice(&self.seed)
            .map_err(|e| Error::KeyDerivation(e.to_string()))?;
        mac.update(DERIVATION_TAG);
        mac.update(&index.to_le_bytes());
        let digest = mac.finalize().into_bytes();

        let mut key_bytes = Zeroizing::new([0u8; 32]);
        key_bytes.copy_from_slice(&digest[..32]);
        let signing_key = SigningKey::from_bytes(&key_bytes);
        let public_key = bs58::encode(signing_key.verifying_key().to_bytes()).into_string();

        Ok(Account {
            index,
            signing_key,
            public_key,
        })
    }
}
