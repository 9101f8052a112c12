//! Password-sealed seed vault
//!
//! The vault stores the wallet's mnemonic and seed as a `SecretBox`: a
//! PBKDF2-derived key encrypts the payload with ChaCha20-Poly1305. The KDF
//! parameters (iteration count and digest) are recorded inside the box so a
//! later unlock reproduces the exact derivation. Once sealed, the box owns
//! no plaintext; unlocking hands out a `VaultPayload` that scrubs itself on
//! drop.

use crate::{Error, Result};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use chacha20poly1305::{
    aead::{Aead, KeyInit, OsRng},
    ChaCha20Poly1305, Nonce,
};
use pbkdf2::pbkdf2_hmac;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Sha256, Sha512};
use tracing::debug;
use zeroize::{Zeroize, Zeroizing};

/// Default PBKDF2 iteration count for newly created boxes
pub const DEFAULT_KDF_ITERATIONS: u32 = 100_000;

const KDF_NAME: &str = "pbkdf2";
const SALT_LENGTH: usize = 16;
const NONCE_LENGTH: usize = 12;

/// Digest recorded in the box and used by the PBKDF2 derivation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KdfDigest {
    /// HMAC-SHA256
    Sha256,
    /// HMAC-SHA512
    Sha512,
}

impl KdfDigest {
    /// Name as stored in the box
    pub fn as_str(&self) -> &'static str {
        match self {
            KdfDigest::Sha256 => "sha256",
            KdfDigest::Sha512 => "sha512",
        }
    }

    /// Parse a stored digest name
    pub fn parse(name: &str) -> Result<Self> {
        match name {
            "sha256" => Ok(KdfDigest::Sha256),
            "sha512" => Ok(KdfDigest::Sha512),
            other => Err(Error::InvalidSecretBox(format!(
                "Unknown KDF digest: {other}"
            ))),
        }
    }
}

/// Decrypted vault contents
///
/// Holds the only plaintext copy of the seed outside the keyring. Both
/// fields are zeroed when the payload is dropped.
#[derive(Debug)]
pub struct VaultPayload {
    /// BIP-39 recovery phrase
    pub mnemonic: String,
    /// Seed bytes the keyring derives accounts from
    pub seed: Vec<u8>,
}

impl Drop for VaultPayload {
    fn drop(&mut self) {
        self.mnemonic.zeroize();
        self.seed.zeroize();
    }
}

/// Serialized form of the payload inside the ciphertext
#[derive(Serialize, Deserialize)]
struct PayloadJson {
    mnemonic: String,
    seed: String,
}

/// Password-encrypted container for the wallet seed
///
/// Field encoding matches the persisted wallet layout: binary fields are
/// base64 strings, KDF parameters are stored alongside the ciphertext.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SecretBox {
    /// PBKDF2 salt, base64
    pub salt: String,
    /// AEAD nonce, base64
    pub nonce: String,
    /// KDF name, always "pbkdf2"
    pub kdf: String,
    /// PBKDF2 iteration count used at creation
    pub iterations: u32,
    /// PBKDF2 digest name
    pub digest: String,
    /// ChaCha20-Poly1305 ciphertext over the payload, base64
    pub encrypted_box: String,
}

impl SecretBox {
    /// Seal a mnemonic and seed under a password with default KDF parameters.
    pub fn create(mnemonic: &str, seed: &[u8], password: &str) -> Result<Self> {
        Self::create_with_params(mnemonic, seed, password, DEFAULT_KDF_ITERATIONS, KdfDigest::Sha256)
    }

    /// Seal with explicit KDF parameters.
    ///
    /// The mnemonic must be a valid BIP-39 phrase; the seed must be 16-64
    /// bytes. Salt and nonce are freshly random on every call, so sealing
    /// the same payload twice never produces the same box.
    pub fn create_with_params(
        mnemonic: &str,
        seed: &[u8],
        password: &str,
        iterations: u32,
        digest: KdfDigest,
    ) -> Result<Self> {
        bip39::Mnemonic::parse(mnemonic)
            .map_err(|e| Error::InvalidMnemonic(e.to_string()))?;
        if seed.len() < 16 || seed.len() > 64 {
            return Err(Error::InvalidSeed(format!(
                "Seed must be 16-64 bytes, got {}",
                seed.len()
            )));
        }
        if iterations == 0 {
            return Err(Error::KeyDerivation(
                "Iteration count must be non-zero".to_string(),
            ));
        }

        let mut salt = [0u8; SALT_LENGTH];
        OsRng.fill_bytes(&mut salt);
        let mut nonce_bytes = [0u8; NONCE_LENGTH];
        OsRng.fill_bytes(&mut nonce_bytes);

        let key = derive_key(password, &salt, iterations, digest);
        let cipher = ChaCha20Poly1305::new(key.as_ref().into());

        let payload = PayloadJson {
            mnemonic: mnemonic.to_string(),
            seed: hex::encode(seed),
        };
        let mut plaintext = Zeroizing::new(serde_json::to_vec(&payload)?);

        let nonce = Nonce::from_slice(&nonce_bytes);
        let ciphertext = cipher
            .encrypt(nonce, plaintext.as_slice())
            .map_err(|e| Error::KeyDerivation(e.to_string()))?;
        plaintext.zeroize();
        debug!(iterations, digest = digest.as_str(), "sealed secret box");

        Ok(Self {
            salt: BASE64.encode(salt),
            nonce: BASE64.encode(nonce_bytes),
            kdf: KDF_NAME.to_string(),
            iterations,
            digest: digest.as_str().to_string(),
            encrypted_box: BASE64.encode(ciphertext),
        })
    }

    /// Unseal the box with a password.
    ///
    /// Re-derives the key from the recorded salt/iterations/digest and
    /// authenticates the ciphertext. Every authentication failure surfaces
    /// as `InvalidPassword` with no further detail; no partial plaintext is
    /// ever returned.
    pub fn unlock(&self, password: &str) -> Result<VaultPayload> {
        if self.kdf != KDF_NAME {
            return Err(Error::InvalidSecretBox(format!(
                "Unknown KDF: {}",
                self.kdf
            )));
        }
        let digest = KdfDigest::parse(&self.digest)?;
        let salt = decode_field(&self.salt, "salt")?;
        let nonce_bytes = decode_field(&self.nonce, "nonce")?;
        if nonce_bytes.len() != NONCE_LENGTH {
            return Err(Error::InvalidSecretBox("Bad nonce length".to_string()));
        }
        let ciphertext = decode_field(&self.encrypted_box, "encryptedBox")?;

        let key = derive_key(password, &salt, self.iterations, digest);
        let cipher = ChaCha20Poly1305::new(key.as_ref().into());
        let nonce = Nonce::from_slice(&nonce_bytes);

        let plaintext = Zeroizing::new(
            cipher
                .decrypt(nonce, ciphertext.as_slice())
                .map_err(|_| Error::InvalidPassword)?,
        );

        let payload: PayloadJson = serde_json::from_slice(&plaintext)
            .map_err(|_| Error::InvalidSecretBox("Malformed payload".to_string()))?;
        let seed = hex::decode(&payload.seed)
            .map_err(|_| Error::InvalidSecretBox("Malformed seed encoding".to_string()))?;
        debug!("secret box unsealed");

        Ok(VaultPayload {
            mnemonic: payload.mnemonic,
            seed,
        })
    }
}

fn decode_field(value: &str, name: &str) -> Result<Vec<u8>> {
    BASE64
        .decode(value)
        .map_err(|_| Error::InvalidSecretBox(format!("Bad base64 in {name}")))
}

fn derive_key(password: &str, salt: &[u8], iterations: u32, digest: KdfDigest) -> Zeroizing<[u8; 32]> {
    let mut key = Zeroizing::new([0u8; 32]);
    match digest {
        KdfDigest::Sha256 => {
            pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, iterations, &mut *key)
        }
        KdfDigest::Sha512 => {
            pbkdf2_hmac::<Sha512>(password.as_bytes(), salt, iterations, &mut *key)
        }
    }
    key
}

#[cfg(test)]
mod tests {
    use super::*;

    const MNEMONIC: &str =
        "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";
    // Low iteration count to keep tests fast; production uses the default.
    const TEST_ITERATIONS: u32 = 100;

    fn test_box(password: &str) -> SecretBox {
        SecretBox::create_with_params(MNEMONIC, &[7u8; 32], password, TEST_ITERATIONS, KdfDigest::Sha256)
            .unwrap()
    }

    #[test]
    fn test_seal_unseal_roundtrip() {
        let sealed = test_box("hunter2hunter2");
        let payload = sealed.unlock("hunter2hunter2").unwrap();
        assert_eq!(payload.mnemonic, MNEMONIC);
        assert_eq!(payload.seed, vec![7u8; 32]);
    }

    #[test]
    fn test_wrong_password_fails_uniformly() {
        let sealed = test_box("correct-password");
        let err = sealed.unlock("wrong-password").unwrap_err();
        assert!(matches!(err, Error::InvalidPassword));
    }

    #[test]
    fn test_tampered_nonce_is_invalid_password() {
        let mut sealed = test_box("correct-password");
        let mut nonce = BASE64.decode(&sealed.nonce).unwrap();
        nonce[0] ^= 0xFF;
        sealed.nonce = BASE64.encode(nonce);
        // Must be indistinguishable from a wrong password
        assert!(matches!(
            sealed.unlock("correct-password").unwrap_err(),
            Error::InvalidPassword
        ));
    }

    #[test]
    fn test_tampered_ciphertext_is_invalid_password() {
        let mut sealed = test_box("correct-password");
        let mut ct = BASE64.decode(&sealed.encrypted_box).unwrap();
        let last = ct.len() - 1;
        ct[last] ^= 0x01;
        sealed.encrypted_box = BASE64.encode(ct);
        assert!(matches!(
            sealed.unlock("correct-password").unwrap_err(),
            Error::InvalidPassword
        ));
    }

    #[test]
    fn test_recorded_iterations_drive_unlock() {
        let mut sealed = test_box("correct-password");
        // Changing the recorded count changes the derived key
        sealed.iterations += 1;
        assert!(matches!(
            sealed.unlock("correct-password").unwrap_err(),
            Error::InvalidPassword
        ));
    }

    #[test]
    fn test_sha512_digest_roundtrip() {
        let sealed = SecretBox::create_with_params(
            MNEMONIC,
            &[9u8; 64],
            "pw",
            TEST_ITERATIONS,
            KdfDigest::Sha512,
        )
        .unwrap();
        assert_eq!(sealed.digest, "sha512");
        let payload = sealed.unlock("pw").unwrap();
        assert_eq!(payload.seed.len(), 64);
    }

    #[test]
    fn test_invalid_mnemonic_rejected() {
        let err = SecretBox::create("not a real phrase", &[7u8; 32], "pw").unwrap_err();
        assert!(matches!(err, Error::InvalidMnemonic(_)));
    }

    #[test]
    fn test_seed_length_bounds() {
        assert!(SecretBox::create(MNEMONIC, &[1u8; 8], "pw").is_err());
        assert!(SecretBox::create(MNEMONIC, &[1u8; 65], "pw").is_err());
    }

    #[test]
    fn test_fresh_salt_and_nonce_per_box() {
        let a = test_box("pw");
        let b = test_box("pw");
        assert_ne!(a.salt, b.salt);
        assert_ne!(a.nonce, b.nonce);
        assert_ne!(a.encrypted_box, b.encrypted_box);
    }

    #[test]
    fn test_serde_shape_matches_persisted_layout() {
        let sealed = test_box("pw");
        let json = serde_json::to_value(&sealed).unwrap();
        assert!(json.get("encryptedBox").is_some());
        assert_eq!(json.get("kdf").unwrap(), "pbkdf2");
        let back: SecretBox = serde_json::from_value(json).unwrap();
        assert_eq!(back, sealed);
    }
}
