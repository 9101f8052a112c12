//! Property-based tests for skiff-core
//!
//! Uses proptest to verify vault and keyring invariants across randomized
//! inputs.

use proptest::prelude::*;
use skiff_core::{KdfDigest, Keyring, SecretBox, SIGNATURE_LENGTH};

const MNEMONIC: &str =
    "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

// Low iteration count so randomized cases stay fast.
const TEST_ITERATIONS: u32 = 10;

/// Generate seed bytes in the accepted 16-64 range
fn seed_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 16..=64)
}

/// Generate passwords including empty and unicode-free edge cases
fn password_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-zA-Z0-9 !@#]{1,40}").unwrap()
}

proptest! {
    /// Property: unlock with the sealing password recovers the exact payload
    #[test]
    fn prop_vault_roundtrip(seed in seed_strategy(), password in password_strategy()) {
        let sealed = SecretBox::create_with_params(
            MNEMONIC, &seed, &password, TEST_ITERATIONS, KdfDigest::Sha256,
        ).expect("valid inputs");

        let payload = sealed.unlock(&password).expect("correct password");
        prop_assert_eq!(payload.seed.as_slice(), seed.as_slice());
        prop_assert_eq!(payload.mnemonic.as_str(), MNEMONIC);
    }

    /// Property: any different password fails with no plaintext leaked
    #[test]
    fn prop_vault_rejects_other_passwords(
        seed in seed_strategy(),
        password in password_strategy(),
        other in password_strategy(),
    ) {
        prop_assume!(password != other);
        let sealed = SecretBox::create_with_params(
            MNEMONIC, &seed, &password, TEST_ITERATIONS, KdfDigest::Sha256,
        ).expect("valid inputs");

        prop_assert!(sealed.unlock(&other).is_err());
    }

    /// Property: account N is a pure function of (seed, N)
    #[test]
    fn prop_keyring_determinism(seed in seed_strategy(), extra in 0u32..5) {
        let count = 1 + extra;
        let mut grown = Keyring::unlock_with(&seed).expect("valid seed");
        for _ in 0..extra {
            grown.add_account().expect("derivation");
        }
        let restored = Keyring::restore(&seed, count).expect("valid seed");
        prop_assert_eq!(grown.public_keys(), restored.public_keys());
    }

    /// Property: signatures are always 64 bytes and bound to the account
    #[test]
    fn prop_signature_shape(seed in seed_strategy(), message in prop::collection::vec(any::<u8>(), 0..256)) {
        let keyring = Keyring::unlock_with(&seed).expect("valid seed");
        let keys = keyring.public_keys();
        let account = keyring.find_account(&keys[0]).expect("account 0");
        let signature = account.sign(&message);
        prop_assert_eq!(signature.len(), SIGNATURE_LENGTH);
    }
}
