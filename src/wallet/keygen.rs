//! Cosigner Key Generation
//!
//! Creates one deterministic key-pair record per signer slot from fresh
//! entropy, or restores one from a backed-up mnemonic.
//!
//! SECURITY: All sensitive data (entropy, seeds) is zeroized on drop.
//! Nothing in this module logs mnemonics, seeds, or private keys.

use bip39::Mnemonic;
use bitcoin::bip32::{DerivationPath, Xpriv};
use bitcoin::secp256k1::Secp256k1;
use bitcoin::Network;
use rand::rngs::OsRng;
use rand::RngCore;
use std::str::FromStr;
use zeroize::Zeroizing;

use crate::error::{WalletError, WalletResult};
use crate::types::KeyPairRecord;

use super::derivation_path::multisig_path;

/// Debug logging macro that only prints in debug builds
#[cfg(debug_assertions)]
macro_rules! debug_log {
    ($($arg:tt)*) => { eprintln!($($arg)*) }
}
#[cfg(not(debug_assertions))]
macro_rules! debug_log {
    ($($arg:tt)*) => {};
}

/// Entropy per cosigner mnemonic: 256 bits, giving 24 words.
///
/// 128-bit/12-word mnemonics are deliberately not supported for multisig
/// backups.
const ENTROPY_BYTES: usize = 32;

/// Generate the key pair for one signer slot.
///
/// Draws fresh entropy, encodes it as a 24-word BIP-39 mnemonic, and
/// derives the signer key at `m/48'/0'/0'/2'/{index}`. The mnemonic uses
/// an empty BIP-39 passphrase; the words alone recover the key.
pub fn generate_key_pair(network: Network, signer_index: u32) -> WalletResult<KeyPairRecord> {
    // Use Zeroizing wrapper to ensure entropy is cleared on drop
    let mut entropy = Zeroizing::new([0u8; ENTROPY_BYTES]);
    OsRng.fill_bytes(entropy.as_mut());

    let mnemonic = Mnemonic::from_entropy(entropy.as_ref()).map_err(|e| {
        WalletError::key_generation_failed(format!("failed to create mnemonic: {}", e))
    })?;

    derive_record(network, signer_index, &mnemonic)
}

/// Restore a signer slot's key pair from its backed-up mnemonic.
///
/// Derivation is deterministic, so the restored record carries the same
/// keys the slot was generated with.
pub fn restore_key_pair(
    network: Network,
    signer_index: u32,
    mnemonic_phrase: &str,
) -> WalletResult<KeyPairRecord> {
    let mnemonic = Mnemonic::parse(mnemonic_phrase)
        .map_err(|e| WalletError::invalid_mnemonic(format!("invalid mnemonic: {}", e)))?;

    derive_record(network, signer_index, &mnemonic)
}

fn derive_record(
    network: Network,
    signer_index: u32,
    mnemonic: &Mnemonic,
) -> WalletResult<KeyPairRecord> {
    let secp = Secp256k1::new();

    // Seed is 64 bytes - wrap in Zeroizing for automatic cleanup
    let seed = Zeroizing::new(mnemonic.to_seed(""));

    let path_string = multisig_path(signer_index);
    let path = DerivationPath::from_str(&path_string)
        .map_err(|e| WalletError::key_generation_failed(format!("invalid path: {}", e)))?;

    let master = Xpriv::new_master(network, seed.as_ref())
        .map_err(|e| WalletError::key_generation_failed(format!("master key: {}", e)))?;
    let child = master.derive_priv(&secp, &path).map_err(|e| {
        WalletError::key_generation_failed(format!("derivation at {} failed: {}", path_string, e))
    })?;

    let secret_key = child.private_key;
    let public_key = secret_key.public_key(&secp);

    debug_log!("Derived cosigner key for slot {} at {}", signer_index, path_string);

    Ok(KeyPairRecord {
        mnemonic: mnemonic.to_string(),
        derivation_path: path_string,
        public_key,
        private_key: Some(secret_key),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::wallet::derivation_path::is_multisig_path;

    #[test]
    fn test_generate_key_pair() {
        let record = generate_key_pair(Network::Testnet, 0).unwrap();

        assert_eq!(record.mnemonic.split_whitespace().count(), 24);
        assert_eq!(record.derivation_path, "m/48'/0'/0'/2'/0");
        assert!(record.has_private_key());
    }

    #[test]
    fn test_generated_paths_track_slot() {
        for slot in 0..3 {
            let record = generate_key_pair(Network::Bitcoin, slot).unwrap();
            assert!(is_multisig_path(&record.derivation_path, slot));
        }
    }

    #[test]
    fn test_mnemonic_round_trips_through_bip39() {
        let record = generate_key_pair(Network::Testnet, 1).unwrap();
        // Checksum validation happens inside parse
        assert!(Mnemonic::parse(&record.mnemonic).is_ok());
    }

    #[test]
    fn test_restore_reproduces_keys() {
        let generated = generate_key_pair(Network::Testnet, 2).unwrap();
        let restored = restore_key_pair(Network::Testnet, 2, &generated.mnemonic).unwrap();

        assert_eq!(restored.public_key, generated.public_key);
        assert_eq!(restored.private_key, generated.private_key);
        assert_eq!(restored.derivation_path, generated.derivation_path);
    }

    #[test]
    fn test_restore_rejects_bad_mnemonic() {
        let err = restore_key_pair(Network::Testnet, 0, "not a mnemonic at all").unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidMnemonic);
    }

    #[test]
    fn test_distinct_slots_use_independent_entropy() {
        let a = generate_key_pair(Network::Testnet, 0).unwrap();
        let b = generate_key_pair(Network::Testnet, 0).unwrap();
        assert_ne!(a.mnemonic, b.mnemonic);
        assert_ne!(a.public_key, b.public_key);
    }
}
