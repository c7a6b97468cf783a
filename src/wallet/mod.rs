//! Wallet Facade
//!
//! Composes key generation, script building, and input signing behind an
//! immutable [`WalletState`] value. The state is produced once by a pure
//! initialization function and never mutated afterwards; the redeem
//! script and addresses are computed at creation and cached for the
//! wallet's lifetime.

pub mod derivation_path;
pub mod keygen;

use bitcoin::secp256k1::PublicKey;
use bitcoin::{Amount, Network, ScriptBuf, Transaction};

use crate::error::{WalletError, WalletResult};
use crate::script::{build_multisig, MultisigScript};
use crate::tx::signer;
use crate::types::{AddressSet, KeyPairRecord, MultisigPolicy, SpendEnvelope};

/// An initialized m-of-n multisig wallet.
///
/// Key-pair records keep their generation slot order (that order carries
/// the mnemonic/path bookkeeping); the embedded script key order is the
/// sorted order and lives in [`MultisigScript`].
#[derive(Debug, Clone)]
pub struct WalletState {
    policy: MultisigPolicy,
    network: Network,
    key_pairs: Vec<KeyPairRecord>,
    script: MultisigScript,
}

impl WalletState {
    /// Create a wallet: generate one key pair per signer slot, then build
    /// and cache the multisig script and its envelope addresses.
    pub fn create(policy: MultisigPolicy, network: Network) -> WalletResult<Self> {
        let key_pairs: Vec<KeyPairRecord> = (0..policy.total() as u32)
            .map(|slot| keygen::generate_key_pair(network, slot))
            .collect::<WalletResult<_>>()?;

        Self::from_key_pairs(policy, network, key_pairs)
    }

    /// Rebuild a wallet from the cosigners' backed-up mnemonics, one per
    /// signer slot in slot order.
    ///
    /// Derivation is deterministic, so the restored wallet has the same
    /// redeem script and addresses as the original.
    pub fn restore(
        policy: MultisigPolicy,
        network: Network,
        mnemonics: &[String],
    ) -> WalletResult<Self> {
        if mnemonics.len() != policy.total() as usize {
            return Err(
                WalletError::invalid_policy("mnemonic count does not match policy").with_details(
                    format!(
                        "policy total: {}, mnemonics provided: {}",
                        policy.total(),
                        mnemonics.len()
                    ),
                ),
            );
        }

        let key_pairs: Vec<KeyPairRecord> = mnemonics
            .iter()
            .enumerate()
            .map(|(slot, mnemonic)| keygen::restore_key_pair(network, slot as u32, mnemonic))
            .collect::<WalletResult<_>>()?;

        Self::from_key_pairs(policy, network, key_pairs)
    }

    fn from_key_pairs(
        policy: MultisigPolicy,
        network: Network,
        key_pairs: Vec<KeyPairRecord>,
    ) -> WalletResult<Self> {
        let public_keys: Vec<PublicKey> = key_pairs.iter().map(|r| r.public_key).collect();
        let script = build_multisig(policy, &public_keys, network)?;

        Ok(Self {
            policy,
            network,
            key_pairs,
            script,
        })
    }

    pub fn policy(&self) -> MultisigPolicy {
        self.policy
    }

    pub fn network(&self) -> Network {
        self.network
    }

    /// All signer records in slot order.
    pub fn key_pairs(&self) -> &[KeyPairRecord] {
        &self.key_pairs
    }

    /// One signer record by slot number.
    pub fn key_pair(&self, slot: usize) -> Option<&KeyPairRecord> {
        self.key_pairs.get(slot)
    }

    /// The cached canonical redeem script.
    pub fn redeem_script(&self) -> &ScriptBuf {
        &self.script.redeem_script
    }

    /// Embedded public keys in sorted (script) order.
    pub fn sorted_public_keys(&self) -> &[PublicKey] {
        &self.script.sorted_public_keys
    }

    /// The cached P2SH/P2WSH address pair.
    pub fn addresses(&self) -> &AddressSet {
        &self.script.addresses
    }

    /// Sign one input of a spend with the given slot's key, folding the
    /// signature into the input's unlocking data.
    pub fn sign_input(
        &self,
        tx: &mut Transaction,
        input_index: usize,
        signer_slot: usize,
        input_value: Amount,
        envelope: SpendEnvelope,
    ) -> WalletResult<()> {
        let record = self.key_pair(signer_slot).ok_or_else(|| {
            WalletError::signing_failed(format!("no signer slot {}", signer_slot)).with_details(
                format!("wallet has {} slot(s)", self.key_pairs.len()),
            )
        })?;

        signer::sign_input(
            tx,
            input_index,
            &self.script.redeem_script,
            record,
            input_value,
            envelope,
        )
    }

    /// Whether an input of a spend has reached the signature threshold.
    ///
    /// Collected signatures are verified against the input digest, so
    /// `input_value` must match the value passed when signing P2WSH
    /// inputs.
    pub fn is_input_complete(
        &self,
        tx: &Transaction,
        input_index: usize,
        input_value: Amount,
        envelope: SpendEnvelope,
    ) -> WalletResult<bool> {
        signer::is_input_complete(
            self.policy,
            tx,
            input_index,
            &self.script.redeem_script,
            input_value,
            envelope,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::wallet::derivation_path::is_multisig_path;

    #[test]
    fn test_create_generates_one_record_per_slot() {
        let policy = MultisigPolicy::new(2, 3).unwrap();
        let wallet = WalletState::create(policy, Network::Testnet).unwrap();

        assert_eq!(wallet.key_pairs().len(), 3);
        for (slot, record) in wallet.key_pairs().iter().enumerate() {
            assert!(is_multisig_path(&record.derivation_path, slot as u32));
            assert_eq!(record.mnemonic.split_whitespace().count(), 24);
            assert!(record.has_private_key());
        }
    }

    #[test]
    fn test_sorted_public_keys_are_sorted() {
        let policy = MultisigPolicy::new(2, 3).unwrap();
        let wallet = WalletState::create(policy, Network::Testnet).unwrap();

        let keys = wallet.sorted_public_keys();
        for pair in keys.windows(2) {
            assert!(pair[0].serialize() < pair[1].serialize());
        }
    }

    #[test]
    fn test_restore_reproduces_addresses() {
        let policy = MultisigPolicy::new(2, 3).unwrap();
        let wallet = WalletState::create(policy, Network::Testnet).unwrap();

        let mnemonics: Vec<String> = wallet
            .key_pairs()
            .iter()
            .map(|r| r.mnemonic.clone())
            .collect();
        let restored = WalletState::restore(policy, Network::Testnet, &mnemonics).unwrap();

        assert_eq!(restored.redeem_script(), wallet.redeem_script());
        assert_eq!(restored.addresses(), wallet.addresses());
    }

    #[test]
    fn test_restore_rejects_wrong_mnemonic_count() {
        let policy = MultisigPolicy::new(2, 3).unwrap();
        let err = WalletState::restore(policy, Network::Testnet, &[]).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidPolicy);
    }
}
