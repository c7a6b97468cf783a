//! Multisig Input Signing
//!
//! Produces SIGHASH_ALL signatures over a transaction input using the
//! redeem script as the signed scriptCode, and assembles the unlocking
//! data for legacy P2SH (scriptSig) or native P2WSH (witness stack)
//! envelopes.
//!
//! Unlocking data layout is the canonical CHECKMULTISIG redemption form:
//! a leading empty element (the interpreter's off-by-one dummy), the
//! collected signatures ordered by their key's position in the redeem
//! script, then the redeem script itself as the final element.

use bitcoin::hashes::Hash;
use bitcoin::script::{Instruction, PushBytesBuf};
use bitcoin::secp256k1::{ecdsa, Message, Secp256k1};
use bitcoin::sighash::{EcdsaSighashType, SighashCache};
use bitcoin::{Amount, ScriptBuf, Transaction, Witness};

use crate::error::{WalletError, WalletResult};
use crate::script::embedded_public_keys;
use crate::types::{KeyPairRecord, MultisigPolicy, SpendEnvelope};

/// Debug logging macro that only prints in debug builds
#[cfg(debug_assertions)]
macro_rules! debug_log {
    ($($arg:tt)*) => { eprintln!($($arg)*) }
}
#[cfg(not(debug_assertions))]
macro_rules! debug_log {
    ($($arg:tt)*) => {};
}

/// Shortest possible DER signature plus the trailing sighash byte.
const MIN_SIGNATURE_LEN: usize = 9;

/// Sign one input and fold the signature into its unlocking data.
///
/// Signatures already present in the input are preserved; each is matched
/// to its redeem-script key slot by verifying it against the input digest,
/// and the combined set is re-emitted in slot order. Signing the same
/// input twice with the same record replaces that slot's signature, so
/// the call is idempotent.
///
/// `input_value` is the amount of the output being spent; BIP-143 commits
/// to it for P2WSH inputs (it is unused for legacy P2SH).
pub fn sign_input(
    tx: &mut Transaction,
    input_index: usize,
    redeem_script: &ScriptBuf,
    record: &KeyPairRecord,
    input_value: Amount,
    envelope: SpendEnvelope,
) -> WalletResult<()> {
    // Both checks happen before any hashing.
    let private_key = record.private_key.as_ref().ok_or_else(|| {
        WalletError::missing_private_key("key pair record carries no private key")
    })?;
    check_input_index(tx, input_index)?;

    let script_keys = embedded_public_keys(redeem_script)?;
    let slot = script_keys
        .iter()
        .position(|pk| *pk == record.public_key)
        .ok_or_else(|| {
            WalletError::signing_failed("signer's public key is not part of the redeem script")
        })?;

    let digest = input_digest(tx, input_index, redeem_script, input_value, envelope)?;
    let msg = Message::from_digest_slice(&digest)?;

    let secp = Secp256k1::new();
    let signature = secp.sign_ecdsa(&msg, private_key);

    // DER encoding plus the trailing sighash-type byte; the byte is part
    // of the signature's on-chain encoding.
    let mut sig_bytes = signature.serialize_der().to_vec();
    sig_bytes.push(EcdsaSighashType::All as u8);

    // Re-slot every signature already collected for this input, then
    // insert ours.
    let existing = extract_signatures(&tx.input[input_index], redeem_script, envelope);
    let mut slots: Vec<Option<Vec<u8>>> = vec![None; script_keys.len()];
    for sig in existing {
        if let Some(existing_slot) = match_signature_slot(&secp, &msg, &sig, &script_keys) {
            slots[existing_slot] = Some(sig);
        }
    }
    slots[slot] = Some(sig_bytes);

    let ordered: Vec<Vec<u8>> = slots.into_iter().flatten().collect();
    debug_log!(
        "Input {}: {} signature(s) collected",
        input_index,
        ordered.len()
    );

    apply_unlocking_data(tx, input_index, redeem_script, &ordered, envelope)
}

/// Count the signature-shaped elements currently in an input's unlocking
/// data.
///
/// This is a syntactic count; use [`is_input_complete`] for the
/// threshold check, which verifies every element.
pub fn input_signature_count(
    tx: &Transaction,
    input_index: usize,
    redeem_script: &ScriptBuf,
    envelope: SpendEnvelope,
) -> WalletResult<usize> {
    check_input_index(tx, input_index)?;
    Ok(extract_signatures(&tx.input[input_index], redeem_script, envelope).len())
}

/// Whether an input has reached the policy's signature threshold.
///
/// Each collected element is verified against the embedded keys over the
/// input digest, so duplicated or forged elements in an externally
/// supplied transaction do not count; the threshold is over distinct
/// keys. Below it the input is syntactically well-formed but not yet
/// spendable.
pub fn is_input_complete(
    policy: MultisigPolicy,
    tx: &Transaction,
    input_index: usize,
    redeem_script: &ScriptBuf,
    input_value: Amount,
    envelope: SpendEnvelope,
) -> WalletResult<bool> {
    check_input_index(tx, input_index)?;

    let script_keys = embedded_public_keys(redeem_script)?;
    let digest = input_digest(tx, input_index, redeem_script, input_value, envelope)?;
    let msg = Message::from_digest_slice(&digest)?;
    let secp = Secp256k1::new();

    let mut signed_slots = vec![false; script_keys.len()];
    for sig in extract_signatures(&tx.input[input_index], redeem_script, envelope) {
        if let Some(slot) = match_signature_slot(&secp, &msg, &sig, &script_keys) {
            signed_slots[slot] = true;
        }
    }

    let verified = signed_slots.iter().filter(|signed| **signed).count();
    Ok(verified >= policy.required() as usize)
}

fn check_input_index(tx: &Transaction, input_index: usize) -> WalletResult<()> {
    if input_index >= tx.input.len() {
        return Err(WalletError::invalid_input_index(format!(
            "input index {} out of range",
            input_index
        ))
        .with_details(format!("transaction has {} input(s)", tx.input.len())));
    }
    Ok(())
}

/// Signature digest for one input, with the redeem script as scriptCode.
///
/// Always SIGHASH_ALL: every outpoint and every output is committed, so
/// no party can rewrite the transaction after signatures are collected.
fn input_digest(
    tx: &Transaction,
    input_index: usize,
    redeem_script: &ScriptBuf,
    input_value: Amount,
    envelope: SpendEnvelope,
) -> WalletResult<[u8; 32]> {
    let mut cache = SighashCache::new(tx);
    match envelope {
        SpendEnvelope::P2sh => {
            let sighash = cache
                .legacy_signature_hash(input_index, redeem_script, EcdsaSighashType::All as u32)
                .map_err(|e| {
                    WalletError::signing_failed(format!("legacy sighash computation failed: {}", e))
                })?;
            Ok(sighash.to_byte_array())
        }
        SpendEnvelope::P2wsh => {
            let sighash = cache
                .p2wsh_signature_hash(
                    input_index,
                    redeem_script,
                    input_value,
                    EcdsaSighashType::All,
                )
                .map_err(|e| {
                    WalletError::signing_failed(format!(
                        "BIP-143 sighash computation failed: {}",
                        e
                    ))
                })?;
            Ok(sighash.to_byte_array())
        }
    }
}

/// Pull the already-collected signatures out of an input's unlocking data.
///
/// The leading dummy element and the trailing redeem script are skipped;
/// anything that does not look like a DER signature is dropped.
fn extract_signatures(
    input: &bitcoin::TxIn,
    redeem_script: &ScriptBuf,
    envelope: SpendEnvelope,
) -> Vec<Vec<u8>> {
    let elements: Vec<Vec<u8>> = match envelope {
        SpendEnvelope::P2sh => input
            .script_sig
            .instructions()
            .filter_map(|instruction| match instruction {
                Ok(Instruction::PushBytes(push)) => Some(push.as_bytes().to_vec()),
                _ => None,
            })
            .collect(),
        SpendEnvelope::P2wsh => input.witness.iter().map(|e| e.to_vec()).collect(),
    };

    elements
        .into_iter()
        .filter(|e| {
            e.len() >= MIN_SIGNATURE_LEN && e[0] == 0x30 && e.as_slice() != redeem_script.as_bytes()
        })
        .collect()
}

/// Match a collected signature to its key slot by verification.
///
/// Returns `None` for signatures that verify against none of the embedded
/// keys (stale or foreign material, which is discarded).
fn match_signature_slot(
    secp: &Secp256k1<bitcoin::secp256k1::All>,
    msg: &Message,
    sig_bytes: &[u8],
    script_keys: &[bitcoin::secp256k1::PublicKey],
) -> Option<usize> {
    let (der, _sighash_byte) = sig_bytes.split_at(sig_bytes.len() - 1);
    let signature = ecdsa::Signature::from_der(der).ok()?;
    script_keys
        .iter()
        .position(|pk| secp.verify_ecdsa(msg, &signature, pk).is_ok())
}

/// Write the canonical unlocking sequence into the input: dummy element,
/// slot-ordered signatures, redeem script.
fn apply_unlocking_data(
    tx: &mut Transaction,
    input_index: usize,
    redeem_script: &ScriptBuf,
    ordered_sigs: &[Vec<u8>],
    envelope: SpendEnvelope,
) -> WalletResult<()> {
    let input = &mut tx.input[input_index];
    match envelope {
        SpendEnvelope::P2sh => {
            let mut builder =
                bitcoin::script::Builder::new().push_opcode(bitcoin::opcodes::OP_0);
            for sig in ordered_sigs {
                builder = builder.push_slice(push_bytes(sig)?);
            }
            builder = builder.push_slice(push_bytes(redeem_script.as_bytes())?);
            input.script_sig = builder.into_script();
            input.witness = Witness::new();
        }
        SpendEnvelope::P2wsh => {
            let mut witness = Witness::new();
            witness.push(Vec::new()); // CHECKMULTISIG dummy element
            for sig in ordered_sigs {
                witness.push(sig);
            }
            witness.push(redeem_script.as_bytes());
            input.script_sig = ScriptBuf::new();
            input.witness = witness;
        }
    }
    Ok(())
}

fn push_bytes(data: &[u8]) -> WalletResult<PushBytesBuf> {
    PushBytesBuf::try_from(data.to_vec()).map_err(|e| {
        WalletError::script_construction_failed(format!("unlocking element too large: {}", e))
    })
}
