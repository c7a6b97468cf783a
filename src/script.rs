//! Multisig Script Builder
//!
//! Turns an (m, n) policy and a set of cosigner public keys into the
//! canonical `OP_m <pk_0> .. <pk_{n-1}> OP_n OP_CHECKMULTISIG` redeem
//! script and its two envelope addresses (legacy P2SH and native P2WSH).
//!
//! Public keys are sorted by the byte order of their compressed encoding
//! before embedding (BIP-67), so cosigners who exchange keys in any order
//! converge on identical script bytes and addresses.

use bitcoin::opcodes::all::OP_CHECKMULTISIG;
use bitcoin::script::Builder;
use bitcoin::secp256k1::PublicKey;
use bitcoin::{Address, Network, ScriptBuf};

use crate::error::{WalletError, WalletResult};
use crate::types::{AddressSet, MultisigPolicy};

/// Cached output of [`build_multisig`]: identical inputs always produce
/// byte-identical script and addresses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultisigScript {
    /// Canonical multisig locking script.
    pub redeem_script: ScriptBuf,
    /// The embedded keys, in embedding (sorted) order.
    pub sorted_public_keys: Vec<PublicKey>,
    /// P2SH and P2WSH envelope addresses for the script.
    pub addresses: AddressSet,
}

/// Build the redeem script and envelope addresses for a multisig policy.
///
/// The key list length must equal `policy.total()`; the list may arrive
/// in any order and is sorted before embedding.
pub fn build_multisig(
    policy: MultisigPolicy,
    public_keys: &[PublicKey],
    network: Network,
) -> WalletResult<MultisigScript> {
    if public_keys.len() != policy.total() as usize {
        return Err(
            WalletError::invalid_policy("public key count does not match policy").with_details(
                format!(
                    "policy total: {}, keys provided: {}",
                    policy.total(),
                    public_keys.len()
                ),
            ),
        );
    }

    let mut sorted_public_keys = public_keys.to_vec();
    sorted_public_keys.sort_by_key(|pk| pk.serialize());

    let redeem_script = encode_multisig_script(policy, &sorted_public_keys);
    let addresses = envelope_addresses(&redeem_script, network)?;

    Ok(MultisigScript {
        redeem_script,
        sorted_public_keys,
        addresses,
    })
}

/// Encode `OP_m <keys..> OP_n OP_CHECKMULTISIG` with minimal push-number
/// opcodes for m and n.
fn encode_multisig_script(policy: MultisigPolicy, sorted_keys: &[PublicKey]) -> ScriptBuf {
    let mut builder = Builder::new().push_int(policy.required() as i64);
    for key in sorted_keys {
        builder = builder.push_key(&bitcoin::PublicKey::new(*key));
    }
    builder
        .push_int(policy.total() as i64)
        .push_opcode(OP_CHECKMULTISIG)
        .into_script()
}

/// Wrap a redeem script in both standard envelopes.
///
/// P2SH commits to hash160 of the script behind a Base58Check address
/// with the network's script-version byte; P2WSH commits to sha256 of
/// the script behind the network's bech32 v0 witness program.
fn envelope_addresses(redeem_script: &ScriptBuf, network: Network) -> WalletResult<AddressSet> {
    let p2sh = Address::p2sh(redeem_script, network).map_err(|e| {
        WalletError::script_construction_failed(format!("P2SH encoding failed: {}", e))
    })?;

    let witness_program = ScriptBuf::new_p2wsh(&redeem_script.wscript_hash());
    let p2wsh = Address::from_script(&witness_program, network).map_err(|e| {
        WalletError::script_construction_failed(format!("P2WSH encoding failed: {}", e))
    })?;

    Ok(AddressSet {
        p2sh: p2sh.to_string(),
        p2wsh: p2wsh.to_string(),
    })
}

/// Extract the embedded compressed public keys from a multisig redeem
/// script, in script order.
pub fn embedded_public_keys(redeem_script: &ScriptBuf) -> WalletResult<Vec<PublicKey>> {
    use bitcoin::script::Instruction;

    let mut keys = Vec::new();
    for instruction in redeem_script.instructions() {
        let instruction = instruction.map_err(|e| {
            WalletError::script_construction_failed(format!("malformed redeem script: {}", e))
        })?;
        if let Instruction::PushBytes(push) = instruction {
            if push.as_bytes().len() == 33 {
                let key = PublicKey::from_slice(push.as_bytes()).map_err(|e| {
                    WalletError::new(
                        crate::error::ErrorCode::InvalidPublicKey,
                        format!("redeem script embeds invalid key: {}", e),
                    )
                })?;
                keys.push(key);
            }
        }
    }

    if keys.is_empty() {
        return Err(WalletError::script_construction_failed(
            "redeem script embeds no public keys",
        ));
    }
    Ok(keys)
}
