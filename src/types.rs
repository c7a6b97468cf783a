//! Shared types for the multisig wallet core
//!
//! All data structures that cross module boundaries are defined here.

use bitcoin::secp256k1::{PublicKey, SecretKey};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{WalletError, WalletResult};

/// Upper bound on cosigners. CHECKMULTISIG key counts above 16 cannot be
/// encoded with a single push-number opcode, and consensus policy caps
/// bare multisig at 15 keys.
pub const MAX_SIGNERS: u8 = 15;

// =============================================================================
// Policy
// =============================================================================

/// An m-of-n spending policy: `required` of `total` cosigners must sign.
///
/// Validated once at construction and immutable afterwards.
/// Deserialization goes through the same validation, so a decoded policy
/// upholds the bounds too.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "UncheckedPolicy")]
pub struct MultisigPolicy {
    required: u8,
    total: u8,
}

/// Wire form of [`MultisigPolicy`] before bounds validation.
#[derive(Deserialize)]
struct UncheckedPolicy {
    required: u8,
    total: u8,
}

impl TryFrom<UncheckedPolicy> for MultisigPolicy {
    type Error = WalletError;

    fn try_from(raw: UncheckedPolicy) -> Result<Self, Self::Error> {
        MultisigPolicy::new(raw.required, raw.total)
    }
}

impl MultisigPolicy {
    /// Validates `1 <= required <= total <= 15`.
    ///
    /// A 0-of-n policy is rejected here rather than at scripting time; it
    /// would make the wallet spendable with no signatures at all.
    pub fn new(required: u8, total: u8) -> WalletResult<Self> {
        if required < 1 {
            return Err(WalletError::invalid_policy(
                "at least one signature must be required",
            )
            .with_details(format!("required: {}", required)));
        }
        if total < required {
            return Err(
                WalletError::invalid_policy("required signatures exceed total signers")
                    .with_details(format!("required: {}, total: {}", required, total)),
            );
        }
        if total > MAX_SIGNERS {
            return Err(WalletError::invalid_policy(format!(
                "at most {} signers supported",
                MAX_SIGNERS
            ))
            .with_details(format!("total: {}", total)));
        }
        Ok(Self { required, total })
    }

    pub fn required(&self) -> u8 {
        self.required
    }

    pub fn total(&self) -> u8 {
        self.total
    }
}

impl fmt::Display for MultisigPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-of-{}", self.required, self.total)
    }
}

// =============================================================================
// Key Material
// =============================================================================

/// One signer slot's key material.
///
/// The mnemonic is the sole durable backup of the private material and is
/// always surfaced to the caller. `private_key` is `None` when the record
/// represents another party's public share.
#[derive(Clone)]
pub struct KeyPairRecord {
    pub mnemonic: String,
    pub derivation_path: String,
    pub public_key: PublicKey,
    pub private_key: Option<SecretKey>,
}

impl KeyPairRecord {
    /// Record for a cosigner whose private material we do not hold.
    pub fn public_only(public_key: PublicKey, derivation_path: impl Into<String>) -> Self {
        Self {
            mnemonic: String::new(),
            derivation_path: derivation_path.into(),
            public_key,
            private_key: None,
        }
    }

    pub fn has_private_key(&self) -> bool {
        self.private_key.is_some()
    }

    /// Compressed 33-byte encoding of the public key.
    pub fn public_key_bytes(&self) -> [u8; 33] {
        self.public_key.serialize()
    }
}

// Never expose the mnemonic or private scalar through Debug output.
impl fmt::Debug for KeyPairRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPairRecord")
            .field("mnemonic", &"<redacted>")
            .field("derivation_path", &self.derivation_path)
            .field("public_key", &hex::encode(self.public_key.serialize()))
            .field(
                "private_key",
                &self.private_key.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

// =============================================================================
// Addresses
// =============================================================================

/// The two standard envelope addresses for one multisig script.
///
/// Identical policy + sorted public keys + network always produce an
/// identical `AddressSet`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressSet {
    /// Legacy script-hash address (Base58Check).
    pub p2sh: String,
    /// Native segwit v0 script-hash address (bech32).
    pub p2wsh: String,
}

/// Which envelope an input being signed was funded through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpendEnvelope {
    /// Legacy P2SH: unlocking data goes in the scriptSig.
    P2sh,
    /// Native P2WSH: unlocking data goes in the witness stack, scriptSig
    /// stays empty.
    P2wsh,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use bitcoin::secp256k1::{Secp256k1, SecretKey};

    #[test]
    fn test_policy_accepts_valid_range() {
        for total in 1..=MAX_SIGNERS {
            for required in 1..=total {
                let policy = MultisigPolicy::new(required, total).unwrap();
                assert_eq!(policy.required(), required);
                assert_eq!(policy.total(), total);
            }
        }
    }

    #[test]
    fn test_policy_rejects_zero_required() {
        let err = MultisigPolicy::new(0, 3).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidPolicy);
    }

    #[test]
    fn test_policy_rejects_required_over_total() {
        let err = MultisigPolicy::new(3, 2).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidPolicy);
    }

    #[test]
    fn test_policy_rejects_oversized_total() {
        let err = MultisigPolicy::new(2, 16).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidPolicy);
    }

    #[test]
    fn test_policy_deserialization_runs_validation() {
        // The bounds hold for decoded policies too; a 0-of-n policy on
        // the wire must not become an anyone-can-spend script.
        let err = serde_json::from_str::<MultisigPolicy>(r#"{"required":0,"total":3}"#)
            .unwrap_err();
        assert!(err.to_string().contains("at least one signature"));

        let err = serde_json::from_str::<MultisigPolicy>(r#"{"required":3,"total":2}"#)
            .unwrap_err();
        assert!(err.to_string().contains("exceed"));
    }

    #[test]
    fn test_policy_serde_round_trip() {
        let policy = MultisigPolicy::new(2, 3).unwrap();
        let json = serde_json::to_string(&policy).unwrap();
        let decoded: MultisigPolicy = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, policy);
    }

    #[test]
    fn test_record_debug_redacts_secrets() {
        let secp = Secp256k1::new();
        let secret = SecretKey::from_slice(&[0x42u8; 32]).unwrap();
        let record = KeyPairRecord {
            mnemonic: "abandon ability able".to_string(),
            derivation_path: "m/48'/0'/0'/2'/0".to_string(),
            public_key: secret.public_key(&secp),
            private_key: Some(secret),
        };

        let rendered = format!("{:?}", record);
        assert!(!rendered.contains("abandon"));
        assert!(!rendered.contains(&hex::encode([0x42u8; 32])));
        assert!(rendered.contains("m/48'/0'/0'/2'/0"));
    }
}
