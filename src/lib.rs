//! Quorum Wallet Core
//!
//! Rust core for an m-of-n multisig Bitcoin wallet.
//!
//! # Architecture
//!
//! This crate provides:
//! - **wallet**: Cosigner key generation, BIP-48 derivation, and the
//!   immutable `WalletState` facade
//! - **script**: Canonical multisig redeem script construction and its
//!   P2SH/P2WSH envelope addresses
//! - **tx**: SIGHASH_ALL input signing and multi-party signature
//!   combination
//!
//! Elliptic-curve arithmetic, mnemonic encoding, and address checksum
//! encoding come from the `bitcoin` and `bip39` crates; this crate
//! supplies the multisig semantics on top.
//!
//! # Security
//!
//! This crate uses `zeroize` to securely clear entropy and seeds from
//! memory. Mnemonics and private keys are never logged and are redacted
//! from `Debug` output.
//!
//! # Example
//!
//! ```rust,ignore
//! use quorum_wallet::{MultisigPolicy, WalletState};
//!
//! let policy = MultisigPolicy::new(2, 3)?;
//! let wallet = WalletState::create(policy, bitcoin::Network::Testnet)?;
//! println!("P2WSH address: {}", wallet.addresses().p2wsh);
//! ```

pub mod error;
pub mod script;
pub mod tx;
pub mod types;
pub mod wallet;

// Re-export key types for convenience
pub use error::{ErrorCode, WalletError, WalletResult};
pub use script::{build_multisig, MultisigScript};
pub use types::{AddressSet, KeyPairRecord, MultisigPolicy, SpendEnvelope, MAX_SIGNERS};
pub use wallet::keygen::{generate_key_pair, restore_key_pair};
pub use wallet::WalletState;

// Re-export signing functions
pub use tx::{input_signature_count, is_input_complete, sign_input};
