//! Multisig Derivation Paths
//!
//! Builds and validates BIP-48 derivation paths for cosigner keys.
//! Every signer slot derives at `m/48'/0'/0'/2'/{index}`: hardened
//! purpose, coin type, account, and script-type discriminator, with a
//! non-hardened per-signer index so public shares could in principle be
//! derived without private-key exposure.

use crate::error::{WalletError, WalletResult};

/// BIP-48 multisig purpose
pub const PURPOSE_MULTISIG: u32 = 48;

/// Coin type (Bitcoin)
pub const COIN_TYPE: u32 = 0;

/// Account index
pub const ACCOUNT: u32 = 0;

/// BIP-48 script-type discriminator for P2WSH-style multisig
pub const SCRIPT_TYPE_P2WSH: u32 = 2;

/// Hardened offset for BIP-32 derivation
pub const HARDENED: u32 = 0x80000000;

/// Single component of a derivation path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DerivationComponent {
    pub index: u32,
    pub hardened: bool,
}

impl DerivationComponent {
    pub fn new(index: u32, hardened: bool) -> Self {
        Self { index, hardened }
    }

    /// Get the full index including the hardened bit
    pub fn full_index(&self) -> u32 {
        if self.hardened {
            self.index | HARDENED
        } else {
            self.index
        }
    }
}

impl std::fmt::Display for DerivationComponent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.hardened {
            write!(f, "{}'", self.index)
        } else {
            write!(f, "{}", self.index)
        }
    }
}

/// Build the multisig path for one signer slot: `m/48'/0'/0'/2'/{index}`
pub fn multisig_path(signer_index: u32) -> String {
    format!(
        "m/{}'/{}'/{}'/{}'/{}",
        PURPOSE_MULTISIG, COIN_TYPE, ACCOUNT, SCRIPT_TYPE_P2WSH, signer_index
    )
}

/// Parse a derivation path string into components
pub fn parse_path(path: &str) -> WalletResult<Vec<DerivationComponent>> {
    let trimmed = path.trim();

    if !trimmed.starts_with("m/") && !trimmed.starts_with("M/") {
        return Err(WalletError::crypto_error(
            "derivation path must start with 'm/'",
        ));
    }

    let path_part = &trimmed[2..];
    if path_part.is_empty() {
        return Err(WalletError::crypto_error("empty derivation path"));
    }

    let mut components = Vec::new();
    for component_str in path_part.split('/') {
        components.push(parse_component(component_str)?);
    }
    Ok(components)
}

/// Parse a single path component
fn parse_component(s: &str) -> WalletResult<DerivationComponent> {
    let trimmed = s.trim();

    if trimmed.is_empty() {
        return Err(WalletError::crypto_error("empty path component"));
    }

    let (number_str, hardened) =
        if trimmed.ends_with('\'') || trimmed.ends_with('h') || trimmed.ends_with('H') {
            (&trimmed[..trimmed.len() - 1], true)
        } else {
            (trimmed, false)
        };

    let index: u32 = number_str.parse().map_err(|e| {
        WalletError::crypto_error(format!("invalid path component '{}': {}", s, e))
    })?;

    if index >= HARDENED {
        return Err(WalletError::crypto_error(format!(
            "path component {} exceeds maximum value",
            index
        )));
    }

    Ok(DerivationComponent::new(index, hardened))
}

/// Check that a path matches the multisig template for the given slot.
///
/// The first four levels must be hardened and equal to the BIP-48
/// constants; the final level must be the non-hardened signer index.
pub fn is_multisig_path(path: &str, signer_index: u32) -> bool {
    let components = match parse_path(path) {
        Ok(c) => c,
        Err(_) => return false,
    };

    let expected = [
        DerivationComponent::new(PURPOSE_MULTISIG, true),
        DerivationComponent::new(COIN_TYPE, true),
        DerivationComponent::new(ACCOUNT, true),
        DerivationComponent::new(SCRIPT_TYPE_P2WSH, true),
        DerivationComponent::new(signer_index, false),
    ];

    components.len() == expected.len() && components.iter().eq(expected.iter())
}
