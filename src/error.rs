//! Unified error types for the multisig wallet core.
//!
//! All errors flow through this module for consistent handling.
//! Every error here is deterministic with respect to its inputs, so
//! retrying a failed operation with the same arguments is never a remedy.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Main error type for all wallet operations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletError {
    pub code: ErrorCode,
    pub message: String,
    pub details: Option<String>,
}

impl WalletError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    // Convenience constructors
    pub fn invalid_policy(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidPolicy, msg)
    }

    pub fn key_generation_failed(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::KeyGenerationFailed, msg)
    }

    pub fn missing_private_key(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::MissingPrivateKey, msg)
    }

    pub fn invalid_input_index(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidInputIndex, msg)
    }

    pub fn script_construction_failed(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::ScriptConstructionFailed, msg)
    }

    pub fn invalid_mnemonic(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidMnemonic, msg)
    }

    pub fn crypto_error(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::CryptoError, msg)
    }

    pub fn signing_failed(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::SigningFailed, msg)
    }
}

impl fmt::Display for WalletError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)?;
        if let Some(ref details) = self.details {
            write!(f, " ({})", details)?;
        }
        Ok(())
    }
}

impl std::error::Error for WalletError {}

/// Error codes for categorization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    // Construction errors
    InvalidPolicy,
    KeyGenerationFailed,
    ScriptConstructionFailed,

    // Signing errors
    MissingPrivateKey,
    InvalidInputIndex,
    SigningFailed,

    // Input errors
    InvalidMnemonic,
    InvalidPublicKey,

    // Crypto errors
    CryptoError,
}

/// Result type alias for wallet operations
pub type WalletResult<T> = Result<T, WalletError>;

// Conversions from common error types

impl From<bip39::Error> for WalletError {
    fn from(e: bip39::Error) -> Self {
        WalletError::new(ErrorCode::InvalidMnemonic, format!("BIP39 error: {}", e))
    }
}

impl From<bitcoin::bip32::Error> for WalletError {
    fn from(e: bitcoin::bip32::Error) -> Self {
        WalletError::new(ErrorCode::CryptoError, format!("BIP32 error: {}", e))
    }
}

impl From<bitcoin::secp256k1::Error> for WalletError {
    fn from(e: bitcoin::secp256k1::Error) -> Self {
        WalletError::new(ErrorCode::CryptoError, format!("Secp256k1 error: {}", e))
    }
}

impl From<hex::FromHexError> for WalletError {
    fn from(e: hex::FromHexError) -> Self {
        WalletError::new(ErrorCode::CryptoError, e.to_string())
    }
}
