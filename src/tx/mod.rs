//! Transaction input signing for multisig spends.

pub mod signer;

pub use signer::{input_signature_count, is_input_complete, sign_input};
