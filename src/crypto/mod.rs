// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Cryptography
//!
//! - `aes` - user shielding keys and the `AesOutput` envelope
//! - `enclave` - request-shielding key pair and delegated call signer
//! - `signature` - multi-scheme signature verification

pub mod aes;
pub mod enclave;
pub mod signature;

pub use aes::{AesOutput, ShieldingKey, USER_SHIELDING_KEY_LEN, USER_SHIELDING_KEY_NONCE_LEN};
pub use enclave::{EnclaveKeyService, EnclavePublicKey, EnclaveSigner, SealedEnclaveKey};
pub use signature::{MultiSignature, Signature64, Signature65, SR25519_SIGNING_CONTEXT};

/// Errors from cryptographic primitives.
#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    #[error("invalid key length: expected {expected}, got {actual}")]
    InvalidKeyLength { expected: usize, actual: usize },

    #[error("encryption failed")]
    Encryption,

    #[error("decryption failed")]
    Decryption,

    #[error("key derivation failed")]
    KeyDerivation,
}
