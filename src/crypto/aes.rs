// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! AES-256-GCM encryption under a user's shielding key.
//!
//! ## Nonces
//!
//! Each key carries 12 bytes of random nonce material drawn when the key is
//! imported. Every encryption XORs a per-key counter into the low 8 bytes,
//! so a nonce never repeats for the lifetime of a key. Overwriting the key
//! draws fresh material.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use aes_gcm::aead::{Aead, KeyInit, Payload};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

use super::CryptoError;

/// Size of a user shielding key in bytes.
pub const USER_SHIELDING_KEY_LEN: usize = 32;

/// Size of the AES-GCM nonce in bytes.
pub const USER_SHIELDING_KEY_NONCE_LEN: usize = 12;

/// Encrypted payload returned to a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AesOutput {
    #[serde(with = "hex::serde")]
    pub ciphertext: Vec<u8>,
    #[serde(with = "hex::serde")]
    pub aad: Vec<u8>,
    #[serde(with = "hex::serde")]
    pub nonce: [u8; USER_SHIELDING_KEY_NONCE_LEN],
}

/// A user's symmetric shielding key.
///
/// Key bytes are zeroized on drop and never printed.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct ShieldingKey {
    key: [u8; USER_SHIELDING_KEY_LEN],
    nonce_material: [u8; USER_SHIELDING_KEY_NONCE_LEN],
    #[zeroize(skip)]
    counter: AtomicU64,
}

impl ShieldingKey {
    /// Import a key from raw bytes, drawing fresh nonce material.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        let key: [u8; USER_SHIELDING_KEY_LEN] =
            bytes.try_into().map_err(|_| CryptoError::InvalidKeyLength {
                expected: USER_SHIELDING_KEY_LEN,
                actual: bytes.len(),
            })?;
        let mut nonce_material = [0u8; USER_SHIELDING_KEY_NONCE_LEN];
        OsRng.fill_bytes(&mut nonce_material);
        Ok(Self {
            key,
            nonce_material,
            counter: AtomicU64::new(0),
        })
    }

    /// Generate a random key.
    pub fn generate() -> Self {
        let mut key = [0u8; USER_SHIELDING_KEY_LEN];
        OsRng.fill_bytes(&mut key);
        let mut nonce_material = [0u8; USER_SHIELDING_KEY_NONCE_LEN];
        OsRng.fill_bytes(&mut nonce_material);
        Self {
            key,
            nonce_material,
            counter: AtomicU64::new(0),
        }
    }

    /// Encrypt `plaintext`, binding `aad`.
    pub fn encrypt(&self, plaintext: &[u8], aad: &[u8]) -> Result<AesOutput, CryptoError> {
        let nonce = self.next_nonce();
        let ciphertext = self
            .cipher()
            .encrypt(Nonce::from_slice(&nonce), Payload { msg: plaintext, aad })
            .map_err(|_| CryptoError::Encryption)?;
        Ok(AesOutput {
            ciphertext,
            aad: aad.to_vec(),
            nonce,
        })
    }

    /// Decrypt an output produced under this key.
    pub fn decrypt(&self, output: &AesOutput) -> Result<Vec<u8>, CryptoError> {
        self.cipher()
            .decrypt(
                Nonce::from_slice(&output.nonce),
                Payload {
                    msg: &output.ciphertext,
                    aad: &output.aad,
                },
            )
            .map_err(|_| CryptoError::Decryption)
    }

    fn cipher(&self) -> Aes256Gcm {
        Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&self.key))
    }

    fn next_nonce(&self) -> [u8; USER_SHIELDING_KEY_NONCE_LEN] {
        let counter = self.counter.fetch_add(1, Ordering::Relaxed).to_le_bytes();
        let mut nonce = self.nonce_material;
        for (n, c) in nonce[4..].iter_mut().zip(counter) {
            *n ^= c;
        }
        nonce
    }
}

impl fmt::Debug for ShieldingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ShieldingKey([REDACTED])")
    }
}
