// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Enclave key management and the delegated call signer.
//!
//! The enclave owns a single sealed secret. Two keys are derived from it:
//!
//! - an X25519 request-shielding key. Clients seal requests to its public
//!   half, [`EnclavePublicKey`], which the host hands out unencrypted.
//! - the Ed25519 key the enclave uses to re-sign relayed calls.
//!
//! ## Sealed requests
//!
//! ```text
//! ephemeral X25519 public key (32) || nonce (12) || AES-256-GCM ciphertext
//! ```
//!
//! The AES key is `HMAC-SHA256(dh(ephemeral, enclave), label || ephemeral || enclave)`.
//!
//! Provisioning of the secret (remote attestation, sealing) happens outside
//! this crate; [`SealedEnclaveKey`] only consumes the unsealed bytes.

use std::fmt;

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use ed25519_dalek::{Signer, SigningKey};
use hmac::digest::generic_array::GenericArray;
use hmac::{Hmac, Mac};
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use x25519_dalek::{EphemeralSecret, PublicKey, SharedSecret, StaticSecret};
use zeroize::Zeroizing;

use super::signature::{MultiSignature, Signature64};
use super::CryptoError;
use crate::identity::Identity;

const NONCE_LEN: usize = 12;
const PUBLIC_KEY_LEN: usize = 32;
const HMAC_BLOCK_LEN: usize = 64;
const CALL_SIGNING_DERIVATION: &[u8] = b"enclave-call-signing";
const REQUEST_SHIELDING_DERIVATION: &[u8] = b"enclave-request-shielding";
const REQUEST_KEY_DERIVATION: &[u8] = b"enclave-request-key";

/// Primitives of the enclave's request-shielding key.
pub trait EnclaveKeyService: Send + Sync {
    /// Open a request sealed to [`Self::public_key`].
    fn decrypt(&self, ciphertext: &[u8]) -> Result<Vec<u8>, CryptoError>;

    /// Public half of the request-shielding key.
    fn public_key(&self) -> EnclavePublicKey;

    /// Derive the delegated call signer.
    fn call_signer(&self) -> EnclaveSigner;
}

/// Public request-shielding key of the enclave.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EnclavePublicKey(#[serde(with = "hex::serde")] pub [u8; PUBLIC_KEY_LEN]);

impl EnclavePublicKey {
    /// Seal `plaintext` so only the enclave can open it.
    pub fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let ephemeral = EphemeralSecret::random_from_rng(OsRng);
        let ephemeral_public = PublicKey::from(&ephemeral);
        let shared = ephemeral.diffie_hellman(&PublicKey::from(self.0));
        let key = request_key(&shared, ephemeral_public.as_bytes(), &self.0)
            .ok_or(CryptoError::Encryption)?;

        let mut nonce = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce);
        let body = cipher(&key)
            .encrypt(Nonce::from_slice(&nonce), plaintext)
            .map_err(|_| CryptoError::Encryption)?;

        let mut out = Vec::with_capacity(PUBLIC_KEY_LEN + NONCE_LEN + body.len());
        out.extend_from_slice(ephemeral_public.as_bytes());
        out.extend_from_slice(&nonce);
        out.extend_from_slice(&body);
        Ok(out)
    }
}

impl fmt::Debug for EnclavePublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EnclavePublicKey(0x{})", hex::encode(self.0))
    }
}

/// Enclave keys derived from the sealed secret, held in enclave memory.
pub struct SealedEnclaveKey {
    shielding: StaticSecret,
    signing_seed: Zeroizing<[u8; 32]>,
}

impl SealedEnclaveKey {
    pub fn from_seed(secret: [u8; 32]) -> Self {
        let secret = Zeroizing::new(secret);
        Self {
            shielding: StaticSecret::from(*derive(&secret, REQUEST_SHIELDING_DERIVATION)),
            signing_seed: derive(&secret, CALL_SIGNING_DERIVATION),
        }
    }

    pub fn generate() -> Self {
        let mut secret = Zeroizing::new([0u8; 32]);
        OsRng.fill_bytes(&mut secret[..]);
        Self::from_seed(*secret)
    }
}

impl EnclaveKeyService for SealedEnclaveKey {
    fn decrypt(&self, ciphertext: &[u8]) -> Result<Vec<u8>, CryptoError> {
        if ciphertext.len() < PUBLIC_KEY_LEN + NONCE_LEN {
            return Err(CryptoError::Decryption);
        }
        let (ephemeral, rest) = ciphertext.split_at(PUBLIC_KEY_LEN);
        let (nonce, body) = rest.split_at(NONCE_LEN);
        let ephemeral: [u8; PUBLIC_KEY_LEN] =
            ephemeral.try_into().map_err(|_| CryptoError::Decryption)?;

        let shared = self.shielding.diffie_hellman(&PublicKey::from(ephemeral));
        let key = request_key(&shared, &ephemeral, &self.public_key().0)
            .ok_or(CryptoError::Decryption)?;
        cipher(&key)
            .decrypt(Nonce::from_slice(nonce), body)
            .map_err(|_| CryptoError::Decryption)
    }

    fn public_key(&self) -> EnclavePublicKey {
        EnclavePublicKey(PublicKey::from(&self.shielding).to_bytes())
    }

    fn call_signer(&self) -> EnclaveSigner {
        EnclaveSigner::from_seed(&self.signing_seed)
    }
}

impl fmt::Debug for SealedEnclaveKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SealedEnclaveKey([REDACTED])")
    }
}

/// `HMAC-SHA256(secret, label)`.
fn derive(secret: &[u8; 32], label: &[u8]) -> Zeroizing<[u8; 32]> {
    // HMAC zero-pads keys shorter than the block, so this is HMAC keyed by `secret`.
    let mut key = Zeroizing::new([0u8; HMAC_BLOCK_LEN]);
    key[..secret.len()].copy_from_slice(secret);
    let mut mac = <Hmac<Sha256> as Mac>::new(GenericArray::from_slice(&key[..]));
    mac.update(label);
    Zeroizing::new(mac.finalize().into_bytes().into())
}

/// AES key of a sealed request. `None` for a non-contributory exchange
/// (low-order ephemeral point).
fn request_key(
    shared: &SharedSecret,
    ephemeral: &[u8; PUBLIC_KEY_LEN],
    enclave: &[u8; PUBLIC_KEY_LEN],
) -> Option<Zeroizing<[u8; 32]>> {
    if !shared.was_contributory() {
        return None;
    }
    let mut context = Vec::with_capacity(REQUEST_KEY_DERIVATION.len() + 2 * PUBLIC_KEY_LEN);
    context.extend_from_slice(REQUEST_KEY_DERIVATION);
    context.extend_from_slice(ephemeral);
    context.extend_from_slice(enclave);
    Some(derive(shared.as_bytes(), &context))
}

fn cipher(key: &[u8; 32]) -> Aes256Gcm {
    Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key))
}

/// The enclave's delegated signer for relayed calls.
#[derive(Clone)]
pub struct EnclaveSigner {
    key: SigningKey,
}

impl EnclaveSigner {
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        Self {
            key: SigningKey::from_bytes(seed),
        }
    }

    /// The signer's account, a Substrate identity of its Ed25519 public key.
    pub fn account(&self) -> Identity {
        Identity::substrate(self.key.verifying_key().to_bytes())
    }

    pub fn sign(&self, payload: &[u8]) -> MultiSignature {
        MultiSignature::Ed25519(Signature64(self.key.sign(payload).to_bytes()))
    }
}

impl fmt::Debug for EnclaveSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnclaveSigner")
            .field("account", &self.account().to_did())
            .finish()
    }
}
