// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Multi-scheme signatures and their verification primitives.
//!
//! Substrate accounts sign with Ed25519 or Sr25519 and their 32-byte address
//! is the public key itself. EVM accounts sign with secp256k1 and are
//! identified by the address recovered from the signature.

use std::fmt;

use alloy::primitives::{eip191_hash_message, keccak256};
use ed25519_dalek::Verifier;
use k256::ecdsa::{RecoveryId, Signature as K256Signature, VerifyingKey};
use k256::elliptic_curve::sec1::ToEncodedPoint;
use serde::{Deserialize, Serialize};

use crate::identity::Identity;

/// Signing context used by Substrate sr25519 keys.
pub const SR25519_SIGNING_CONTEXT: &[u8] = b"substrate";

/// Raw 64-byte signature (Ed25519 or Sr25519).
#[derive(Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature64(#[serde(with = "hex::serde")] pub [u8; 64]);

/// Raw 65-byte recoverable secp256k1 signature (`r || s || v`).
#[derive(Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature65(#[serde(with = "hex::serde")] pub [u8; 65]);

impl fmt::Debug for Signature64 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature64(0x{}..)", hex::encode(&self.0[..4]))
    }
}

impl fmt::Debug for Signature65 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature65(0x{}..)", hex::encode(&self.0[..4]))
    }
}

/// A signature under one of the supported schemes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MultiSignature {
    Ed25519(Signature64),
    Sr25519(Signature64),
    Ecdsa(Signature65),
    /// EIP-191 personal-sign over the raw message.
    Ethereum(Signature65),
    /// EIP-191 personal-sign over the `0x`-prefixed hex rendering of the message.
    EthereumPrettified(Signature65),
}

impl MultiSignature {
    /// Verify `msg` was signed by `signer`.
    ///
    /// Used for outer call signatures; link evidence goes through the
    /// identity verifier, which reports categorical failures.
    pub fn verify(&self, msg: &[u8], signer: &Identity) -> bool {
        match (self, signer) {
            (MultiSignature::Ed25519(sig), Identity::Substrate(addr)) => {
                verify_ed25519(sig, msg, addr.as_bytes())
            }
            (MultiSignature::Sr25519(sig), Identity::Substrate(addr)) => {
                verify_sr25519(sig, msg, addr.as_bytes())
            }
            (MultiSignature::Ecdsa(sig) | MultiSignature::Ethereum(sig), Identity::Evm(addr)) => {
                recover_evm_address(sig, &personal_sign_digest(msg)).as_ref()
                    == Some(addr.as_bytes())
            }
            (MultiSignature::EthereumPrettified(sig), Identity::Evm(addr)) => {
                recover_evm_address(sig, &prettified_digest(msg)).as_ref()
                    == Some(addr.as_bytes())
            }
            _ => false,
        }
    }
}

/// Verify an Ed25519 signature against a 32-byte Substrate address.
pub fn verify_ed25519(sig: &Signature64, msg: &[u8], address: &[u8; 32]) -> bool {
    let Ok(key) = ed25519_dalek::VerifyingKey::from_bytes(address) else {
        return false;
    };
    if key.as_bytes() != address {
        return false;
    }
    let sig = ed25519_dalek::Signature::from_bytes(&sig.0);
    key.verify(msg, &sig).is_ok()
}

/// Verify an Sr25519 signature against a 32-byte Substrate address.
pub fn verify_sr25519(sig: &Signature64, msg: &[u8], address: &[u8; 32]) -> bool {
    let Ok(key) = schnorrkel::PublicKey::from_bytes(address) else {
        return false;
    };
    // Non-canonical encodings decode but would not map back to the address.
    if &key.to_bytes() != address {
        return false;
    }
    let Ok(sig) = schnorrkel::Signature::from_bytes(&sig.0) else {
        return false;
    };
    key.verify_simple(SR25519_SIGNING_CONTEXT, msg, &sig).is_ok()
}

/// EIP-191 personal-sign digest of `msg`.
pub fn personal_sign_digest(msg: &[u8]) -> [u8; 32] {
    eip191_hash_message(msg).0
}

/// EIP-191 digest of the `0x`-prefixed lowercase hex rendering of `msg`.
pub fn prettified_digest(msg: &[u8]) -> [u8; 32] {
    let rendered = format!("0x{}", hex::encode(msg));
    personal_sign_digest(rendered.as_bytes())
}

/// Recover the signing EVM address from a 65-byte signature over `prehash`.
///
/// Accepts `v` in both the `{0, 1}` and `{27, 28}` conventions.
pub fn recover_evm_address(sig: &Signature65, prehash: &[u8; 32]) -> Option<[u8; 20]> {
    let v = match sig.0[64] {
        v @ (0 | 1) => v,
        v @ (27 | 28) => v - 27,
        _ => return None,
    };
    let recovery_id = RecoveryId::from_byte(v)?;
    let signature = K256Signature::from_slice(&sig.0[..64]).ok()?;
    let key = VerifyingKey::recover_from_prehash(prehash, &signature, recovery_id).ok()?;
    Some(evm_address(&key))
}

/// EVM address of a secp256k1 public key.
pub fn evm_address(key: &VerifyingKey) -> [u8; 20] {
    let point = key.to_encoded_point(false);
    let hash = keccak256(&point.as_bytes()[1..]);
    let mut address = [0u8; 20];
    address.copy_from_slice(&hash[12..]);
    address
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{EvmKey, SubstrateKey};

    #[test]
    fn ed25519_verifies_only_for_signer() {
        let key = SubstrateKey::ed25519();
        let other = SubstrateKey::ed25519();
        let sig = key.sign(b"hello");

        assert!(sig.verify(b"hello", &key.identity()));
        assert!(!sig.verify(b"hellO", &key.identity()));
        assert!(!sig.verify(b"hello", &other.identity()));
    }

    #[test]
    fn sr25519_verifies_only_for_signer() {
        let key = SubstrateKey::sr25519();
        let sig = key.sign(b"payload");

        assert!(sig.verify(b"payload", &key.identity()));
        assert!(!sig.verify(b"other", &key.identity()));
    }

    #[test]
    fn substrate_schemes_are_not_interchangeable() {
        let key = SubstrateKey::sr25519();
        let MultiSignature::Sr25519(raw) = key.sign(b"m") else {
            panic!("expected sr25519");
        };
        assert!(!MultiSignature::Ed25519(raw).verify(b"m", &key.identity()));
    }

    #[test]
    fn ethereum_personal_sign_recovers_address() {
        let key = EvmKey::random();
        let sig = key.personal_sign(b"challenge");
        let MultiSignature::Ethereum(raw) = sig else {
            panic!("expected ethereum signature");
        };

        let recovered = recover_evm_address(&raw, &personal_sign_digest(b"challenge"));
        assert_eq!(recovered, Some(key.address()));
        assert!(sig.verify(b"challenge", &key.identity()));
        assert!(!sig.verify(b"different", &key.identity()));
    }

    #[test]
    fn prettified_signature_covers_hex_rendering() {
        let key = EvmKey::random();
        let msg = [0xde, 0xad, 0xbe, 0xef];
        let sig = key.personal_sign(b"0xdeadbeef");
        let MultiSignature::Ethereum(raw) = sig else {
            panic!("expected ethereum signature");
        };

        assert!(MultiSignature::EthereumPrettified(raw).verify(&msg, &key.identity()));
        assert!(!MultiSignature::Ethereum(raw).verify(&msg, &key.identity()));
    }

    #[test]
    fn recovery_accepts_both_v_conventions() {
        let key = EvmKey::random();
        let MultiSignature::Ethereum(mut raw) = key.personal_sign(b"v") else {
            panic!("expected ethereum signature");
        };
        let digest = personal_sign_digest(b"v");
        assert_eq!(recover_evm_address(&raw, &digest), Some(key.address()));

        raw.0[64] -= 27;
        assert_eq!(recover_evm_address(&raw, &digest), Some(key.address()));

        raw.0[64] = 5;
        assert_eq!(recover_evm_address(&raw, &digest), None);
    }
}
