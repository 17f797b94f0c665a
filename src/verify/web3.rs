// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Chain-account evidence.
//!
//! | Identity | Accepted schemes | Signed payload |
//! |----------|------------------|----------------|
//! | Substrate | Ed25519, Sr25519 | challenge, or `<Bytes>challenge</Bytes>` |
//! | Evm | Ecdsa, Ethereum | EIP-191 digest of the challenge |
//! | Evm | EthereumPrettified | EIP-191 digest of `0x` + hex(challenge) |
//!
//! The signature is always checked against the expected challenge. The
//! client-supplied message is compared only after the signature holds.

use tracing::debug;

use super::validation::Web3ValidationData;
use crate::crypto::signature::{
    personal_sign_digest, prettified_digest, recover_evm_address, verify_ed25519, verify_sr25519,
};
use crate::crypto::MultiSignature;
use crate::error::ErrorDetail;
use crate::identity::Identity;

/// Envelope browser extensions wrap raw payloads in before signing.
pub const BYTES_PREFIX: &[u8] = b"<Bytes>";
pub const BYTES_SUFFIX: &[u8] = b"</Bytes>";

/// Verify `data` proves ownership of `identity` over `expected`.
pub fn verify_web3(
    identity: &Identity,
    expected: &[u8],
    data: &Web3ValidationData,
) -> Result<(), ErrorDetail> {
    match (identity, data) {
        (Identity::Substrate(address), Web3ValidationData::Substrate { signature, .. }) => {
            verify_substrate(address.as_bytes(), expected, signature)?
        }
        (Identity::Evm(address), Web3ValidationData::Evm { signature, .. }) => {
            verify_evm(address.as_bytes(), expected, signature)?
        }
        _ => return Err(ErrorDetail::InvalidIdentity),
    }

    if data.message() != expected {
        debug!(identity = %identity, "signature valid but supplied message differs from challenge");
        return Err(ErrorDetail::UnexpectedMessage);
    }
    Ok(())
}

fn verify_substrate(
    address: &[u8; 32],
    expected: &[u8],
    signature: &MultiSignature,
) -> Result<(), ErrorDetail> {
    let wrapped = wrap_bytes(expected);
    let valid = match signature {
        MultiSignature::Ed25519(sig) => {
            verify_ed25519(sig, expected, address) || verify_ed25519(sig, &wrapped, address)
        }
        MultiSignature::Sr25519(sig) => {
            verify_sr25519(sig, expected, address) || verify_sr25519(sig, &wrapped, address)
        }
        _ => return Err(ErrorDetail::WrongSignatureType),
    };
    if valid {
        Ok(())
    } else {
        Err(ErrorDetail::VerifySubstrateSignatureFailed)
    }
}

fn verify_evm(
    address: &[u8; 20],
    expected: &[u8],
    signature: &MultiSignature,
) -> Result<(), ErrorDetail> {
    let (sig, digest) = match signature {
        MultiSignature::Ecdsa(sig) | MultiSignature::Ethereum(sig) => {
            (sig, personal_sign_digest(expected))
        }
        MultiSignature::EthereumPrettified(sig) => (sig, prettified_digest(expected)),
        _ => return Err(ErrorDetail::WrongSignatureType),
    };
    let recovered =
        recover_evm_address(sig, &digest).ok_or(ErrorDetail::RecoverEvmAddressFailed)?;
    if &recovered == address {
        Ok(())
    } else {
        debug!(
            recovered = %hex::encode(recovered),
            "evm signature recovered to a different address"
        );
        Err(ErrorDetail::VerifyEvmSignatureFailed)
    }
}

fn wrap_bytes(msg: &[u8]) -> Vec<u8> {
    let mut wrapped = Vec::with_capacity(BYTES_PREFIX.len() + msg.len() + BYTES_SUFFIX.len());
    wrapped.extend_from_slice(BYTES_PREFIX);
    wrapped.extend_from_slice(msg);
    wrapped.extend_from_slice(BYTES_SUFFIX);
    wrapped
}
