// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Error taxonomy for the identity core.
//!
//! Two layers travel on the wire:
//!
//! - [`ErrorDetail`] - the categorical reason a call was rejected
//!   (verification, import, graph invariant).
//! - [`StfError`] - the call-level failure event. Call-specific variants
//!   wrap an `ErrorDetail`; the rest are authorization or infrastructure
//!   failures.
//!
//! Neither type is ever used for control flow past the dispatcher: a
//! rejected call leaves state unchanged and is reported back to the caller.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::identity::Identity;

/// Nonce index of a signed call.
pub type Index = u32;

/// Categorical reason for a rejected call.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum ErrorDetail {
    #[error("failed to import the user shielding key")]
    ImportError,
    /// Kept so clients decoding the full error set stay compatible. Signer
    /// mismatches are reported as [`StfError::MissingPrivileges`].
    #[error("signer is not authorized for this account")]
    UnauthorizedSigner,
    #[error("state transition error: {0}")]
    StfError(String),
    #[error("user shielding key not found")]
    UserShieldingKeyNotFound,
    #[error("failed to parse request")]
    ParseError,
    #[error("data provider error: {0}")]
    DataProviderError(String),
    #[error("identity does not match the supplied evidence")]
    InvalidIdentity,
    #[error("web2 handle does not match the identity")]
    WrongWeb2Handle,
    #[error("unexpected verification message")]
    UnexpectedMessage,
    #[error("signature type is not valid for this identity")]
    WrongSignatureType,
    #[error("substrate signature verification failed")]
    VerifySubstrateSignatureFailed,
    #[error("evm signature verification failed")]
    VerifyEvmSignatureFailed,
    #[error("failed to recover evm address from signature")]
    RecoverEvmAddressFailed,
    #[error("web3 networks out of bounds")]
    Web3NetworkOutOfBounds,
    #[error("identity already linked")]
    IdentityAlreadyLinked,
    #[error("identity does not exist")]
    IdentityNotExist,
    #[error("removing the prime identity is not allowed")]
    RemovePrimeIdentityDisallowed,
    #[error("deactivating the prime identity is not allowed")]
    DeactivatePrimeIdentityDisallowed,
    #[error("identity graph length limit reached")]
    IdGraphLenLimitReached,
}

/// Failure outcome of a trusted operation.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum StfError {
    #[error("{0} is missing privileges for this call")]
    MissingPrivileges(Identity),
    #[error("indirect call must be signed by the enclave signer account")]
    RequireEnclaveSignerAccount,
    #[error("signature does not match the signer")]
    InvalidSignature,
    #[error("dispatch error: {0}")]
    Dispatch(String),
    #[error("invalid nonce: expected {0}, got {1}")]
    InvalidNonce(Index, Index),
    #[error("set user shielding key failed: {0}")]
    SetUserShieldingKeyFailed(ErrorDetail),
    #[error("link identity failed: {0}")]
    LinkIdentityFailed(ErrorDetail),
    #[error("deactivate identity failed: {0}")]
    DeactivateIdentityFailed(ErrorDetail),
    #[error("activate identity failed: {0}")]
    ActivateIdentityFailed(ErrorDetail),
    #[error("remove identity failed: {0}")]
    RemoveIdentityFailed(ErrorDetail),
    #[error("set identity networks failed: {0}")]
    SetIdentityNetworksFailed(ErrorDetail),
    #[error("getter failed: {0}")]
    GetterFailed(ErrorDetail),
    #[error("invalid account")]
    InvalidAccount,
    /// Kept so clients decoding the full error set stay compatible. The core
    /// reports infrastructure failures as [`StfError::Dispatch`].
    #[error("unclassified error")]
    UnclassifiedError,
}

impl StfError {
    /// The nested [`ErrorDetail`], for call-specific failures.
    pub fn detail(&self) -> Option<&ErrorDetail> {
        match self {
            StfError::SetUserShieldingKeyFailed(d)
            | StfError::LinkIdentityFailed(d)
            | StfError::DeactivateIdentityFailed(d)
            | StfError::ActivateIdentityFailed(d)
            | StfError::RemoveIdentityFailed(d)
            | StfError::SetIdentityNetworksFailed(d)
            | StfError::GetterFailed(d) => Some(d),
            _ => None,
        }
    }

    /// Whether the failure stems from infrastructure rather than the call itself.
    pub fn is_infrastructure(&self) -> bool {
        matches!(self, StfError::Dispatch(_) | StfError::UnclassifiedError)
    }
}

pub type StfResult<T> = Result<T, StfError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detail_extracts_nested_error() {
        let err = StfError::LinkIdentityFailed(ErrorDetail::InvalidIdentity);
        assert_eq!(err.detail(), Some(&ErrorDetail::InvalidIdentity));
        assert_eq!(StfError::InvalidNonce(1, 2).detail(), None);
    }

    #[test]
    fn infrastructure_classification() {
        assert!(StfError::Dispatch("boom".into()).is_infrastructure());
        assert!(StfError::UnclassifiedError.is_infrastructure());
        assert!(!StfError::RequireEnclaveSignerAccount.is_infrastructure());
    }

    #[test]
    fn error_serializes_with_variant_tag() {
        let err = StfError::RemoveIdentityFailed(ErrorDetail::RemovePrimeIdentityDisallowed);
        let json = serde_json::to_string(&err).unwrap();
        assert_eq!(json, r#"{"RemoveIdentityFailed":"RemovePrimeIdentityDisallowed"}"#);

        let back: StfError = serde_json::from_str(&json).unwrap();
        assert_eq!(back, err);
    }

    #[test]
    fn compatibility_variants_keep_wire_names() {
        assert_eq!(
            serde_json::to_string(&StfError::UnclassifiedError).unwrap(),
            r#""UnclassifiedError""#
        );
        let err: StfError =
            serde_json::from_str(r#"{"LinkIdentityFailed":"UnauthorizedSigner"}"#).unwrap();
        assert_eq!(err.detail(), Some(&ErrorDetail::UnauthorizedSigner));
    }

    #[test]
    fn display_is_human_readable() {
        assert_eq!(
            StfError::InvalidNonce(3, 5).to_string(),
            "invalid nonce: expected 3, got 5"
        );
    }
}
