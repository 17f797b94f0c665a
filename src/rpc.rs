// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Request and response envelopes exchanged with the host.
//!
//! | Envelope | Fields |
//! |----------|--------|
//! | `Request` | `shard`, `ciphertext` (encrypted to the enclave) |
//! | `RpcReturnValue` | `value`, `do_watch`, `status` |
//!
//! `value` carries JSON: an encrypted `AesOutput` for successful calls and
//! trusted getters, a plaintext value for public getters, or the plaintext
//! `StfError` when `status` is `Error`.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::StfError;

/// 32-byte hash.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct H256(#[serde(with = "hex::serde")] pub [u8; 32]);

impl fmt::Debug for H256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Display for H256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl From<[u8; 32]> for H256 {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

/// Identifier of the state shard a request targets.
pub type ShardIdentifier = H256;

/// An encrypted request for this enclave.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    pub shard: ShardIdentifier,
    #[serde(with = "hex::serde")]
    pub ciphertext: Vec<u8>,
}

/// Lifecycle status of a trusted operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrustedOperationStatus {
    Submitted,
    Future,
    Ready,
    Broadcast,
    InSidechainBlock(H256),
    Retracted,
    FinalityTimeout,
    Finalized,
    Usurped,
    Dropped,
    Invalid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DirectRequestStatus {
    Ok,
    /// Status of a trusted call, with the operation hash.
    TrustedOperationStatus(TrustedOperationStatus, H256),
    Error,
}

/// Response to a [`Request`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpcReturnValue {
    #[serde(with = "hex::serde")]
    pub value: Vec<u8>,
    pub do_watch: bool,
    pub status: DirectRequestStatus,
}

impl RpcReturnValue {
    /// Successful getter response.
    pub fn ok(value: Vec<u8>) -> Self {
        Self {
            value,
            do_watch: false,
            status: DirectRequestStatus::Ok,
        }
    }

    /// A call that has run to completion.
    pub fn executed(value: Vec<u8>, hash: H256) -> Self {
        Self {
            value,
            do_watch: false,
            status: DirectRequestStatus::TrustedOperationStatus(
                TrustedOperationStatus::Finalized,
                hash,
            ),
        }
    }

    /// Failure response carrying the plaintext error.
    pub fn error(err: &StfError) -> Self {
        // An enum of strings and unit variants always serializes.
        let value = serde_json::to_vec(err).unwrap_or_default();
        Self {
            value,
            do_watch: false,
            status: DirectRequestStatus::Error,
        }
    }

    pub fn is_error(&self) -> bool {
        self.status == DirectRequestStatus::Error
    }

    /// Decode the error carried by a failure response.
    pub fn stf_error(&self) -> Option<StfError> {
        if !self.is_error() {
            return None;
        }
        serde_json::from_slice(&self.value).ok()
    }
}
