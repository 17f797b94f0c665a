// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Trusted calls and operations.
//!
//! A call names its `signer` (whose key signed it) and `who` (the account it
//! acts on). Direct calls are signed by `who` itself; indirect calls are
//! re-signed by the enclave signer on `who`'s behalf.
//!
//! The signature covers `sha256(json(call) || nonce_le || shard)`.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::crypto::MultiSignature;
use crate::error::{Index, StfError};
use crate::identity::{Identity, Web3Network};
use crate::rpc::{ShardIdentifier, H256};
use crate::verify::ValidationData;

use super::getter::Getter;

/// State transition requested by a call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CallAction {
    SetUserShieldingKey {
        #[serde(with = "hex::serde")]
        key: Vec<u8>,
    },
    LinkIdentity {
        identity: Identity,
        validation: ValidationData,
        web3networks: Vec<Web3Network>,
    },
    DeactivateIdentity {
        identity: Identity,
    },
    ActivateIdentity {
        identity: Identity,
    },
    RemoveIdentity {
        identity: Identity,
    },
    SetIdentityNetworks {
        identity: Identity,
        web3networks: Vec<Web3Network>,
    },
}

impl CallAction {
    pub fn name(&self) -> &'static str {
        match self {
            CallAction::SetUserShieldingKey { .. } => "set_user_shielding_key",
            CallAction::LinkIdentity { .. } => "link_identity",
            CallAction::DeactivateIdentity { .. } => "deactivate_identity",
            CallAction::ActivateIdentity { .. } => "activate_identity",
            CallAction::RemoveIdentity { .. } => "remove_identity",
            CallAction::SetIdentityNetworks { .. } => "set_identity_networks",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrustedCall {
    pub signer: Identity,
    pub who: Identity,
    pub action: CallAction,
}

impl TrustedCall {
    pub fn new(signer: Identity, who: Identity, action: CallAction) -> Self {
        Self { signer, who, action }
    }

    /// Digest the outer signature is produced over.
    pub fn signing_payload(&self, nonce: Index, shard: &ShardIdentifier) -> Result<[u8; 32], StfError> {
        let encoded = serde_json::to_vec(self)
            .map_err(|e| StfError::Dispatch(format!("failed to encode call: {e}")))?;
        let mut hasher = Sha256::new();
        hasher.update(&encoded);
        hasher.update(nonce.to_le_bytes());
        hasher.update(shard.0);
        Ok(hasher.finalize().into())
    }

    /// Sign the call with `sign`, which receives the signing payload.
    pub fn sign_with<F>(self, nonce: Index, shard: &ShardIdentifier, sign: F) -> Result<TrustedCallSigned, StfError>
    where
        F: FnOnce(&[u8]) -> MultiSignature,
    {
        let payload = self.signing_payload(nonce, shard)?;
        Ok(TrustedCallSigned {
            signature: sign(&payload),
            call: self,
            nonce,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrustedCallSigned {
    pub call: TrustedCall,
    pub nonce: Index,
    pub signature: MultiSignature,
}

impl TrustedCallSigned {
    /// Whether the signature was produced by `call.signer` over this call.
    pub fn verify_signature(&self, shard: &ShardIdentifier) -> Result<bool, StfError> {
        let payload = self.call.signing_payload(self.nonce, shard)?;
        Ok(self.signature.verify(&payload, &self.call.signer))
    }
}

/// Everything a request can carry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrustedOperation {
    IndirectCall(TrustedCallSigned),
    DirectCall(TrustedCallSigned),
    Get(Getter),
}

impl TrustedOperation {
    /// `sha256(json(operation))`, reported back with call status.
    pub fn hash(&self) -> Result<H256, StfError> {
        let encoded = serde_json::to_vec(self)
            .map_err(|e| StfError::Dispatch(format!("failed to encode operation: {e}")))?;
        Ok(H256(Sha256::digest(&encoded).into()))
    }
}
