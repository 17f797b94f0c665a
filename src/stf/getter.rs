// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Read-only queries.
//!
//! Public getters return plaintext and need no signature. Trusted getters
//! are signed by the account they query over `sha256(json(getter))` and
//! answer with data encrypted under that account's shielding key.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::crypto::{AesOutput, MultiSignature};
use crate::error::{Index, StfError};
use crate::identity::Identity;
use crate::verify::ChallengeCode;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Getter {
    Public(PublicGetter),
    Trusted(TrustedGetterSigned),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PublicGetter {
    /// Next direct-call nonce of an account.
    Nonce(Identity),
    /// Current challenge code for `who` linking `identity`.
    ChallengeCode { who: Identity, identity: Identity },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrustedGetter {
    IdGraph(Identity),
    IdGraphStats(Identity),
    /// The shielding key, encrypted under itself.
    UserShieldingKey(Identity),
}

impl TrustedGetter {
    /// The account being queried, who must also sign the getter.
    pub fn who(&self) -> &Identity {
        match self {
            TrustedGetter::IdGraph(who)
            | TrustedGetter::IdGraphStats(who)
            | TrustedGetter::UserShieldingKey(who) => who,
        }
    }

    pub fn signing_payload(&self) -> Result<[u8; 32], StfError> {
        let encoded = serde_json::to_vec(self)
            .map_err(|e| StfError::Dispatch(format!("failed to encode getter: {e}")))?;
        Ok(Sha256::digest(&encoded).into())
    }

    pub fn sign_with<F>(self, sign: F) -> Result<TrustedGetterSigned, StfError>
    where
        F: FnOnce(&[u8]) -> MultiSignature,
    {
        let payload = self.signing_payload()?;
        Ok(TrustedGetterSigned {
            signature: sign(&payload),
            getter: self,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrustedGetterSigned {
    pub getter: TrustedGetter,
    pub signature: MultiSignature,
}

impl TrustedGetterSigned {
    pub fn verify_signature(&self) -> Result<bool, StfError> {
        let payload = self.getter.signing_payload()?;
        Ok(self.signature.verify(&payload, self.getter.who()))
    }
}

/// Result of a getter, serialized into the response value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GetterOutput {
    Nonce(Index),
    ChallengeCode(ChallengeCode),
    Encrypted(AesOutput),
}
