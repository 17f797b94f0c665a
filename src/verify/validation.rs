// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Ownership evidence submitted with a link request.
//!
//! Evidence is transient: it is checked once and never stored.

use serde::{Deserialize, Serialize};

use crate::crypto::MultiSignature;
use crate::error::ErrorDetail;
use crate::identity::Identity;

/// Longest accepted provider reference (tweet, channel, message, guild id).
pub const MAX_PROVIDER_REFERENCE_LEN: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValidationData {
    Web2(Web2ValidationData),
    Web3(Web3ValidationData),
}

/// Reference to a post on a social platform, resolved by the data provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Web2ValidationData {
    Twitter {
        tweet_id: String,
    },
    Discord {
        channel_id: String,
        message_id: String,
        guild_id: String,
    },
}

/// A signature over the link challenge.
///
/// `message` is what the client believes the challenge to be. It is never
/// used as the signed payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Web3ValidationData {
    Substrate {
        #[serde(with = "hex::serde")]
        message: Vec<u8>,
        signature: MultiSignature,
    },
    Evm {
        #[serde(with = "hex::serde")]
        message: Vec<u8>,
        signature: MultiSignature,
    },
}

impl Web3ValidationData {
    pub fn message(&self) -> &[u8] {
        match self {
            Web3ValidationData::Substrate { message, .. }
            | Web3ValidationData::Evm { message, .. } => message,
        }
    }

    pub fn signature(&self) -> &MultiSignature {
        match self {
            Web3ValidationData::Substrate { signature, .. }
            | Web3ValidationData::Evm { signature, .. } => signature,
        }
    }
}

impl Web2ValidationData {
    /// Check every provider reference is a non-empty decimal snowflake.
    pub fn ensure_well_formed(&self) -> Result<(), ErrorDetail> {
        let references = match self {
            Web2ValidationData::Twitter { tweet_id } => vec![tweet_id.as_str()],
            Web2ValidationData::Discord {
                channel_id,
                message_id,
                guild_id,
            } => vec![channel_id.as_str(), message_id.as_str(), guild_id.as_str()],
        };
        if references.iter().all(|r| is_snowflake(r)) {
            Ok(())
        } else {
            Err(ErrorDetail::ParseError)
        }
    }
}

fn is_snowflake(reference: &str) -> bool {
    !reference.is_empty()
        && reference.len() <= MAX_PROVIDER_REFERENCE_LEN
        && reference.bytes().all(|b| b.is_ascii_digit())
}

/// Whether `validation` is the evidence kind `identity` is proven with.
///
/// Github has no evidence kind and can never be linked.
pub fn ensure_compatible(identity: &Identity, validation: &ValidationData) -> Result<(), ErrorDetail> {
    let compatible = matches!(
        (identity, validation),
        (
            Identity::Twitter(_),
            ValidationData::Web2(Web2ValidationData::Twitter { .. })
        ) | (
            Identity::Discord(_),
            ValidationData::Web2(Web2ValidationData::Discord { .. })
        ) | (
            Identity::Substrate(_),
            ValidationData::Web3(Web3ValidationData::Substrate { .. })
        ) | (
            Identity::Evm(_),
            ValidationData::Web3(Web3ValidationData::Evm { .. })
        )
    );
    if compatible {
        Ok(())
    } else {
        Err(ErrorDetail::InvalidIdentity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::Signature65;

    fn evm_data() -> ValidationData {
        ValidationData::Web3(Web3ValidationData::Evm {
            message: vec![1, 2, 3],
            signature: MultiSignature::Ethereum(Signature65([0u8; 65])),
        })
    }

    fn tweet(id: &str) -> Web2ValidationData {
        Web2ValidationData::Twitter {
            tweet_id: id.to_string(),
        }
    }

    #[test]
    fn twitter_with_evm_evidence_is_incompatible() {
        let twitter = Identity::twitter("alice").unwrap();
        assert_eq!(
            ensure_compatible(&twitter, &evm_data()),
            Err(ErrorDetail::InvalidIdentity)
        );
        assert!(ensure_compatible(&twitter, &ValidationData::Web2(tweet("1"))).is_ok());
    }

    #[test]
    fn github_is_never_compatible() {
        let github = Identity::github("alice").unwrap();
        assert!(ensure_compatible(&github, &ValidationData::Web2(tweet("1"))).is_err());
        assert!(ensure_compatible(&github, &evm_data()).is_err());
    }

    #[test]
    fn chain_identities_match_their_family() {
        assert!(ensure_compatible(&Identity::evm([1u8; 20]), &evm_data()).is_ok());
        assert!(ensure_compatible(&Identity::substrate([1u8; 32]), &evm_data()).is_err());
    }

    #[test]
    fn provider_references_must_be_snowflakes() {
        assert!(tweet("1699999999999999999").ensure_well_formed().is_ok());
        assert_eq!(tweet("").ensure_well_formed(), Err(ErrorDetail::ParseError));
        assert_eq!(tweet("12a").ensure_well_formed(), Err(ErrorDetail::ParseError));
        assert!(tweet(&"9".repeat(33)).ensure_well_formed().is_err());

        let discord = Web2ValidationData::Discord {
            channel_id: "1".into(),
            message_id: "2".into(),
            guild_id: "guild".into(),
        };
        assert_eq!(discord.ensure_well_formed(), Err(ErrorDetail::ParseError));
    }

    #[test]
    fn web3_message_serializes_as_hex() {
        let json = serde_json::to_value(evm_data()).unwrap();
        assert_eq!(json["Web3"]["Evm"]["message"], "010203");
    }
}
