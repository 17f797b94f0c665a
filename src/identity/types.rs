// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Identity kinds and chain network identifiers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ErrorDetail;

/// Maximum length of a social handle in bytes.
pub const MAX_IDENTITY_STRING_LEN: usize = 64;

/// Maximum number of networks attached to a single identity.
pub const MAX_WEB3_NETWORKS: usize = 128;

const DID_PREFIX: &str = "did:litentry:";

/// 32-byte Substrate account address (the raw public key).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Address32(#[serde(with = "hex::serde")] pub [u8; 32]);

/// 20-byte EVM account address.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Address20(#[serde(with = "hex::serde")] pub [u8; 20]);

impl Address32 {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl Address20 {
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }
}

impl From<[u8; 32]> for Address32 {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl From<[u8; 20]> for Address20 {
    fn from(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }
}

impl fmt::Debug for Address32 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address32(0x{})", hex::encode(self.0))
    }
}

impl fmt::Debug for Address20 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address20(0x{})", hex::encode(self.0))
    }
}

/// Bounded social-platform handle.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct IdentityString(String);

impl IdentityString {
    pub fn new(handle: impl Into<String>) -> Result<Self, ErrorDetail> {
        let handle = handle.into();
        if handle.is_empty() || handle.len() > MAX_IDENTITY_STRING_LEN {
            return Err(ErrorDetail::InvalidIdentity);
        }
        Ok(Self(handle))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for IdentityString {
    type Error = ErrorDetail;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<IdentityString> for String {
    fn from(value: IdentityString) -> Self {
        value.0
    }
}

/// An external identity that can be linked to an account.
///
/// Identities compare by `(kind, raw value)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Identity {
    Twitter(IdentityString),
    Discord(IdentityString),
    Github(IdentityString),
    Substrate(Address32),
    Evm(Address20),
}

impl Identity {
    pub fn twitter(handle: &str) -> Result<Self, ErrorDetail> {
        Ok(Identity::Twitter(IdentityString::new(handle)?))
    }

    pub fn discord(handle: &str) -> Result<Self, ErrorDetail> {
        Ok(Identity::Discord(IdentityString::new(handle)?))
    }

    pub fn github(handle: &str) -> Result<Self, ErrorDetail> {
        Ok(Identity::Github(IdentityString::new(handle)?))
    }

    pub fn substrate(address: [u8; 32]) -> Self {
        Identity::Substrate(Address32(address))
    }

    pub fn evm(address: [u8; 20]) -> Self {
        Identity::Evm(Address20(address))
    }

    /// Social-platform identity.
    pub fn is_web2(&self) -> bool {
        matches!(
            self,
            Identity::Twitter(_) | Identity::Discord(_) | Identity::Github(_)
        )
    }

    /// Chain-address identity.
    pub fn is_web3(&self) -> bool {
        !self.is_web2()
    }

    /// Lowercase kind tag used in DIDs and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Identity::Twitter(_) => "twitter",
            Identity::Discord(_) => "discord",
            Identity::Github(_) => "github",
            Identity::Substrate(_) => "substrate",
            Identity::Evm(_) => "evm",
        }
    }

    /// The social handle for web2 identities.
    pub fn handle(&self) -> Option<&str> {
        match self {
            Identity::Twitter(s) | Identity::Discord(s) | Identity::Github(s) => Some(s.as_str()),
            Identity::Substrate(_) | Identity::Evm(_) => None,
        }
    }

    /// Whether `network` belongs to this identity's chain family.
    pub fn supports_network(&self, network: Web3Network) -> bool {
        match self {
            Identity::Substrate(_) => network.is_substrate(),
            Identity::Evm(_) => network.is_evm(),
            _ => false,
        }
    }

    /// Render as `did:litentry:<kind>:<value>`.
    pub fn to_did(&self) -> String {
        let value = match self {
            Identity::Twitter(s) | Identity::Discord(s) | Identity::Github(s) => {
                s.as_str().to_string()
            }
            Identity::Substrate(a) => format!("0x{}", hex::encode(a.0)),
            Identity::Evm(a) => format!("0x{}", hex::encode(a.0)),
        };
        format!("{DID_PREFIX}{}:{value}", self.kind())
    }

    /// Parse the DID form produced by [`Identity::to_did`].
    pub fn from_did(did: &str) -> Result<Self, ErrorDetail> {
        let rest = did.strip_prefix(DID_PREFIX).ok_or(ErrorDetail::ParseError)?;
        let (kind, value) = rest.split_once(':').ok_or(ErrorDetail::ParseError)?;
        match kind {
            "twitter" => Identity::twitter(value),
            "discord" => Identity::discord(value),
            "github" => Identity::github(value),
            "substrate" => Ok(Identity::substrate(decode_fixed_hex(value)?)),
            "evm" => Ok(Identity::evm(decode_fixed_hex(value)?)),
            _ => Err(ErrorDetail::ParseError),
        }
    }
}

fn decode_fixed_hex<const N: usize>(value: &str) -> Result<[u8; N], ErrorDetail> {
    let raw = value.strip_prefix("0x").unwrap_or(value);
    let bytes = hex::decode(raw).map_err(|_| ErrorDetail::ParseError)?;
    bytes.try_into().map_err(|_| ErrorDetail::ParseError)
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_did())
    }
}

impl FromStr for Identity {
    type Err = ErrorDetail;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Identity::from_did(s)
    }
}

/// Chain networks an identity can be active on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Web3Network {
    Polkadot,
    Kusama,
    Litentry,
    Litmus,
    LitentryRococo,
    Khala,
    SubstrateTestnet,
    Ethereum,
    Bsc,
}

impl Web3Network {
    pub const ALL: [Web3Network; 9] = [
        Web3Network::Polkadot,
        Web3Network::Kusama,
        Web3Network::Litentry,
        Web3Network::Litmus,
        Web3Network::LitentryRococo,
        Web3Network::Khala,
        Web3Network::SubstrateTestnet,
        Web3Network::Ethereum,
        Web3Network::Bsc,
    ];

    pub fn is_substrate(&self) -> bool {
        !self.is_evm()
    }

    pub fn is_evm(&self) -> bool {
        matches!(self, Web3Network::Ethereum | Web3Network::Bsc)
    }
}

/// Deduplicated, bounded network set in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Web3Network>", into = "Vec<Web3Network>")]
pub struct Web3Networks(Vec<Web3Network>);

impl Web3Networks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate the set against `identity`'s chain family.
    ///
    /// Social identities only accept the empty set.
    pub fn for_identity(
        identity: &Identity,
        networks: Vec<Web3Network>,
    ) -> Result<Self, ErrorDetail> {
        let set = Self::try_from(networks)?;
        if set.iter().all(|n| identity.supports_network(*n)) {
            Ok(set)
        } else {
            Err(ErrorDetail::Web3NetworkOutOfBounds)
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Web3Network> {
        self.0.iter()
    }

    pub fn contains(&self, network: &Web3Network) -> bool {
        self.0.contains(network)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[Web3Network] {
        &self.0
    }
}

impl TryFrom<Vec<Web3Network>> for Web3Networks {
    type Error = ErrorDetail;

    /// Deduplicates, then bounds the distinct networks.
    fn try_from(networks: Vec<Web3Network>) -> Result<Self, Self::Error> {
        let mut set = Vec::new();
        for network in networks {
            if !set.contains(&network) {
                set.push(network);
            }
        }
        if set.len() > MAX_WEB3_NETWORKS {
            return Err(ErrorDetail::Web3NetworkOutOfBounds);
        }
        Ok(Self(set))
    }
}

impl From<Web3Networks> for Vec<Web3Network> {
    fn from(value: Web3Networks) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identities_compare_by_kind_and_value() {
        let a = Identity::twitter("alice").unwrap();
        let b = Identity::discord("alice").unwrap();
        assert_ne!(a, b);
        assert_eq!(a, Identity::twitter("alice").unwrap());
    }

    #[test]
    fn identity_string_is_bounded() {
        assert!(IdentityString::new("").is_err());
        assert!(IdentityString::new("a".repeat(MAX_IDENTITY_STRING_LEN)).is_ok());
        assert_eq!(
            IdentityString::new("a".repeat(MAX_IDENTITY_STRING_LEN + 1)),
            Err(ErrorDetail::InvalidIdentity)
        );
    }

    #[test]
    fn did_round_trips() {
        let ids = [
            Identity::twitter("mock_user").unwrap(),
            Identity::github("octocat").unwrap(),
            Identity::substrate([7u8; 32]),
            Identity::evm([0xab; 20]),
        ];
        for id in ids {
            let did = id.to_did();
            assert_eq!(Identity::from_did(&did).unwrap(), id, "{did}");
        }
        assert_eq!(
            Identity::evm([0xab; 20]).to_did(),
            format!("did:litentry:evm:0x{}", "ab".repeat(20))
        );
    }

    #[test]
    fn did_rejects_bad_input() {
        assert_eq!(Identity::from_did("did:other:evm:0x00"), Err(ErrorDetail::ParseError));
        assert_eq!(Identity::from_did("did:litentry:evm:0x00"), Err(ErrorDetail::ParseError));
        assert_eq!(Identity::from_did("did:litentry:fax:123"), Err(ErrorDetail::ParseError));
    }

    #[test]
    fn serde_uses_hex_for_addresses() {
        let id = Identity::evm([0x11; 20]);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!(r#"{{"Evm":"{}"}}"#, "11".repeat(20)));
        let back: Identity = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn oversized_handle_is_rejected_on_decode() {
        let json = format!(r#"{{"Twitter":"{}"}}"#, "x".repeat(65));
        assert!(serde_json::from_str::<Identity>(&json).is_err());
    }

    #[test]
    fn networks_are_deduplicated_and_family_checked() {
        let sub = Identity::substrate([1u8; 32]);
        let set = Web3Networks::for_identity(
            &sub,
            vec![Web3Network::Litentry, Web3Network::Polkadot, Web3Network::Litentry],
        )
        .unwrap();
        assert_eq!(set.as_slice(), &[Web3Network::Litentry, Web3Network::Polkadot]);

        assert_eq!(
            Web3Networks::for_identity(&sub, vec![Web3Network::Ethereum]),
            Err(ErrorDetail::Web3NetworkOutOfBounds)
        );

        let evm = Identity::evm([2u8; 20]);
        assert!(Web3Networks::for_identity(&evm, vec![Web3Network::Ethereum, Web3Network::Bsc]).is_ok());
    }

    #[test]
    fn social_identities_take_no_networks() {
        let tw = Identity::twitter("bob").unwrap();
        assert!(Web3Networks::for_identity(&tw, vec![]).unwrap().is_empty());
        assert_eq!(
            Web3Networks::for_identity(&tw, vec![Web3Network::Polkadot]),
            Err(ErrorDetail::Web3NetworkOutOfBounds)
        );
    }

    #[test]
    fn repeated_networks_collapse_before_bound() {
        let list = vec![Web3Network::Polkadot; MAX_WEB3_NETWORKS + 1];
        let networks = Web3Networks::try_from(list).unwrap();
        assert_eq!(networks.as_slice(), &[Web3Network::Polkadot]);
    }
}
