// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Keypairs, evidence builders and collaborator doubles for tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use alloy::signers::local::PrivateKeySigner;
use alloy::signers::SignerSync;
use async_trait::async_trait;
use ed25519_dalek::Signer;
use rand::rngs::OsRng;
use serde::de::DeserializeOwned;

use crate::crypto::{
    AesOutput, MultiSignature, ShieldingKey, Signature64, Signature65, SR25519_SIGNING_CONTEXT,
};
use crate::identity::Identity;
use crate::verify::{
    DataProviderError, ValidationData, Web2EvidenceResolver, Web2Post, Web2ValidationData,
    Web3ValidationData, BYTES_PREFIX, BYTES_SUFFIX,
};

enum SubstrateScheme {
    Ed25519(ed25519_dalek::SigningKey),
    Sr25519(schnorrkel::Keypair),
}

/// A Substrate account keypair.
pub struct SubstrateKey(SubstrateScheme);

impl SubstrateKey {
    pub fn ed25519() -> Self {
        Self(SubstrateScheme::Ed25519(ed25519_dalek::SigningKey::generate(
            &mut OsRng,
        )))
    }

    pub fn sr25519() -> Self {
        Self(SubstrateScheme::Sr25519(schnorrkel::Keypair::generate_with(
            OsRng,
        )))
    }

    pub fn identity(&self) -> Identity {
        match &self.0 {
            SubstrateScheme::Ed25519(key) => Identity::substrate(key.verifying_key().to_bytes()),
            SubstrateScheme::Sr25519(pair) => Identity::substrate(pair.public.to_bytes()),
        }
    }

    pub fn sign(&self, msg: &[u8]) -> MultiSignature {
        match &self.0 {
            SubstrateScheme::Ed25519(key) => {
                MultiSignature::Ed25519(Signature64(key.sign(msg).to_bytes()))
            }
            SubstrateScheme::Sr25519(pair) => MultiSignature::Sr25519(Signature64(
                pair.sign_simple(SR25519_SIGNING_CONTEXT, msg).to_bytes(),
            )),
        }
    }
}

/// An EVM account keypair.
pub struct EvmKey(PrivateKeySigner);

impl EvmKey {
    pub fn random() -> Self {
        Self(PrivateKeySigner::random())
    }

    pub fn address(&self) -> [u8; 20] {
        let mut address = [0u8; 20];
        address.copy_from_slice(self.0.address().as_slice());
        address
    }

    pub fn identity(&self) -> Identity {
        Identity::evm(self.address())
    }

    /// EIP-191 personal-sign over `msg`.
    pub fn personal_sign(&self, msg: &[u8]) -> MultiSignature {
        let sig = self
            .0
            .sign_message_sync(msg)
            .expect("local signing never fails");
        MultiSignature::Ethereum(Signature65(sig.as_bytes()))
    }
}

/// Decrypt and decode a JSON payload sealed under `key`.
pub fn open<T: DeserializeOwned>(key: &ShieldingKey, output: &AesOutput) -> T {
    let plaintext = key.decrypt(output).expect("payload decrypts under key");
    serde_json::from_slice(&plaintext).expect("payload decodes")
}

/// Substrate evidence signing the challenge directly.
pub fn substrate_evidence(key: &SubstrateKey, challenge: &[u8]) -> ValidationData {
    ValidationData::Web3(Web3ValidationData::Substrate {
        message: challenge.to_vec(),
        signature: key.sign(challenge),
    })
}

/// Substrate evidence signed through a browser extension's `<Bytes>` envelope.
pub fn substrate_evidence_wrapped(key: &SubstrateKey, challenge: &[u8]) -> ValidationData {
    let mut wrapped = BYTES_PREFIX.to_vec();
    wrapped.extend_from_slice(challenge);
    wrapped.extend_from_slice(BYTES_SUFFIX);
    ValidationData::Web3(Web3ValidationData::Substrate {
        message: challenge.to_vec(),
        signature: key.sign(&wrapped),
    })
}

pub fn evm_evidence(key: &EvmKey, challenge: &[u8]) -> ValidationData {
    ValidationData::Web3(Web3ValidationData::Evm {
        message: challenge.to_vec(),
        signature: key.personal_sign(challenge),
    })
}

pub fn tweet_evidence(tweet_id: &str) -> ValidationData {
    ValidationData::Web2(Web2ValidationData::Twitter {
        tweet_id: tweet_id.to_string(),
    })
}

/// Web2 resolver backed by a fixed set of posts, keyed by the post reference.
#[derive(Default)]
pub struct StaticResolver {
    posts: Mutex<HashMap<String, Web2Post>>,
    delay: Option<Duration>,
}

impl StaticResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolver that stalls for `delay` before answering.
    pub fn slow(delay: Duration) -> Self {
        Self {
            posts: Mutex::default(),
            delay: Some(delay),
        }
    }

    pub fn publish(&self, reference: &str, author_handle: &str, content: String) {
        self.posts.lock().expect("resolver lock").insert(
            reference.to_string(),
            Web2Post {
                author_handle: author_handle.to_string(),
                content,
            },
        );
    }
}

#[async_trait]
impl Web2EvidenceResolver for StaticResolver {
    async fn resolve(&self, evidence: &Web2ValidationData) -> Result<Web2Post, DataProviderError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let reference = match evidence {
            Web2ValidationData::Twitter { tweet_id } => tweet_id.clone(),
            Web2ValidationData::Discord { message_id, .. } => message_id.clone(),
        };
        self.posts
            .lock()
            .expect("resolver lock")
            .get(&reference)
            .cloned()
            .ok_or(DataProviderError::NotFound)
    }
}
