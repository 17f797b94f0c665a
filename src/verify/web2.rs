// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Social-platform evidence.
//!
//! The user posts the hex challenge from the handle being linked and submits
//! a reference to the post. Fetching the post is delegated to a
//! [`Web2EvidenceResolver`]; this module only judges what comes back.

use async_trait::async_trait;

use super::validation::Web2ValidationData;
use crate::error::ErrorDetail;
use crate::identity::Identity;

/// A resolved social-platform post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Web2Post {
    pub author_handle: String,
    pub content: String,
}

#[derive(Debug, thiserror::Error)]
pub enum DataProviderError {
    #[error("post not found")]
    NotFound,

    #[error("data provider unavailable: {0}")]
    Unavailable(String),
}

/// Looks up the post an evidence reference points at.
#[async_trait]
pub trait Web2EvidenceResolver: Send + Sync {
    async fn resolve(&self, evidence: &Web2ValidationData) -> Result<Web2Post, DataProviderError>;
}

/// Resolver for deployments without a data provider. Every lookup fails.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoDataProvider;

#[async_trait]
impl Web2EvidenceResolver for NoDataProvider {
    async fn resolve(&self, _evidence: &Web2ValidationData) -> Result<Web2Post, DataProviderError> {
        Err(DataProviderError::Unavailable(
            "no data provider configured".to_string(),
        ))
    }
}

/// Check `post` was written by `identity` and carries the hex challenge.
///
/// Handles compare case-insensitively, ignoring a leading `@`.
pub fn check_post(identity: &Identity, expected: &[u8], post: &Web2Post) -> Result<(), ErrorDetail> {
    let handle = identity.handle().ok_or(ErrorDetail::InvalidIdentity)?;
    let author = post.author_handle.trim_start_matches('@');
    if !author.eq_ignore_ascii_case(handle.trim_start_matches('@')) {
        return Err(ErrorDetail::WrongWeb2Handle);
    }
    if !post.content.to_ascii_lowercase().contains(&hex::encode(expected)) {
        return Err(ErrorDetail::UnexpectedMessage);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post(author: &str, content: &str) -> Web2Post {
        Web2Post {
            author_handle: author.to_string(),
            content: content.to_string(),
        }
    }

    #[test]
    fn matching_post_passes() {
        let alice = Identity::twitter("Alice").unwrap();
        let content = format!("verifying my account: {}", hex::encode([0xab; 4]));
        assert_eq!(check_post(&alice, &[0xab; 4], &post("@alice", &content)), Ok(()));
    }

    #[test]
    fn other_author_is_wrong_handle() {
        let alice = Identity::twitter("alice").unwrap();
        let content = hex::encode([1u8; 4]);
        assert_eq!(
            check_post(&alice, &[1u8; 4], &post("mallory", &content)),
            Err(ErrorDetail::WrongWeb2Handle)
        );
    }

    #[test]
    fn missing_challenge_is_unexpected_message() {
        let alice = Identity::discord("alice").unwrap();
        assert_eq!(
            check_post(&alice, &[1u8; 4], &post("alice", "hello")),
            Err(ErrorDetail::UnexpectedMessage)
        );
    }

    #[tokio::test]
    async fn no_data_provider_always_fails() {
        let evidence = Web2ValidationData::Twitter {
            tweet_id: "1".to_string(),
        };
        assert!(matches!(
            NoDataProvider.resolve(&evidence).await,
            Err(DataProviderError::Unavailable(_))
        ));
    }
}
