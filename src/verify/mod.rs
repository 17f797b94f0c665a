// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Identity Verification
//!
//! Checks that link evidence proves ownership of an identity.
//!
//! ## Flow
//!
//! 1. The evidence kind must match the identity kind (`InvalidIdentity`).
//! 2. The expected challenge is derived from `(who, identity, code)`.
//! 3. Chain identities verify a signature over the challenge locally.
//!    Social identities resolve the referenced post through the data
//!    provider, bounded by a timeout, and check its author and content.
//!
//! Every failure is a categorical [`ErrorDetail`]; provider failures and
//! timeouts become `DataProviderError` and never abort the call pipeline.

pub mod challenge;
pub mod validation;
pub mod web2;
pub mod web3;

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

pub use challenge::{challenge, ChallengeCode, CHALLENGE_DOMAIN};
pub use validation::{
    ensure_compatible, ValidationData, Web2ValidationData, Web3ValidationData,
};
pub use web2::{check_post, DataProviderError, NoDataProvider, Web2EvidenceResolver, Web2Post};
pub use web3::{verify_web3, BYTES_PREFIX, BYTES_SUFFIX};

use crate::error::ErrorDetail;
use crate::identity::Identity;

/// Default bound on a Web2 evidence lookup.
pub const DEFAULT_WEB2_LOOKUP_TIMEOUT: Duration = Duration::from_secs(5);

/// Verifies link evidence for every identity kind.
#[derive(Clone)]
pub struct IdentityVerifier {
    resolver: Arc<dyn Web2EvidenceResolver>,
    lookup_timeout: Duration,
}

impl IdentityVerifier {
    pub fn new(resolver: Arc<dyn Web2EvidenceResolver>, lookup_timeout: Duration) -> Self {
        Self {
            resolver,
            lookup_timeout,
        }
    }

    /// Verify `validation` proves `who` owns `identity` at challenge `code`.
    ///
    /// # Arguments
    ///
    /// * `who` - The account linking the identity
    /// * `identity` - The identity being linked
    /// * `code` - Current challenge code of the `(who, identity)` pair
    /// * `validation` - The submitted evidence
    pub async fn verify(
        &self,
        who: &Identity,
        identity: &Identity,
        code: ChallengeCode,
        validation: &ValidationData,
    ) -> Result<(), ErrorDetail> {
        ensure_compatible(identity, validation)?;
        let expected = challenge(who, identity, code);
        debug!(who = %who, identity = %identity, code, "verifying link evidence");

        match validation {
            ValidationData::Web3(data) => verify_web3(identity, &expected, data),
            ValidationData::Web2(data) => self.verify_web2(identity, &expected, data).await,
        }
    }

    async fn verify_web2(
        &self,
        identity: &Identity,
        expected: &[u8],
        data: &Web2ValidationData,
    ) -> Result<(), ErrorDetail> {
        data.ensure_well_formed()?;

        let post = match tokio::time::timeout(self.lookup_timeout, self.resolver.resolve(data)).await
        {
            Ok(Ok(post)) => post,
            Ok(Err(e)) => {
                warn!(identity = %identity, error = %e, "web2 evidence lookup failed");
                return Err(ErrorDetail::DataProviderError(e.to_string()));
            }
            Err(_) => {
                warn!(
                    identity = %identity,
                    timeout_ms = self.lookup_timeout.as_millis() as u64,
                    "web2 evidence lookup timed out"
                );
                return Err(ErrorDetail::DataProviderError(
                    "evidence lookup timed out".to_string(),
                ));
            }
        };

        check_post(identity, expected, &post)
    }
}

impl std::fmt::Debug for IdentityVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityVerifier")
            .field("lookup_timeout", &self.lookup_timeout)
            .finish_non_exhaustive()
    }
}
