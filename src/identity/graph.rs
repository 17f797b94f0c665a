// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Per-account identity graph.
//!
//! ## Invariants
//!
//! - The first entry is the prime identity. It is a chain identity, always
//!   active unless policy allows otherwise, and can never be removed.
//! - No identity appears twice.
//! - The graph never grows past [`GraphPolicy::max_len`] entries; inserts
//!   past the bound are rejected, never truncated.
//! - Only chain identities carry networks, and only from their own family.
//!
//! Every operation validates fully before mutating, so a rejected operation
//! leaves the graph untouched.

use serde::{Deserialize, Serialize};

use super::{Identity, IdentityContext, IdentityStatus, Web3Network, Web3Networks};
use crate::error::ErrorDetail;
use crate::parentchain::BlockNumber;

/// Default maximum number of entries in a graph, prime included.
pub const DEFAULT_MAX_ID_GRAPH_LEN: usize = 64;

/// Tunables applied to graph mutations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GraphPolicy {
    pub max_len: usize,
    pub allow_prime_deactivation: bool,
}

impl Default for GraphPolicy {
    fn default() -> Self {
        Self {
            max_len: DEFAULT_MAX_ID_GRAPH_LEN,
            allow_prime_deactivation: false,
        }
    }
}

/// Ordered `(identity, context)` pairs, as returned to clients.
pub type IdGraphSnapshot = Vec<(Identity, IdentityContext)>;

/// Summary counts over a graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct IdGraphStats {
    pub total: u32,
    pub active: u32,
    pub inactive: u32,
    pub web2: u32,
    pub web3: u32,
}

/// Identity graph owned by a single account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IdentityGraph {
    entries: Vec<(Identity, IdentityContext)>,
}

impl IdentityGraph {
    /// Create a graph anchored on `prime`, linked at `link_block`.
    pub fn new(prime: Identity, link_block: BlockNumber) -> Result<Self, ErrorDetail> {
        if !prime.is_web3() {
            return Err(ErrorDetail::InvalidIdentity);
        }
        ensure_link_block(link_block)?;
        Ok(Self {
            entries: vec![(prime, IdentityContext::new(link_block, Web3Networks::new()))],
        })
    }

    pub fn prime(&self) -> &Identity {
        // `new` always seeds the prime entry and `remove` refuses to drop it.
        &self.entries[0].0
    }

    pub fn is_prime(&self, identity: &Identity) -> bool {
        self.prime() == identity
    }

    pub fn get(&self, identity: &Identity) -> Option<&IdentityContext> {
        self.position(identity).map(|i| &self.entries[i].1)
    }

    pub fn contains(&self, identity: &Identity) -> bool {
        self.position(identity).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &(Identity, IdentityContext)> {
        self.entries.iter()
    }

    /// Append a newly linked identity.
    pub fn insert(
        &mut self,
        identity: Identity,
        context: IdentityContext,
        policy: &GraphPolicy,
    ) -> Result<(), ErrorDetail> {
        if self.contains(&identity) {
            return Err(ErrorDetail::IdentityAlreadyLinked);
        }
        if self.entries.len() >= policy.max_len {
            return Err(ErrorDetail::IdGraphLenLimitReached);
        }
        ensure_link_block(context.link_block)?;
        ensure_networks(&identity, &context.web3networks)?;

        self.entries.push((identity, context));
        Ok(())
    }

    /// Remove a non-prime identity, returning its context.
    pub fn remove(&mut self, identity: &Identity) -> Result<IdentityContext, ErrorDetail> {
        if self.is_prime(identity) {
            return Err(ErrorDetail::RemovePrimeIdentityDisallowed);
        }
        let index = self
            .position(identity)
            .ok_or(ErrorDetail::IdentityNotExist)?;
        Ok(self.entries.remove(index).1)
    }

    /// Flip the status of an identity. Setting the current status is a no-op.
    pub fn set_status(
        &mut self,
        identity: &Identity,
        status: IdentityStatus,
        policy: &GraphPolicy,
    ) -> Result<(), ErrorDetail> {
        let index = self
            .position(identity)
            .ok_or(ErrorDetail::IdentityNotExist)?;
        if index == 0 && status == IdentityStatus::Inactive && !policy.allow_prime_deactivation {
            return Err(ErrorDetail::DeactivatePrimeIdentityDisallowed);
        }

        let context = &mut self.entries[index].1;
        match status {
            IdentityStatus::Active => context.activate(),
            IdentityStatus::Inactive => context.deactivate(),
        }
        Ok(())
    }

    /// Replace the network set of a chain identity.
    pub fn set_networks(
        &mut self,
        identity: &Identity,
        networks: Vec<Web3Network>,
    ) -> Result<(), ErrorDetail> {
        let index = self
            .position(identity)
            .ok_or(ErrorDetail::IdentityNotExist)?;
        if !identity.is_web3() {
            return Err(ErrorDetail::InvalidIdentity);
        }
        let networks = Web3Networks::for_identity(identity, networks)?;
        self.entries[index].1.web3networks = networks;
        Ok(())
    }

    pub fn snapshot(&self) -> IdGraphSnapshot {
        self.entries.clone()
    }

    pub fn stats(&self) -> IdGraphStats {
        let mut stats = IdGraphStats::default();
        for (identity, context) in &self.entries {
            stats.total += 1;
            if context.is_active() {
                stats.active += 1;
            } else {
                stats.inactive += 1;
            }
            if identity.is_web2() {
                stats.web2 += 1;
            } else {
                stats.web3 += 1;
            }
        }
        stats
    }

    fn position(&self, identity: &Identity) -> Option<usize> {
        self.entries.iter().position(|(id, _)| id == identity)
    }
}

fn ensure_link_block(link_block: BlockNumber) -> Result<(), ErrorDetail> {
    if link_block == 0 {
        return Err(ErrorDetail::StfError("link block must be non-zero".to_string()));
    }
    Ok(())
}

fn ensure_networks(identity: &Identity, networks: &Web3Networks) -> Result<(), ErrorDetail> {
    if networks.iter().all(|n| identity.supports_network(*n)) {
        Ok(())
    } else {
        Err(ErrorDetail::Web3NetworkOutOfBounds)
    }
}
