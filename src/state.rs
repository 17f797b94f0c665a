// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Per-account state with exclusive access per account.
//!
//! Each account owns one [`AccountState`] behind its own async mutex. A call
//! holds its account's lock from authorization until its response is
//! sealed, so calls for one account run strictly in sequence while calls
//! for different accounts never contend.

use std::collections::HashMap;
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::identity::{Identity, IdentityGraph};
use crate::verify::ChallengeCode;

/// State owned by a single account.
#[derive(Debug, Default)]
pub struct AccountState {
    /// Created together with the account's first shielding key.
    pub id_graph: Option<IdentityGraph>,
    challenge_codes: HashMap<Identity, ChallengeCode>,
}

impl AccountState {
    /// Current challenge code for linking `identity`.
    pub fn challenge_code(&self, identity: &Identity) -> ChallengeCode {
        self.challenge_codes.get(identity).copied().unwrap_or_default()
    }

    /// Whether the account holds nothing worth keeping.
    pub fn is_vacant(&self) -> bool {
        self.id_graph.is_none() && self.challenge_codes.is_empty()
    }

    /// Advance the challenge code after a successful link.
    pub fn bump_challenge_code(&mut self, identity: &Identity) {
        let code = self.challenge_codes.entry(identity.clone()).or_default();
        *code = code.wrapping_add(1);
    }
}

/// Exclusive guard over one account's state.
pub type AccountGuard = OwnedMutexGuard<AccountState>;

/// Sharded arena of account states.
#[derive(Debug, Default)]
pub struct AccountShards {
    shards: DashMap<Identity, Arc<Mutex<AccountState>>>,
}

impl AccountShards {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lock `who`'s state, creating it empty on first use.
    pub async fn lock(&self, who: &Identity) -> AccountGuard {
        // The map guard is released before awaiting the account lock.
        let shard = Arc::clone(self.shards.entry(who.clone()).or_default().value());
        shard.lock_owned().await
    }

    /// Lock `who`'s state only if the account has been seen before.
    pub async fn lock_existing(&self, who: &Identity) -> Option<AccountGuard> {
        let shard = self.shards.get(who).map(|s| Arc::clone(s.value()))?;
        Some(shard.lock_owned().await)
    }

    /// Release `guard` and drop `who`'s shard if it is still vacant.
    ///
    /// A shard another task holds or waits on is kept.
    pub fn release_if_vacant(&self, who: &Identity, guard: AccountGuard) {
        if !guard.is_vacant() {
            return;
        }
        drop(guard);
        // Waiters hold a clone of the shard, so a count of one means the map's
        // reference is the only one left.
        self.shards.remove_if(who, |_, shard| {
            Arc::strong_count(shard) == 1
                && shard.try_lock().map(|s| s.is_vacant()).unwrap_or(false)
        });
    }

    pub fn len(&self) -> usize {
        self.shards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shards.is_empty()
    }
}
