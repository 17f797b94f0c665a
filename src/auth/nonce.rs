// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Replay protection.
//!
//! Every principal has a counter starting at zero. A call is accepted only
//! with the counter's current value, which then advances by one.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use super::Principal;
use crate::error::{Index, StfError};

/// Per-principal nonce counters.
pub trait NonceStore: Send + Sync {
    /// The nonce the next call from `principal` must carry.
    fn next(&self, principal: &Principal) -> Index;

    /// Accept `nonce` for `principal` and advance the counter, atomically.
    ///
    /// # Errors
    ///
    /// `InvalidNonce(expected, actual)` when `nonce` is not the next value.
    fn try_consume(&self, principal: &Principal, nonce: Index) -> Result<(), StfError>;
}

#[derive(Debug, Default)]
pub struct InMemoryNonceStore {
    nonces: DashMap<Principal, Index>,
}

impl InMemoryNonceStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl NonceStore for InMemoryNonceStore {
    fn next(&self, principal: &Principal) -> Index {
        self.nonces.get(principal).map(|n| *n).unwrap_or_default()
    }

    fn try_consume(&self, principal: &Principal, nonce: Index) -> Result<(), StfError> {
        // The entry holds the shard write lock until it is dropped.
        match self.nonces.entry(principal.clone()) {
            Entry::Occupied(mut entry) => {
                let expected = *entry.get();
                if nonce != expected {
                    return Err(StfError::InvalidNonce(expected, nonce));
                }
                let next = expected
                    .checked_add(1)
                    .ok_or_else(|| StfError::Dispatch("nonce space exhausted".to_string()))?;
                entry.insert(next);
            }
            Entry::Vacant(entry) => {
                if nonce != 0 {
                    return Err(StfError::InvalidNonce(0, nonce));
                }
                entry.insert(1);
            }
        }
        Ok(())
    }
}
