// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Link challenge construction.
//!
//! A challenge binds the requesting account, the identity being linked and
//! a per-pair code. The code advances after every successful link of the
//! pair, so evidence produced for one link can never be replayed for the
//! next.

use sha2::{Digest, Sha256};

use crate::identity::Identity;

/// Per-(account, identity) challenge counter.
pub type ChallengeCode = u32;

/// Domain separator prefixed to every challenge.
pub const CHALLENGE_DOMAIN: &[u8] = b"idgraph-link";

/// Expected challenge for `who` linking `identity` at `code`.
pub fn challenge(who: &Identity, identity: &Identity, code: ChallengeCode) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(CHALLENGE_DOMAIN);
    hasher.update(code.to_le_bytes());
    hasher.update(who.to_did().as_bytes());
    hasher.update([0u8]);
    hasher.update(identity.to_did().as_bytes());
    hasher.finalize().into()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> Identity {
        Identity::substrate([1u8; 32])
    }

    #[test]
    fn challenge_is_deterministic() {
        let bob = Identity::evm([2u8; 20]);
        assert_eq!(challenge(&alice(), &bob, 0), challenge(&alice(), &bob, 0));
    }

    #[test]
    fn challenge_binds_every_input() {
        let bob = Identity::evm([2u8; 20]);
        let carol = Identity::twitter("carol").unwrap();
        let base = challenge(&alice(), &bob, 0);

        assert_ne!(base, challenge(&alice(), &bob, 1));
        assert_ne!(base, challenge(&alice(), &carol, 0));
        assert_ne!(base, challenge(&Identity::substrate([9u8; 32]), &bob, 0));
        assert_ne!(base, challenge(&bob, &alice(), 0));
    }
}
