// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authorized principals.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::identity::Identity;

/// Who a call was authorized as.
///
/// ## Variants
///
/// - `User` - the account signed the call with its own key
/// - `EnclaveRelay` - the enclave signer re-signed a call it decrypted on
///   the account's behalf
///
/// The two carry separate nonce counters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Principal {
    User(Identity),
    EnclaveRelay(Identity),
}

impl Principal {
    /// The account the principal acts on.
    pub fn account(&self) -> &Identity {
        match self {
            Principal::User(who) | Principal::EnclaveRelay(who) => who,
        }
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Principal::User(who) => write!(f, "user:{who}"),
            Principal::EnclaveRelay(who) => write!(f, "relay:{who}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn principals_for_same_account_are_distinct() {
        let who = Identity::evm([1u8; 20]);
        let user = Principal::User(who.clone());
        let relay = Principal::EnclaveRelay(who.clone());

        assert_ne!(user, relay);
        assert_eq!(user.account(), relay.account());
    }

    #[test]
    fn display_prefixes_kind() {
        let who = Identity::twitter("alice").unwrap();
        assert_eq!(
            Principal::EnclaveRelay(who).to_string(),
            "relay:did:litentry:twitter:alice"
        );
    }
}
