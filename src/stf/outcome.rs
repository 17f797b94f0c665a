// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Success events of trusted calls.
//!
//! Every event carries the account's graph as it stands after the call,
//! encrypted under the account's shielding key.

use serde::{Deserialize, Serialize};

use crate::crypto::AesOutput;
use crate::identity::Identity;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CallOutcome {
    UserShieldingKeySet {
        account: Identity,
        id_graph: AesOutput,
    },
    IdentityLinked {
        account: Identity,
        identity: Identity,
        id_graph: AesOutput,
    },
    IdentityDeactivated {
        account: Identity,
        identity: Identity,
        id_graph: AesOutput,
    },
    IdentityActivated {
        account: Identity,
        identity: Identity,
        id_graph: AesOutput,
    },
    IdentityRemoved {
        account: Identity,
        identity: Identity,
        id_graph: AesOutput,
    },
    IdentityNetworksSet {
        account: Identity,
        identity: Identity,
        id_graph: AesOutput,
    },
}

impl CallOutcome {
    pub fn account(&self) -> &Identity {
        match self {
            CallOutcome::UserShieldingKeySet { account, .. }
            | CallOutcome::IdentityLinked { account, .. }
            | CallOutcome::IdentityDeactivated { account, .. }
            | CallOutcome::IdentityActivated { account, .. }
            | CallOutcome::IdentityRemoved { account, .. }
            | CallOutcome::IdentityNetworksSet { account, .. } => account,
        }
    }

    /// The encrypted post-call graph.
    pub fn id_graph(&self) -> &AesOutput {
        match self {
            CallOutcome::UserShieldingKeySet { id_graph, .. }
            | CallOutcome::IdentityLinked { id_graph, .. }
            | CallOutcome::IdentityDeactivated { id_graph, .. }
            | CallOutcome::IdentityActivated { id_graph, .. }
            | CallOutcome::IdentityRemoved { id_graph, .. }
            | CallOutcome::IdentityNetworksSet { id_graph, .. } => id_graph,
        }
    }
}
