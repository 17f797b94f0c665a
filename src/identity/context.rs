// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Per-identity link metadata.

use serde::{Deserialize, Serialize};

use super::Web3Networks;
use crate::parentchain::BlockNumber;

/// Lifecycle status of a linked identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum IdentityStatus {
    #[default]
    Active,
    Inactive,
}

/// Metadata recorded alongside each linked identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityContext {
    /// Parentchain height at link time (always > 0).
    pub link_block: BlockNumber,
    pub web3networks: Web3Networks,
    pub status: IdentityStatus,
}

impl IdentityContext {
    /// A freshly linked, active context.
    pub fn new(link_block: BlockNumber, web3networks: Web3Networks) -> Self {
        Self {
            link_block,
            web3networks,
            status: IdentityStatus::Active,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == IdentityStatus::Active
    }

    pub fn activate(&mut self) {
        self.status = IdentityStatus::Active;
    }

    pub fn deactivate(&mut self) {
        self.status = IdentityStatus::Inactive;
    }
}
