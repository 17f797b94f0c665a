// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Parentchain height oracle.
//!
//! Link heights come from the parentchain the enclave follows. Block import
//! is handled outside this crate; it only needs the latest imported height.

use std::sync::atomic::{AtomicU32, Ordering};

/// Parentchain block height.
pub type BlockNumber = u32;

/// Source of the current parentchain height.
pub trait BlockHeightOracle: Send + Sync {
    fn current_height(&self) -> BlockNumber;
}

/// Height updated by the block importer.
#[derive(Debug, Default)]
pub struct ImportedHeight {
    height: AtomicU32,
}

impl ImportedHeight {
    pub fn new(height: BlockNumber) -> Self {
        Self {
            height: AtomicU32::new(height),
        }
    }

    /// Record a newly imported block. Heights never move backwards.
    pub fn import(&self, height: BlockNumber) {
        self.height.fetch_max(height, Ordering::AcqRel);
    }
}

impl BlockHeightOracle for ImportedHeight {
    fn current_height(&self) -> BlockNumber {
        self.height.load(Ordering::Acquire)
    }
}
