// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Identity Model
//!
//! External identities (social handles, chain addresses), the metadata
//! recorded when they are linked, and the per-account identity graph.

pub mod context;
pub mod graph;
pub mod types;

pub use context::{IdentityContext, IdentityStatus};
pub use graph::{GraphPolicy, IdGraphSnapshot, IdGraphStats, IdentityGraph, DEFAULT_MAX_ID_GRAPH_LEN};
pub use types::{
    Address20, Address32, Identity, IdentityString, Web3Network, Web3Networks,
    MAX_IDENTITY_STRING_LEN, MAX_WEB3_NETWORKS,
};
