// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! IDGraph Enclave - Confidential Identity-Linking & Verification Core
//!
//! Runs inside a trusted-execution enclave. Users prove ownership of
//! external identities (social handles, chain addresses) and the enclave
//! records them in a per-account identity graph that only the user can
//! read.
//!
//! ## Modules
//!
//! - `auth` - call authorization and replay protection
//! - `config` - environment configuration
//! - `crypto` - shielding keys, enclave key and signature schemes
//! - `error` - call failure taxonomy
//! - `host` - line-delimited JSON channel to the host
//! - `identity` - identities and the identity graph
//! - `parentchain` - parentchain height oracle
//! - `rpc` - request and response envelopes
//! - `state` - per-account state shards
//! - `stf` - trusted calls, getters and the call dispatcher
//! - `vault` - user shielding key vault
//! - `verify` - ownership proof verification
//! - `worker` - end-to-end request pipeline

pub mod auth;
pub mod config;
pub mod crypto;
pub mod error;
pub mod host;
pub mod identity;
pub mod parentchain;
pub mod rpc;
pub mod state;
pub mod stf;
pub mod vault;
pub mod verify;
pub mod worker;

#[cfg(test)]
mod test_utils;
