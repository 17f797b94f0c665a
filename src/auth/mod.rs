// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authorization Module
//!
//! Decides who a decrypted call runs as before it reaches the dispatcher.
//!
//! ## Auth Flow
//!
//! 1. Verify the outer signature against the call's declared signer
//! 2. Resolve the principal:
//!    - direct call → `User(who)`, signer must be `who`
//!    - indirect call → `EnclaveRelay(who)`, signer must be the enclave signer
//! 3. Check and consume the principal's nonce, under the account lock
//!
//! ## Security
//!
//! - A forged signature never consumes a nonce
//! - Nonce check-and-increment is atomic per principal
//! - Steps 1 and 2 touch no state, so forged calls never reach the account
//!   lock
//! - The caller holds the account's state lock from the nonce check through
//!   dispatch, so authorized calls for one account never interleave

pub mod authorizer;
pub mod nonce;
pub mod principal;

pub use authorizer::{CallAuthorizer, CallShape};
pub use nonce::{InMemoryNonceStore, NonceStore};
pub use principal::Principal;
