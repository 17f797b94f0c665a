// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # State Transition Function
//!
//! Calls, getters, their outcomes and the dispatcher that executes them.
//!
//! - `call` - `TrustedCall`, `TrustedCallSigned`, `TrustedOperation`
//! - `getter` - public and trusted getters
//! - `outcome` - success events
//! - `dispatcher` - the call state machine

pub mod call;
pub mod dispatcher;
pub mod getter;
pub mod outcome;

pub use call::{CallAction, TrustedCall, TrustedCallSigned, TrustedOperation};
pub use dispatcher::CallDispatcher;
pub use getter::{Getter, GetterOutput, PublicGetter, TrustedGetter, TrustedGetterSigned};
pub use outcome::CallOutcome;
