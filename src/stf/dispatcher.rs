// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Trusted call dispatch.
//!
//! ## Calls
//!
//! | Call | Effect | Failure event |
//! |------|--------|---------------|
//! | `set_user_shielding_key` | store or replace the key; first call creates the prime entry | `SetUserShieldingKeyFailed` |
//! | `link_identity` | verify evidence, append an active entry | `LinkIdentityFailed` |
//! | `deactivate_identity` | mark inactive | `DeactivateIdentityFailed` |
//! | `activate_identity` | mark active | `ActivateIdentityFailed` |
//! | `remove_identity` | drop a non-prime entry | `RemoveIdentityFailed` |
//! | `set_identity_networks` | replace a chain entry's networks | `SetIdentityNetworksFailed` |
//!
//! ## Link check order
//!
//! Key present → evidence kind matches identity → networks valid →
//! evidence verifies → not already linked → graph below its bound.
//!
//! ## Atomicity
//!
//! Mutations run on a copy of the graph. The copy replaces the account's
//! graph only after the outcome has been sealed, so a rejected call never
//! leaves a partial change behind.

use std::sync::Arc;

use tracing::{error, info, warn};

use super::call::{CallAction, TrustedCall};
use super::getter::{GetterOutput, TrustedGetter};
use super::outcome::CallOutcome;
use crate::auth::Principal;
use crate::crypto::{AesOutput, ShieldingKey};
use crate::error::{ErrorDetail, StfError};
use crate::identity::{
    GraphPolicy, Identity, IdentityContext, IdentityGraph, IdentityStatus, Web3Network,
    Web3Networks,
};
use crate::parentchain::{BlockHeightOracle, BlockNumber};
use crate::state::AccountState;
use crate::vault::{encrypt_with, seal_json_with, ShieldingKeyVault};
use crate::verify::{ensure_compatible, IdentityVerifier, ValidationData};

/// Routes authorized calls to their state transitions.
#[derive(Clone)]
pub struct CallDispatcher {
    vault: Arc<ShieldingKeyVault>,
    verifier: IdentityVerifier,
    oracle: Arc<dyn BlockHeightOracle>,
    policy: GraphPolicy,
}

impl CallDispatcher {
    pub fn new(
        vault: Arc<ShieldingKeyVault>,
        verifier: IdentityVerifier,
        oracle: Arc<dyn BlockHeightOracle>,
        policy: GraphPolicy,
    ) -> Self {
        Self {
            vault,
            verifier,
            oracle,
            policy,
        }
    }

    pub fn policy(&self) -> &GraphPolicy {
        &self.policy
    }

    /// Execute `call` for `principal` against the account's locked `state`.
    ///
    /// # Returns
    ///
    /// The success event, or the call-specific failure. `state` is left
    /// unchanged on failure.
    pub async fn dispatch(
        &self,
        principal: &Principal,
        call: TrustedCall,
        state: &mut AccountState,
    ) -> Result<CallOutcome, StfError> {
        let TrustedCall { who, action, .. } = call;
        if principal.account() != &who {
            return Err(StfError::InvalidAccount);
        }
        let name = action.name();

        let result = match action {
            CallAction::SetUserShieldingKey { key } => {
                self.set_user_shielding_key(who, &key, state)
            }
            CallAction::LinkIdentity {
                identity,
                validation,
                web3networks,
            } => {
                self.link_identity(who, identity, validation, web3networks, state)
                    .await
            }
            CallAction::DeactivateIdentity { identity } => self
                .set_status(&who, &identity, IdentityStatus::Inactive, state)
                .map(|id_graph| CallOutcome::IdentityDeactivated {
                    account: who,
                    identity,
                    id_graph,
                })
                .map_err(StfError::DeactivateIdentityFailed),
            CallAction::ActivateIdentity { identity } => self
                .set_status(&who, &identity, IdentityStatus::Active, state)
                .map(|id_graph| CallOutcome::IdentityActivated {
                    account: who,
                    identity,
                    id_graph,
                })
                .map_err(StfError::ActivateIdentityFailed),
            CallAction::RemoveIdentity { identity } => self
                .mutate(&who, state, |graph| graph.remove(&identity).map(|_| ()))
                .map(|id_graph| CallOutcome::IdentityRemoved {
                    account: who,
                    identity,
                    id_graph,
                })
                .map_err(StfError::RemoveIdentityFailed),
            CallAction::SetIdentityNetworks {
                identity,
                web3networks,
            } => self
                .set_networks(&who, &identity, web3networks, state)
                .map(|id_graph| CallOutcome::IdentityNetworksSet {
                    account: who,
                    identity,
                    id_graph,
                })
                .map_err(StfError::SetIdentityNetworksFailed),
        };

        match &result {
            Ok(_) => info!(principal = %principal, call = name, "call executed"),
            Err(e) if e.is_infrastructure() => {
                error!(principal = %principal, call = name, error = %e, "call aborted")
            }
            Err(e) => warn!(principal = %principal, call = name, error = %e, "call rejected"),
        }
        result
    }

    /// Answer a trusted getter for the account owning `state`.
    pub fn get(&self, getter: &TrustedGetter, state: &AccountState) -> Result<GetterOutput, StfError> {
        let who = getter.who();
        let missing = || StfError::GetterFailed(ErrorDetail::UserShieldingKeyNotFound);
        let key = self.vault.get(who).ok_or_else(missing)?;
        let graph = state.id_graph.as_ref().ok_or_else(missing)?;

        let sealed = match getter {
            TrustedGetter::IdGraph(_) => seal_json_with(&key, who, &graph.snapshot()),
            TrustedGetter::IdGraphStats(_) => seal_json_with(&key, who, &graph.stats()),
            TrustedGetter::UserShieldingKey(_) => encrypt_with(&key, who, key.as_bytes()),
        }
        .map_err(StfError::GetterFailed)?;
        Ok(GetterOutput::Encrypted(sealed))
    }

    fn set_user_shielding_key(
        &self,
        who: Identity,
        key: &[u8],
        state: &mut AccountState,
    ) -> Result<CallOutcome, StfError> {
        let fail = StfError::SetUserShieldingKeyFailed;
        let key = ShieldingKey::from_bytes(key).map_err(|_| fail(ErrorDetail::ImportError))?;

        // Only the first key creates the graph; later keys leave it alone.
        let created = match state.id_graph {
            Some(_) => None,
            None => Some(IdentityGraph::new(who.clone(), self.link_block()?).map_err(fail)?),
        };
        let snapshot = created
            .as_ref()
            .or(state.id_graph.as_ref())
            .map(IdentityGraph::snapshot)
            .unwrap_or_default();
        let id_graph = seal_json_with(&key, &who, &snapshot).map_err(fail)?;

        if let Some(graph) = created {
            state.id_graph = Some(graph);
        }
        self.vault.set(who.clone(), key);
        Ok(CallOutcome::UserShieldingKeySet {
            account: who,
            id_graph,
        })
    }

    async fn link_identity(
        &self,
        who: Identity,
        identity: Identity,
        validation: ValidationData,
        web3networks: Vec<Web3Network>,
        state: &mut AccountState,
    ) -> Result<CallOutcome, StfError> {
        let fail = StfError::LinkIdentityFailed;
        let mut next = self.require_graph(&who, state).map_err(fail)?.clone();
        ensure_compatible(&identity, &validation).map_err(fail)?;
        let web3networks = Web3Networks::for_identity(&identity, web3networks).map_err(fail)?;

        let code = state.challenge_code(&identity);
        self.verifier
            .verify(&who, &identity, code, &validation)
            .await
            .map_err(fail)?;

        let context = IdentityContext::new(self.link_block()?, web3networks);
        next.insert(identity.clone(), context, &self.policy)
            .map_err(fail)?;
        let id_graph = self.seal_graph(&who, &next).map_err(fail)?;

        state.id_graph = Some(next);
        state.bump_challenge_code(&identity);
        Ok(CallOutcome::IdentityLinked {
            account: who,
            identity,
            id_graph,
        })
    }

    fn set_status(
        &self,
        who: &Identity,
        identity: &Identity,
        status: IdentityStatus,
        state: &mut AccountState,
    ) -> Result<AesOutput, ErrorDetail> {
        let policy = self.policy;
        self.mutate(who, state, |graph| {
            graph
                .set_status(identity, status, &policy)
                .map_err(absent_is_invalid)
        })
    }

    fn set_networks(
        &self,
        who: &Identity,
        identity: &Identity,
        networks: Vec<Web3Network>,
        state: &mut AccountState,
    ) -> Result<AesOutput, ErrorDetail> {
        self.mutate(who, state, |graph| {
            graph
                .set_networks(identity, networks)
                .map_err(absent_is_invalid)
        })
    }

    /// Apply `f` to a copy of the graph and commit it once sealed.
    fn mutate<F>(&self, who: &Identity, state: &mut AccountState, f: F) -> Result<AesOutput, ErrorDetail>
    where
        F: FnOnce(&mut IdentityGraph) -> Result<(), ErrorDetail>,
    {
        let mut next = self.require_graph(who, state)?.clone();
        f(&mut next)?;
        let sealed = self.seal_graph(who, &next)?;
        state.id_graph = Some(next);
        Ok(sealed)
    }

    fn require_graph<'a>(
        &self,
        who: &Identity,
        state: &'a AccountState,
    ) -> Result<&'a IdentityGraph, ErrorDetail> {
        if !self.vault.contains(who) {
            return Err(ErrorDetail::UserShieldingKeyNotFound);
        }
        state
            .id_graph
            .as_ref()
            .ok_or(ErrorDetail::UserShieldingKeyNotFound)
    }

    fn seal_graph(&self, who: &Identity, graph: &IdentityGraph) -> Result<AesOutput, ErrorDetail> {
        self.vault.seal_json(who, &graph.snapshot())
    }

    fn link_block(&self) -> Result<BlockNumber, StfError> {
        match self.oracle.current_height() {
            0 => Err(StfError::Dispatch(
                "parentchain height not yet imported".to_string(),
            )),
            height => Ok(height),
        }
    }
}

fn absent_is_invalid(detail: ErrorDetail) -> ErrorDetail {
    match detail {
        ErrorDetail::IdentityNotExist => ErrorDetail::InvalidIdentity,
        other => other,
    }
}

impl std::fmt::Debug for CallDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallDispatcher")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}
