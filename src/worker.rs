// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Request Pipeline
//!
//! ```text
//! Request ─► decrypt (enclave key) ─► decode TrustedOperation
//!         ─► authenticate ─► lock account ─► consume nonce ─► dispatch
//!         ─► seal outcome ─► RpcReturnValue
//! ```
//!
//! An account shard that is still vacant after a rejected call is released,
//! so rejected requests never leave state behind.
//!
//! ## Responses
//!
//! | Operation | Success | Failure |
//! |-----------|---------|---------|
//! | Direct / indirect call | sealed `CallOutcome`, `TrustedOperationStatus(Finalized, hash)` | plaintext `StfError`, `Error` |
//! | Public getter | plaintext `GetterOutput`, `Ok` | plaintext `StfError`, `Error` |
//! | Trusted getter | `GetterOutput::Encrypted`, `Ok` | plaintext `StfError`, `Error` |
//!
//! Calls run to completion before the response is returned, so the status
//! of a successful call is always terminal.
//!
//! ## Relayed calls
//!
//! [`Worker::relay_indirect`] takes an unsigned call encrypted to the
//! enclave by `sender`, re-signs it with the enclave signer under the
//! `EnclaveRelay(sender)` nonce and executes it as an indirect call.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, error, info};

use crate::auth::{CallAuthorizer, CallShape, InMemoryNonceStore, Principal};
use crate::config::CoreConfig;
use crate::crypto::{EnclaveKeyService, EnclavePublicKey, EnclaveSigner};
use crate::error::{ErrorDetail, StfError};
use crate::identity::Identity;
use crate::parentchain::BlockHeightOracle;
use crate::rpc::{Request, RpcReturnValue, ShardIdentifier, H256};
use crate::state::{AccountGuard, AccountShards};
use crate::stf::{
    CallDispatcher, Getter, GetterOutput, PublicGetter, TrustedCall, TrustedCallSigned,
    TrustedOperation,
};
use crate::vault::ShieldingKeyVault;
use crate::verify::{IdentityVerifier, Web2EvidenceResolver};

/// End-to-end request handler of the identity core.
pub struct Worker {
    shard: ShardIdentifier,
    enclave_key: Arc<dyn EnclaveKeyService>,
    signer: EnclaveSigner,
    authorizer: CallAuthorizer,
    dispatcher: CallDispatcher,
    vault: Arc<ShieldingKeyVault>,
    accounts: AccountShards,
}

impl Worker {
    /// Assemble a worker from its collaborators.
    ///
    /// The authorizer must recognize `enclave_key`'s call signer as the
    /// enclave account.
    pub fn new(
        shard: ShardIdentifier,
        enclave_key: Arc<dyn EnclaveKeyService>,
        authorizer: CallAuthorizer,
        dispatcher: CallDispatcher,
        vault: Arc<ShieldingKeyVault>,
    ) -> Self {
        let signer = enclave_key.call_signer();
        Self {
            shard,
            enclave_key,
            signer,
            authorizer,
            dispatcher,
            vault,
            accounts: AccountShards::new(),
        }
    }

    /// Build a worker with in-memory state from `config`.
    pub fn from_config(
        config: &CoreConfig,
        enclave_key: Arc<dyn EnclaveKeyService>,
        resolver: Arc<dyn Web2EvidenceResolver>,
        oracle: Arc<dyn BlockHeightOracle>,
    ) -> Self {
        let vault = Arc::new(ShieldingKeyVault::new());
        let verifier = IdentityVerifier::new(resolver, config.web2_lookup_timeout);
        let dispatcher = CallDispatcher::new(vault.clone(), verifier, oracle, config.policy);
        let authorizer = CallAuthorizer::new(
            enclave_key.call_signer().account(),
            Arc::new(InMemoryNonceStore::new()),
        );
        Self::new(config.shard, enclave_key, authorizer, dispatcher, vault)
    }

    pub fn shard(&self) -> &ShardIdentifier {
        &self.shard
    }

    /// The enclave signer's account.
    pub fn enclave_account(&self) -> Identity {
        self.signer.account()
    }

    /// Public key clients seal requests to.
    pub fn shielding_key(&self) -> EnclavePublicKey {
        self.enclave_key.public_key()
    }

    /// Handle an encrypted request. Never fails: errors become an `Error`
    /// response.
    pub async fn handle_request(&self, request: Request) -> RpcReturnValue {
        match self.execute(request).await {
            Ok(response) => response,
            Err(e) => RpcReturnValue::error(&e),
        }
    }

    /// Re-sign and execute an unsigned call `sender` encrypted to the enclave.
    pub async fn relay_indirect(&self, sender: &Identity, request: Request) -> RpcReturnValue {
        match self.relay(sender, request).await {
            Ok(response) => response,
            Err(e) => RpcReturnValue::error(&e),
        }
    }

    async fn execute(&self, request: Request) -> Result<RpcReturnValue, StfError> {
        let operation: TrustedOperation = self.open_request(&request)?;
        let hash = operation.hash()?;
        debug!(hash = %hash, "trusted operation decoded");

        match operation {
            TrustedOperation::DirectCall(signed) => {
                self.submit_call(CallShape::Direct, signed, hash).await
            }
            TrustedOperation::IndirectCall(signed) => {
                self.submit_call(CallShape::Indirect, signed, hash).await
            }
            TrustedOperation::Get(getter) => self.get(getter).await,
        }
    }

    async fn relay(&self, sender: &Identity, request: Request) -> Result<RpcReturnValue, StfError> {
        let call: TrustedCall = self.open_request(&request)?;
        if &call.who != sender {
            return Err(StfError::InvalidAccount);
        }

        let who = call.who.clone();
        let state = self.accounts.lock(&who).await;
        match self.resign(call) {
            Ok((principal, signed, hash)) => self.run_locked(principal, signed, hash, state).await,
            Err(e) => {
                self.accounts.release_if_vacant(&who, state);
                Err(e)
            }
        }
    }

    /// Sign `call` with the enclave signer at the relay principal's next
    /// nonce. Must run under the account lock.
    fn resign(&self, call: TrustedCall) -> Result<(Principal, TrustedCallSigned, H256), StfError> {
        let nonce = self
            .authorizer
            .nonces()
            .next(&Principal::EnclaveRelay(call.who.clone()));
        let call = TrustedCall {
            signer: self.signer.account(),
            ..call
        };
        let signed = call.sign_with(nonce, &self.shard, |payload| self.signer.sign(payload))?;
        let hash = TrustedOperation::IndirectCall(signed.clone()).hash()?;
        debug!(who = %signed.call.who, nonce, hash = %hash, "relaying call");

        let principal = self
            .authorizer
            .authenticate(CallShape::Indirect, &signed, &self.shard)?;
        Ok((principal, signed, hash))
    }

    async fn submit_call(
        &self,
        shape: CallShape,
        signed: TrustedCallSigned,
        hash: H256,
    ) -> Result<RpcReturnValue, StfError> {
        let principal = self.authorizer.authenticate(shape, &signed, &self.shard)?;
        let state = self.accounts.lock(&signed.call.who).await;
        self.run_locked(principal, signed, hash, state).await
    }

    async fn run_locked(
        &self,
        principal: Principal,
        signed: TrustedCallSigned,
        hash: H256,
        mut state: AccountGuard,
    ) -> Result<RpcReturnValue, StfError> {
        let who = signed.call.who.clone();
        let result = self.execute_call(&principal, signed, hash, &mut state).await;
        if result.is_err() {
            self.accounts.release_if_vacant(&who, state);
        }
        result
    }

    async fn execute_call(
        &self,
        principal: &Principal,
        signed: TrustedCallSigned,
        hash: H256,
        state: &mut AccountGuard,
    ) -> Result<RpcReturnValue, StfError> {
        self.authorizer.consume_nonce(principal, &signed)?;
        let outcome = self.dispatcher.dispatch(principal, signed.call, state).await?;

        let sealed = self
            .vault
            .seal_json(outcome.account(), &outcome)
            .map_err(|e| infrastructure("failed to seal call outcome", e))?;
        info!(principal = %principal, hash = %hash, "trusted call finalized");
        Ok(RpcReturnValue::executed(encode(&sealed)?, hash))
    }

    async fn get(&self, getter: Getter) -> Result<RpcReturnValue, StfError> {
        let output = match getter {
            Getter::Public(PublicGetter::Nonce(who)) => {
                GetterOutput::Nonce(self.authorizer.nonces().next(&Principal::User(who)))
            }
            Getter::Public(PublicGetter::ChallengeCode { who, identity }) => {
                let code = match self.accounts.lock_existing(&who).await {
                    Some(state) => state.challenge_code(&identity),
                    None => 0,
                };
                GetterOutput::ChallengeCode(code)
            }
            Getter::Trusted(signed) => {
                let who = self.authorizer.authorize_getter(&signed)?;
                let state = self
                    .accounts
                    .lock_existing(&who)
                    .await
                    .ok_or(StfError::GetterFailed(ErrorDetail::UserShieldingKeyNotFound))?;
                self.dispatcher.get(&signed.getter, &state)?
            }
        };
        Ok(RpcReturnValue::ok(encode(&output)?))
    }

    /// Decrypt a request to this shard and decode its JSON payload.
    fn open_request<T: serde::de::DeserializeOwned>(&self, request: &Request) -> Result<T, StfError> {
        if request.shard != self.shard {
            return Err(StfError::Dispatch(format!("unknown shard {}", request.shard)));
        }
        let plaintext = self
            .enclave_key
            .decrypt(&request.ciphertext)
            .map_err(|e| infrastructure("failed to decrypt request", e))?;
        serde_json::from_slice(&plaintext)
            .map_err(|e| infrastructure("failed to decode request", e))
    }
}

fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, StfError> {
    serde_json::to_vec(value).map_err(|e| infrastructure("failed to encode response", e))
}

fn infrastructure(context: &str, err: impl std::fmt::Display) -> StfError {
    error!(error = %err, "{context}");
    StfError::Dispatch(context.to_string())
}

impl std::fmt::Debug for Worker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Worker")
            .field("shard", &self.shard)
            .field("signer", &self.signer)
            .finish_non_exhaustive()
    }
}
