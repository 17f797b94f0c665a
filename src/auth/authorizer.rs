// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Call authorization.

use std::sync::Arc;

use tracing::warn;

use super::{NonceStore, Principal};
use crate::error::StfError;
use crate::identity::Identity;
use crate::rpc::ShardIdentifier;
use crate::stf::{TrustedCallSigned, TrustedGetterSigned};

/// How a call reached the enclave.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallShape {
    /// Signed by the account's own key.
    Direct,
    /// Re-signed by the enclave signer after decrypting an inner request.
    Indirect,
}

/// Authorizes signed calls before dispatch.
#[derive(Clone)]
pub struct CallAuthorizer {
    enclave_account: Identity,
    nonces: Arc<dyn NonceStore>,
}

impl CallAuthorizer {
    pub fn new(enclave_account: Identity, nonces: Arc<dyn NonceStore>) -> Self {
        Self {
            enclave_account,
            nonces,
        }
    }

    pub fn nonces(&self) -> &dyn NonceStore {
        self.nonces.as_ref()
    }

    /// Authenticate `signed`, returning the principal it acts as.
    ///
    /// # Checks
    ///
    /// 1. The signature verifies against `call.signer` (`InvalidSignature`).
    /// 2. Indirect calls are signed by the enclave account
    ///    (`RequireEnclaveSignerAccount`); direct calls by `call.who`
    ///    (`MissingPrivileges`).
    ///
    /// Needs no account state, so the worker runs it before taking the
    /// account lock.
    pub fn authenticate(
        &self,
        shape: CallShape,
        signed: &TrustedCallSigned,
        shard: &ShardIdentifier,
    ) -> Result<Principal, StfError> {
        let call = &signed.call;
        if !signed.verify_signature(shard)? {
            warn!(signer = %call.signer, "call signature does not verify");
            return Err(StfError::InvalidSignature);
        }

        match shape {
            CallShape::Indirect => {
                if call.signer != self.enclave_account {
                    warn!(signer = %call.signer, "indirect call not signed by enclave signer");
                    return Err(StfError::RequireEnclaveSignerAccount);
                }
                Ok(Principal::EnclaveRelay(call.who.clone()))
            }
            CallShape::Direct => {
                if call.signer != call.who {
                    warn!(signer = %call.signer, who = %call.who, "direct call signed for another account");
                    return Err(StfError::MissingPrivileges(call.signer.clone()));
                }
                Ok(Principal::User(call.who.clone()))
            }
        }
    }

    /// Consume `signed`'s nonce for an authenticated `principal`
    /// (`InvalidNonce` unless it is the principal's next one).
    ///
    /// Runs under the account lock. The nonce stays consumed whatever
    /// dispatch does afterwards.
    pub fn consume_nonce(&self, principal: &Principal, signed: &TrustedCallSigned) -> Result<(), StfError> {
        self.nonces.try_consume(principal, signed.nonce)
    }

    /// Authorize a trusted getter, returning the queried account.
    pub fn authorize_getter(&self, signed: &TrustedGetterSigned) -> Result<Identity, StfError> {
        if !signed.verify_signature()? {
            warn!(who = %signed.getter.who(), "getter signature does not verify");
            return Err(StfError::InvalidSignature);
        }
        Ok(signed.getter.who().clone())
    }
}

impl std::fmt::Debug for CallAuthorizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallAuthorizer")
            .field("enclave_account", &self.enclave_account)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::InMemoryNonceStore;
    use crate::crypto::{EnclaveKeyService, EnclaveSigner, SealedEnclaveKey};
    use crate::rpc::H256;
    use crate::stf::{CallAction, TrustedCall, TrustedGetter};
    use crate::test_utils::{EvmKey, SubstrateKey};

    const SHARD: H256 = H256([0u8; 32]);

    fn authorize(
        auth: &CallAuthorizer,
        shape: CallShape,
        signed: &TrustedCallSigned,
    ) -> Result<Principal, StfError> {
        let principal = auth.authenticate(shape, signed, &SHARD)?;
        auth.consume_nonce(&principal, signed)?;
        Ok(principal)
    }

    fn setup() -> (CallAuthorizer, EnclaveSigner) {
        let signer = SealedEnclaveKey::generate().call_signer();
        let authorizer = CallAuthorizer::new(signer.account(), Arc::new(InMemoryNonceStore::new()));
        (authorizer, signer)
    }

    fn deactivate(signer: Identity, who: Identity) -> TrustedCall {
        TrustedCall::new(
            signer,
            who,
            CallAction::DeactivateIdentity {
                identity: Identity::twitter("alice").unwrap(),
            },
        )
    }

    #[test]
    fn direct_call_by_owner_is_authorized() {
        let (auth, _) = setup();
        let key = EvmKey::random();
        let signed = deactivate(key.identity(), key.identity())
            .sign_with(0, &SHARD, |p| key.personal_sign(p))
            .unwrap();

        let principal = authorize(&auth, CallShape::Direct, &signed).unwrap();
        assert_eq!(principal, Principal::User(key.identity()));
        assert_eq!(auth.nonces().next(&principal), 1);
    }

    #[test]
    fn direct_call_for_other_account_is_rejected() {
        let (auth, _) = setup();
        let key = SubstrateKey::ed25519();
        let victim = Identity::substrate([7u8; 32]);
        let signed = deactivate(key.identity(), victim)
            .sign_with(0, &SHARD, |p| key.sign(p))
            .unwrap();

        assert_eq!(
            authorize(&auth, CallShape::Direct, &signed),
            Err(StfError::MissingPrivileges(key.identity()))
        );
    }

    #[test]
    fn indirect_call_requires_enclave_signer() {
        let (auth, enclave) = setup();
        let key = SubstrateKey::sr25519();

        let by_user = deactivate(key.identity(), key.identity())
            .sign_with(0, &SHARD, |p| key.sign(p))
            .unwrap();
        assert_eq!(
            authorize(&auth, CallShape::Indirect, &by_user),
            Err(StfError::RequireEnclaveSignerAccount)
        );

        let by_enclave = deactivate(enclave.account(), key.identity())
            .sign_with(0, &SHARD, |p| enclave.sign(p))
            .unwrap();
        assert_eq!(
            authorize(&auth, CallShape::Indirect, &by_enclave),
            Ok(Principal::EnclaveRelay(key.identity()))
        );
    }

    #[test]
    fn forged_signature_is_rejected_without_consuming_nonce() {
        let (auth, _) = setup();
        let key = SubstrateKey::ed25519();
        let mallory = SubstrateKey::ed25519();
        let signed = deactivate(key.identity(), key.identity())
            .sign_with(0, &SHARD, |p| mallory.sign(p))
            .unwrap();

        assert_eq!(
            authorize(&auth, CallShape::Direct, &signed),
            Err(StfError::InvalidSignature)
        );
        assert_eq!(auth.nonces().next(&Principal::User(key.identity())), 0);
    }

    #[test]
    fn replayed_call_is_rejected() {
        let (auth, _) = setup();
        let key = SubstrateKey::ed25519();
        let signed = deactivate(key.identity(), key.identity())
            .sign_with(0, &SHARD, |p| key.sign(p))
            .unwrap();

        authorize(&auth, CallShape::Direct, &signed).unwrap();
        assert_eq!(
            authorize(&auth, CallShape::Direct, &signed),
            Err(StfError::InvalidNonce(1, 0))
        );
    }

    #[test]
    fn authenticate_leaves_nonce_for_later() {
        let (auth, _) = setup();
        let key = SubstrateKey::ed25519();
        let signed = deactivate(key.identity(), key.identity())
            .sign_with(0, &SHARD, |p| key.sign(p))
            .unwrap();

        let principal = auth.authenticate(CallShape::Direct, &signed, &SHARD).unwrap();
        assert_eq!(auth.nonces().next(&principal), 0);
        auth.consume_nonce(&principal, &signed).unwrap();
        assert_eq!(auth.nonces().next(&principal), 1);
    }

    #[test]
    fn getter_signed_by_owner() {
        let (auth, _) = setup();
        let key = SubstrateKey::ed25519();
        let mallory = SubstrateKey::ed25519();

        let own = TrustedGetter::IdGraph(key.identity())
            .sign_with(|p| key.sign(p))
            .unwrap();
        assert_eq!(auth.authorize_getter(&own), Ok(key.identity()));

        let forged = TrustedGetter::IdGraph(key.identity())
            .sign_with(|p| mallory.sign(p))
            .unwrap();
        assert_eq!(auth.authorize_getter(&forged), Err(StfError::InvalidSignature));
    }
}
