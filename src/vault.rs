// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Per-account shielding keys.
//!
//! Every response returned to an account is encrypted under that account's
//! key. Keys are created by the account's first `set_user_shielding_key`
//! call and overwritten by later ones. Writes happen under the account's
//! shard lock, so the map itself only needs per-key exclusion.

use std::sync::Arc;

use dashmap::DashMap;
use serde::Serialize;

use crate::crypto::{AesOutput, ShieldingKey};
use crate::error::ErrorDetail;
use crate::identity::Identity;

/// In-enclave store of user shielding keys, keyed by account.
#[derive(Debug, Default)]
pub struct ShieldingKeyVault {
    keys: DashMap<Identity, Arc<ShieldingKey>>,
}

impl ShieldingKeyVault {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `key` for `who`, replacing any previous key.
    ///
    /// Returns `true` when this is the account's first key.
    pub fn set(&self, who: Identity, key: ShieldingKey) -> bool {
        self.keys.insert(who, Arc::new(key)).is_none()
    }

    pub fn get(&self, who: &Identity) -> Option<Arc<ShieldingKey>> {
        self.keys.get(who).map(|k| Arc::clone(k.value()))
    }

    pub fn contains(&self, who: &Identity) -> bool {
        self.keys.contains_key(who)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Serialize `value` as JSON and encrypt it for `who`.
    pub fn seal_json<T: Serialize>(&self, who: &Identity, value: &T) -> Result<AesOutput, ErrorDetail> {
        let key = self.get(who).ok_or(ErrorDetail::UserShieldingKeyNotFound)?;
        seal_json_with(&key, who, value)
    }
}

/// Encrypt `plaintext` under `key` for `who`, binding the account's DID as AAD.
pub fn encrypt_with(key: &ShieldingKey, who: &Identity, plaintext: &[u8]) -> Result<AesOutput, ErrorDetail> {
    key.encrypt(plaintext, who.to_did().as_bytes())
        .map_err(|e| ErrorDetail::StfError(e.to_string()))
}

/// Serialize `value` as JSON and encrypt it under `key` for `who`.
pub fn seal_json_with<T: Serialize>(
    key: &ShieldingKey,
    who: &Identity,
    value: &T,
) -> Result<AesOutput, ErrorDetail> {
    let plaintext = serde_json::to_vec(value).map_err(|e| ErrorDetail::StfError(e.to_string()))?;
    encrypt_with(key, who, &plaintext)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> Identity {
        Identity::substrate([1u8; 32])
    }

    #[test]
    fn first_set_is_reported() {
        let vault = ShieldingKeyVault::new();
        assert!(vault.set(alice(), ShieldingKey::generate()));
        assert!(!vault.set(alice(), ShieldingKey::generate()));
        assert_eq!(vault.len(), 1);
    }

    #[test]
    fn overwrite_replaces_key() {
        let vault = ShieldingKeyVault::new();
        vault.set(alice(), ShieldingKey::from_bytes(&[1u8; 32]).unwrap());
        vault.set(alice(), ShieldingKey::from_bytes(&[2u8; 32]).unwrap());

        let out = encrypt_with(&vault.get(&alice()).unwrap(), &alice(), b"graph").unwrap();
        let second = ShieldingKey::from_bytes(&[2u8; 32]).unwrap();
        assert_eq!(second.decrypt(&out).unwrap(), b"graph");
        assert!(ShieldingKey::from_bytes(&[1u8; 32]).unwrap().decrypt(&out).is_err());
    }

    #[test]
    fn encrypt_binds_account_did() {
        let vault = ShieldingKeyVault::new();
        vault.set(alice(), ShieldingKey::generate());
        let out = vault.seal_json(&alice(), &"x").unwrap();
        assert_eq!(out.aad, alice().to_did().into_bytes());
    }

    #[test]
    fn missing_key_is_reported() {
        let vault = ShieldingKeyVault::new();
        assert_eq!(
            vault.seal_json(&alice(), &"x"),
            Err(ErrorDetail::UserShieldingKeyNotFound)
        );
        assert!(!vault.contains(&alice()));
    }
}
