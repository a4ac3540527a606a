//! [`KeyStore`]: named key material plus the public/private/signing role names.

use std::collections::HashMap;

use common::CryptoError;

/// Raw key bytes.
///
/// Cloned out of the [`KeyStore`] into provider call stacks when needed.
/// When this type is dropped, the memory is overwritten with zeroes.
#[derive(Clone)]
pub struct KeyBytes(Box<[u8]>);

impl KeyBytes {
    /// Copy `bytes` into a new buffer.
    pub fn new(bytes: &[u8]) -> Self {
        Self(bytes.into())
    }

    /// Borrow the key material.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Length in bytes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` for a zero-length key.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Drop for KeyBytes {
    fn drop(&mut self) {
        self.0.iter_mut().for_each(|b| *b = 0);
    }
}

impl std::fmt::Debug for KeyBytes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never print key material, not even in debug builds.
        write!(f, "KeyBytes([REDACTED; {}])", self.0.len())
    }
}

/// The purpose a stored key serves for a provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyRole {
    /// Encryption key; also the single secret of symmetric algorithms.
    Public,
    /// Decryption key of asymmetric algorithms.
    Private,
    /// HMAC key for envelope signatures.
    Signing,
}

/// Named collection of key material with three designated role names.
///
/// Configure with [`KeyStore::store_key`] and the role setters, then share it
/// read-only (behind an `Arc`) with the providers bound to it. Any role name
/// may stay unset if the owning algorithm does not need it.
#[derive(Clone, Debug, Default)]
pub struct KeyStore {
    keys: HashMap<String, KeyBytes>,
    public_key_name: Option<String>,
    private_key_name: Option<String>,
    signing_key_name: Option<String>,
}

impl KeyStore {
    /// Create a new, empty [`KeyStore`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Store (or replace) the key under `name`.
    ///
    /// No length validation happens here; algorithm-specific size checks are
    /// made by the provider when the key is used.
    pub fn store_key(&mut self, name: impl Into<String>, bytes: &[u8]) {
        self.keys.insert(name.into(), KeyBytes::new(bytes));
    }

    /// Borrow a clone of the key stored under `name`.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::KeyNotFound`] if nothing is stored under `name`.
    pub fn get_key(&self, name: &str) -> Result<KeyBytes, CryptoError> {
        self.keys
            .get(name)
            .cloned()
            .ok_or_else(|| CryptoError::KeyNotFound { name: name.to_owned() })
    }

    /// Returns `true` if a key is stored under `name`.
    pub fn contains_key(&self, name: &str) -> bool {
        self.keys.contains_key(name)
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Returns `true` if no keys are stored.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Name of the encryption key, also written as an envelope's `kid`.
    pub fn public_key_name(&self) -> Option<&str> {
        self.public_key_name.as_deref()
    }

    /// Set the public key name.
    pub fn set_public_key_name(&mut self, name: impl Into<String>) {
        self.public_key_name = Some(name.into());
    }

    /// Name of the asymmetric decryption key.
    pub fn private_key_name(&self) -> Option<&str> {
        self.private_key_name.as_deref()
    }

    /// Set the private key name.
    pub fn set_private_key_name(&mut self, name: impl Into<String>) {
        self.private_key_name = Some(name.into());
    }

    /// Name of the HMAC key; unset means envelopes are not signed.
    pub fn signing_key_name(&self) -> Option<&str> {
        self.signing_key_name.as_deref()
    }

    /// Set the signing key name.
    pub fn set_signing_key_name(&mut self, name: impl Into<String>) {
        self.signing_key_name = Some(name.into());
    }

    /// The configured name for `role`, if any.
    pub fn role_name(&self, role: KeyRole) -> Option<&str> {
        match role {
            KeyRole::Public => self.public_key_name(),
            KeyRole::Private => self.private_key_name(),
            KeyRole::Signing => self.signing_key_name(),
        }
    }

    /// The key serving `role`: `Ok(None)` if the role name is unset.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::KeyNotFound`] if the role name is set but no key
    /// is stored under it.
    pub fn key_for_role(&self, role: KeyRole) -> Result<Option<KeyBytes>, CryptoError> {
        self.role_name(role).map(|name| self.get_key(name)).transpose()
    }
}
