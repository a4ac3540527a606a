//! Crypto providers: one algorithm bound to one [`KeyStore`].
//!
//! The algorithm family is a closed set ([`Algorithm`]); dispatch is a `match`
//! rather than a trait object. Extensibility comes from registering any
//! number of providers under aliases in a [`crate::manager::CryptoManager`].
//!
//! | Algorithm | Name                  | IV  | Keys used                          |
//! |-----------|-----------------------|-----|------------------------------------|
//! | AES-128   | `AES-128-HMAC-SHA256` | 16  | public (16 bytes), signing         |
//! | AES-256   | `AES-256-HMAC-SHA256` | 16  | public (32 bytes), signing         |
//! | RSA       | `RSA-2048-OAEP-SHA1`  | 0   | public (SPKI), private (PKCS#8), signing |
//!
//! Signing is optional: with no signing key name configured,
//! [`CryptoProvider::signature`] returns `None`.

pub mod cipher;
pub mod oaep;

use std::sync::Arc;

use arc_swap::ArcSwapOption;
use common::CryptoError;
use tracing::warn;

use crate::keystore::{KeyBytes, KeyRole, KeyStore};
use cipher::{CipherError, AES_128_KEY_LEN, AES_256_KEY_LEN, IV_LEN};
use oaep::RsaCipherError;

/// The supported algorithm family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Algorithm {
    Aes128,
    Aes256,
    Rsa2048,
}

impl Algorithm {
    /// Stable identifier embedded in the envelope's `alg` member.
    pub fn name(self) -> &'static str {
        match self {
            Algorithm::Aes128 => "AES-128-HMAC-SHA256",
            Algorithm::Aes256 => "AES-256-HMAC-SHA256",
            Algorithm::Rsa2048 => "RSA-2048-OAEP-SHA1",
        }
    }

    /// Bytes of IV prepended to the output of [`CryptoProvider::encrypt`].
    pub fn iv_size(self) -> usize {
        match self {
            Algorithm::Aes128 | Algorithm::Aes256 => IV_LEN,
            Algorithm::Rsa2048 => 0,
        }
    }

    /// Look up an algorithm by its [`Algorithm::name`].
    pub fn from_name(name: &str) -> Option<Self> {
        [Algorithm::Aes128, Algorithm::Aes256, Algorithm::Rsa2048]
            .into_iter()
            .find(|alg| alg.name() == name)
    }
}

impl std::fmt::Display for Algorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// An algorithm implementation bound to exactly one [`KeyStore`].
///
/// The alias is assigned by [`crate::manager::CryptoManager::register_provider`],
/// not at construction; re-registration overwrites it.
#[derive(Debug)]
pub struct CryptoProvider {
    algorithm: Algorithm,
    key_store: Arc<KeyStore>,
    alias: ArcSwapOption<String>,
}

impl CryptoProvider {
    /// Create a provider for `algorithm` reading keys from `key_store`.
    pub fn new(algorithm: Algorithm, key_store: Arc<KeyStore>) -> Self {
        Self {
            algorithm,
            key_store,
            alias: ArcSwapOption::empty(),
        }
    }

    /// AES-128-CBC provider with HMAC-SHA256 signatures.
    pub fn aes128(key_store: Arc<KeyStore>) -> Self {
        Self::new(Algorithm::Aes128, key_store)
    }

    /// AES-256-CBC provider with HMAC-SHA256 signatures.
    pub fn aes256(key_store: Arc<KeyStore>) -> Self {
        Self::new(Algorithm::Aes256, key_store)
    }

    /// RSA-2048-OAEP (SHA-1) provider with HMAC-SHA256 signatures.
    pub fn rsa(key_store: Arc<KeyStore>) -> Self {
        Self::new(Algorithm::Rsa2048, key_store)
    }

    /// The algorithm this provider implements.
    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    /// Stable identifier embedded in the envelope's `alg` member.
    pub fn algorithm_name(&self) -> &'static str {
        self.algorithm.name()
    }

    /// Exact match of `name` against [`CryptoProvider::algorithm_name`].
    pub fn check_algorithm_name_match(&self, name: &str) -> bool {
        self.algorithm_name() == name
    }

    /// Bytes of IV prepended to the output of [`CryptoProvider::encrypt`].
    pub fn iv_size(&self) -> usize {
        self.algorithm.iv_size()
    }

    /// The key store this provider reads from.
    pub fn key_store(&self) -> &KeyStore {
        &self.key_store
    }

    /// The alias this provider was last registered under.
    pub fn alias(&self) -> Option<String> {
        self.alias.load_full().map(|alias| alias.as_ref().clone())
    }

    pub(crate) fn set_alias(&self, alias: &str) {
        self.alias.store(Some(Arc::new(alias.to_owned())));
    }

    /// Encrypt `plaintext`.
    ///
    /// AES output is `iv || ciphertext` with a fresh IV per call; split it
    /// with [`CryptoProvider::iv_size`]. RSA output carries no IV.
    ///
    /// # Errors
    ///
    /// - [`CryptoError::MissingPublicKey`] if the public key name is unset.
    /// - [`CryptoError::KeyNotFound`] if no key is stored under that name.
    /// - [`CryptoError::KeySize`] / [`CryptoError::InvalidKey`] for unusable key material.
    /// - [`CryptoError::EncryptFailed`] if the cipher rejects the input.
    pub fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let alg = self.algorithm_name();
        let key = self.required_key(KeyRole::Public)?;
        match self.algorithm {
            Algorithm::Aes128 | Algorithm::Aes256 => {
                self.check_aes_key(&key)?;
                cipher::encrypt_cbc(key.as_bytes(), plaintext).map_err(|e| {
                    CryptoError::EncryptFailed {
                        algorithm: alg,
                        reason: e.to_string(),
                    }
                })
            }
            Algorithm::Rsa2048 => oaep::encrypt_oaep(key.as_bytes(), plaintext).map_err(|e| {
                rsa_error(alg, e, |reason| CryptoError::EncryptFailed {
                    algorithm: alg,
                    reason,
                })
            }),
        }
    }

    /// Decrypt the output of [`CryptoProvider::encrypt`].
    ///
    /// AES uses the key under the public key name (the single shared secret);
    /// RSA uses the key under the private key name.
    ///
    /// # Errors
    ///
    /// - [`CryptoError::MissingPublicKey`] / [`CryptoError::MissingPrivateKey`] if the
    ///   role name is unset.
    /// - [`CryptoError::KeySize`] / [`CryptoError::InvalidKey`] for unusable key material.
    /// - [`CryptoError::DecryptFailed`] on padding, length or OAEP failure.
    pub fn decrypt(&self, ciphertext: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let alg = self.algorithm_name();
        match self.algorithm {
            Algorithm::Aes128 | Algorithm::Aes256 => {
                let key = self.required_key(KeyRole::Public)?;
                self.check_aes_key(&key)?;
                cipher::decrypt_cbc(key.as_bytes(), ciphertext).map_err(|e| {
                    CryptoError::DecryptFailed {
                        algorithm: alg,
                        reason: e.to_string(),
                    }
                })
            }
            Algorithm::Rsa2048 => {
                let key = self.required_key(KeyRole::Private)?;
                oaep::decrypt_oaep(key.as_bytes(), ciphertext).map_err(|e| {
                    rsa_error(alg, e, |reason| CryptoError::DecryptFailed {
                        algorithm: alg,
                        reason,
                    })
                })
            }
        }
    }

    /// HMAC-SHA256 of `message` under the signing key, or `None` if no
    /// signing key name is configured.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::KeyNotFound`] if the signing key name is set but
    /// nothing is stored under it, and [`CryptoError::SigningFailed`] if the
    /// MAC cannot be computed.
    pub fn signature(&self, message: &[u8]) -> Result<Option<Vec<u8>>, CryptoError> {
        let Some(key) = self.key_store.key_for_role(KeyRole::Signing)? else {
            return Ok(None);
        };
        cipher::sign(key.as_bytes(), message)
            .map(Some)
            .map_err(|e: CipherError| CryptoError::SigningFailed {
                algorithm: self.algorithm_name(),
                reason: e.to_string(),
            })
    }

    /// Constant-time check of `signature` over `message`.
    ///
    /// Never errors: a missing or unresolvable signing key yields `false`.
    pub fn verify_signature(&self, message: &[u8], signature: &[u8]) -> bool {
        match self.key_store.key_for_role(KeyRole::Signing) {
            Ok(Some(key)) => cipher::verify(key.as_bytes(), message, signature),
            Ok(None) => false,
            Err(e) => {
                warn!(algorithm = self.algorithm_name(), error = %e, "signing key unavailable");
                false
            }
        }
    }

    fn required_key(&self, role: KeyRole) -> Result<KeyBytes, CryptoError> {
        let algorithm = self.algorithm_name();
        self.key_store.key_for_role(role)?.ok_or(match role {
            KeyRole::Public => CryptoError::MissingPublicKey { algorithm },
            KeyRole::Private => CryptoError::MissingPrivateKey { algorithm },
            KeyRole::Signing => CryptoError::MissingSigningKey { algorithm },
        })
    }

    fn check_aes_key(&self, key: &KeyBytes) -> Result<(), CryptoError> {
        let expected = match self.algorithm {
            Algorithm::Aes128 => AES_128_KEY_LEN,
            _ => AES_256_KEY_LEN,
        };
        if key.len() == expected {
            Ok(())
        } else {
            Err(CryptoError::KeySize {
                algorithm: self.algorithm_name(),
                expected,
                actual: key.len(),
                unit: "byte",
            })
        }
    }
}

fn rsa_error(
    algorithm: &'static str,
    e: RsaCipherError,
    operation: impl FnOnce(String) -> CryptoError,
) -> CryptoError {
    match e {
        RsaCipherError::ModulusSize(actual) => CryptoError::KeySize {
            algorithm,
            expected: oaep::MODULUS_BITS,
            actual,
            unit: "bit",
        },
        RsaCipherError::MalformedKey(reason) => CryptoError::InvalidKey { algorithm, reason },
        RsaCipherError::Oaep(inner) => operation(inner.to_string()),
    }
}
