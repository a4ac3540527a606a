//! Shared fixtures for unit tests.

use std::sync::{Arc, OnceLock};

use rand::rngs::OsRng;
use rsa::pkcs8::{EncodePrivateKey, EncodePublicKey};
use rsa::{RsaPrivateKey, RsaPublicKey};

use crate::keystore::KeyStore;
use crate::manager::CryptoManager;
use crate::provider::CryptoProvider;

pub(crate) const AES_KEY: &[u8] = b"!mysecretkey#9^5usdk39d&dlf)03sL";
pub(crate) const HMAC_KEY: &[u8] = b"myauthpassword";

fn aes256_store_with(signing: bool) -> Arc<KeyStore> {
    let mut store = KeyStore::new();
    store.store_key("mypublickey", AES_KEY);
    store.set_public_key_name("mypublickey");
    if signing {
        store.store_key("HMACsecret", HMAC_KEY);
        store.set_signing_key_name("HMACsecret");
    }
    Arc::new(store)
}

/// AES-256 key as `mypublickey` plus the HMAC key as `HMACsecret`.
pub(crate) fn aes256_store() -> Arc<KeyStore> {
    aes256_store_with(true)
}

/// Manager with a signing AES-256 provider under `AES`.
pub(crate) fn aes_manager() -> CryptoManager {
    manager_for(aes256_store_with(true))
}

/// Same key as [`aes_manager`] but without a signing key.
pub(crate) fn unsigned_aes_manager() -> CryptoManager {
    manager_for(aes256_store_with(false))
}

fn manager_for(store: Arc<KeyStore>) -> CryptoManager {
    let manager = CryptoManager::new();
    manager
        .register_provider("AES", Arc::new(CryptoProvider::aes256(store)))
        .unwrap();
    manager
}

type DerPair = (Vec<u8>, Vec<u8>);

fn generate(bits: usize) -> DerPair {
    let private = RsaPrivateKey::new(&mut OsRng, bits).unwrap();
    let public = RsaPublicKey::from(&private);
    (
        public.to_public_key_der().unwrap().as_bytes().to_vec(),
        private.to_pkcs8_der().unwrap().as_bytes().to_vec(),
    )
}

fn as_slices(pair: &'static DerPair) -> (&'static [u8], &'static [u8]) {
    (pair.0.as_slice(), pair.1.as_slice())
}

/// `(SPKI public, PKCS#8 private)` DER for a 2048-bit key, generated once.
pub(crate) fn rsa_2048_der() -> (&'static [u8], &'static [u8]) {
    static PAIR: OnceLock<DerPair> = OnceLock::new();
    as_slices(PAIR.get_or_init(|| generate(2048)))
}

/// A 1024-bit pair, for modulus size checks.
pub(crate) fn rsa_1024_der() -> (&'static [u8], &'static [u8]) {
    static PAIR: OnceLock<DerPair> = OnceLock::new();
    as_slices(PAIR.get_or_init(|| generate(1024)))
}
