//! Key fixtures shared by the integration tests.

#![allow(dead_code)]

use std::sync::{Arc, OnceLock};

use fle::{CryptoManager, CryptoProvider, KeyStore};
use rand::rngs::OsRng;
use rsa::pkcs8::{EncodePrivateKey, EncodePublicKey};
use rsa::{RsaPrivateKey, RsaPublicKey};

pub const AES_256_KEY: &[u8] = b"!mysecretkey#9^5usdk39d&dlf)03sL";
pub const AES_128_KEY: &[u8] = b"0123456789abcdef";
pub const HMAC_KEY: &[u8] = b"myauthpassword";

/// Key store with `key` as `mypublickey` and, if `signed`, the HMAC key as
/// `HMACsecret`.
pub fn aes_store(key: &[u8], signed: bool) -> Arc<KeyStore> {
    let mut store = KeyStore::new();
    store.store_key("mypublickey", key);
    store.set_public_key_name("mypublickey");
    if signed {
        store.store_key("HMACsecret", HMAC_KEY);
        store.set_signing_key_name("HMACsecret");
    }
    Arc::new(store)
}

/// `(SPKI public, PKCS#8 private)` DER of a 2048-bit key, generated once.
pub fn rsa_keys() -> &'static (Vec<u8>, Vec<u8>) {
    static PAIR: OnceLock<(Vec<u8>, Vec<u8>)> = OnceLock::new();
    PAIR.get_or_init(|| {
        let private = RsaPrivateKey::new(&mut OsRng, 2048).unwrap();
        let public = RsaPublicKey::from(&private);
        (
            public.to_public_key_der().unwrap().as_bytes().to_vec(),
            private.to_pkcs8_der().unwrap().as_bytes().to_vec(),
        )
    })
}

pub fn rsa_store(with_private: bool) -> Arc<KeyStore> {
    let (public, private) = rsa_keys();
    let mut store = KeyStore::new();
    store.store_key("rsa-public", public);
    store.set_public_key_name("rsa-public");
    if with_private {
        store.store_key("rsa-private", private);
        store.set_private_key_name("rsa-private");
    }
    store.store_key("HMACsecret", HMAC_KEY);
    store.set_signing_key_name("HMACsecret");
    Arc::new(store)
}

/// Manager with `AES128`, `AES256` and `RSA` providers, all signing.
pub fn full_manager() -> CryptoManager {
    let manager = CryptoManager::new();
    manager
        .register_provider(
            "AES128",
            Arc::new(CryptoProvider::aes128(aes_store(AES_128_KEY, true))),
        )
        .unwrap();
    manager
        .register_provider(
            "AES256",
            Arc::new(CryptoProvider::aes256(aes_store(AES_256_KEY, true))),
        )
        .unwrap();
    manager
        .register_provider("RSA", Arc::new(CryptoProvider::rsa(rsa_store(true))))
        .unwrap();
    manager
}
