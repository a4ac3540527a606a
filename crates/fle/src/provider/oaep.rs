//! RSA-OAEP (SHA-1, MGF1-SHA-1) encryption of individual field payloads.
//!
//! Public keys are SPKI DER, private keys PKCS#8 DER. The modulus must be
//! exactly [`MODULUS_BITS`] bits. No IV is produced.

use rand::rngs::OsRng;
use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey};
use rsa::traits::PublicKeyParts;
use rsa::{Oaep, RsaPrivateKey, RsaPublicKey};
use sha1::Sha1;
use thiserror::Error;

/// Required modulus size.
pub const MODULUS_BITS: usize = 2048;

/// Errors produced by the RSA layer.
#[derive(Debug, Error)]
pub enum RsaCipherError {
    /// The DER blob could not be decoded.
    #[error("malformed key: {0}")]
    MalformedKey(String),

    /// The modulus is not [`MODULUS_BITS`] bits.
    #[error("unexpected modulus size: {0} bits")]
    ModulusSize(usize),

    /// OAEP encryption or decryption failed.
    #[error("{0}")]
    Oaep(rsa::Error),
}

/// Encrypt `plaintext` under the SPKI DER public key `public_der`.
///
/// # Errors
///
/// Returns [`RsaCipherError::MalformedKey`] or [`RsaCipherError::ModulusSize`]
/// for unusable key material and [`RsaCipherError::Oaep`] if the plaintext is
/// too long for a single OAEP block.
pub fn encrypt_oaep(public_der: &[u8], plaintext: &[u8]) -> Result<Vec<u8>, RsaCipherError> {
    let key = RsaPublicKey::from_public_key_der(public_der)
        .map_err(|e| RsaCipherError::MalformedKey(e.to_string()))?;
    check_modulus(key.size())?;
    key.encrypt(&mut OsRng, Oaep::new::<Sha1>(), plaintext)
        .map_err(RsaCipherError::Oaep)
}

/// Decrypt `ciphertext` with the PKCS#8 DER private key `private_der`.
///
/// # Errors
///
/// As for [`encrypt_oaep`]; [`RsaCipherError::Oaep`] also covers wrong-key and
/// corrupted-ciphertext failures.
pub fn decrypt_oaep(private_der: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>, RsaCipherError> {
    let key = RsaPrivateKey::from_pkcs8_der(private_der)
        .map_err(|e| RsaCipherError::MalformedKey(e.to_string()))?;
    check_modulus(key.size())?;
    key.decrypt(Oaep::new::<Sha1>(), ciphertext)
        .map_err(RsaCipherError::Oaep)
}

fn check_modulus(size_bytes: usize) -> Result<(), RsaCipherError> {
    let bits = size_bytes * 8;
    if bits == MODULUS_BITS {
        Ok(())
    } else {
        Err(RsaCipherError::ModulusSize(bits))
    }
}
