//! AES-CBC encryption and HMAC-SHA256 signing of individual field payloads.
//!
//! **Layout:** every call draws a fresh 128-bit IV from the OS CSPRNG and
//! returns `iv || ciphertext`. PKCS#7 padding is always applied, so the
//! ciphertext is a non-empty multiple of the block size.
//!
//! CBC is unauthenticated on its own. Envelopes carry an HMAC-SHA256 `sig`
//! over the IV and ciphertext, which must be checked before [`decrypt_cbc`]
//! is called.

use aes::{Aes128, Aes256};
use cbc::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use hmac::{Hmac, Mac};
use rand::{rngs::OsRng, RngCore};
use sha2::Sha256;
use thiserror::Error;

/// Byte length of an AES-128 key.
pub const AES_128_KEY_LEN: usize = 16;

/// Byte length of an AES-256 key.
pub const AES_256_KEY_LEN: usize = 32;

/// Byte length of the CBC IV (one AES block).
pub const IV_LEN: usize = 16;

type HmacSha256 = Hmac<Sha256>;

/// Errors produced by the cipher layer.
#[derive(Debug, Error)]
pub enum CipherError {
    /// The key is neither [`AES_128_KEY_LEN`] nor [`AES_256_KEY_LEN`] bytes.
    #[error("invalid AES key length: {0} bytes")]
    InvalidKeyLength(usize),

    /// The input is too short to hold an IV and one block.
    #[error("ciphertext too short: {0} bytes")]
    Truncated(usize),

    /// Padding was invalid after decryption (wrong key or corrupted data).
    #[error("invalid padding")]
    Padding,

    /// The HMAC could not be keyed.
    #[error("invalid HMAC key")]
    InvalidMacKey,
}

/// Encrypt `plaintext` with AES-CBC under `key`, returning `iv || ciphertext`.
///
/// The key length selects AES-128 or AES-256.
///
/// # Errors
///
/// Returns [`CipherError::InvalidKeyLength`] for any other key length.
pub fn encrypt_cbc(key: &[u8], plaintext: &[u8]) -> Result<Vec<u8>, CipherError> {
    let mut iv = [0u8; IV_LEN];
    OsRng.fill_bytes(&mut iv);

    let ciphertext = match key.len() {
        AES_128_KEY_LEN => seal::<cbc::Encryptor<Aes128>>(key, &iv, plaintext)?,
        AES_256_KEY_LEN => seal::<cbc::Encryptor<Aes256>>(key, &iv, plaintext)?,
        other => return Err(CipherError::InvalidKeyLength(other)),
    };

    let mut out = Vec::with_capacity(IV_LEN + ciphertext.len());
    out.extend_from_slice(&iv);
    out.extend_from_slice(&ciphertext);
    Ok(out)
}

/// Decrypt `iv || ciphertext` produced by [`encrypt_cbc`].
///
/// # Errors
///
/// Returns [`CipherError::InvalidKeyLength`] for a bad key,
/// [`CipherError::Truncated`] if `data` cannot hold an IV plus one block, and
/// [`CipherError::Padding`] if the plaintext padding is corrupt.
pub fn decrypt_cbc(key: &[u8], data: &[u8]) -> Result<Vec<u8>, CipherError> {
    if data.len() < IV_LEN * 2 {
        return Err(CipherError::Truncated(data.len()));
    }
    let (iv, ciphertext) = data.split_at(IV_LEN);

    match key.len() {
        AES_128_KEY_LEN => open::<cbc::Decryptor<Aes128>>(key, iv, ciphertext),
        AES_256_KEY_LEN => open::<cbc::Decryptor<Aes256>>(key, iv, ciphertext),
        other => Err(CipherError::InvalidKeyLength(other)),
    }
}

fn seal<C>(key: &[u8], iv: &[u8], plaintext: &[u8]) -> Result<Vec<u8>, CipherError>
where
    C: KeyIvInit + BlockEncryptMut,
{
    let cipher = C::new_from_slices(key, iv).map_err(|_| CipherError::InvalidKeyLength(key.len()))?;
    Ok(cipher.encrypt_padded_vec_mut::<Pkcs7>(plaintext))
}

fn open<C>(key: &[u8], iv: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>, CipherError>
where
    C: KeyIvInit + BlockDecryptMut,
{
    let cipher = C::new_from_slices(key, iv).map_err(|_| CipherError::InvalidKeyLength(key.len()))?;
    cipher
        .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
        .map_err(|_| CipherError::Padding)
}

/// HMAC-SHA256 of `message` under `key`.
///
/// # Errors
///
/// Returns [`CipherError::InvalidMacKey`] if the MAC cannot be keyed.
pub fn sign(key: &[u8], message: &[u8]) -> Result<Vec<u8>, CipherError> {
    let mut mac = HmacSha256::new_from_slice(key).map_err(|_| CipherError::InvalidMacKey)?;
    mac.update(message);
    Ok(mac.finalize().into_bytes().to_vec())
}

/// Constant-time check of `signature` against HMAC-SHA256 of `message`.
///
/// Fails closed: any keying error yields `false`.
pub fn verify(key: &[u8], message: &[u8], signature: &[u8]) -> bool {
    let Ok(mut mac) = HmacSha256::new_from_slice(key) else {
        return false;
    };
    mac.update(message);
    mac.verify_slice(signature).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::{engine::general_purpose::STANDARD, Engine as _};

    fn random_key(len: usize) -> Vec<u8> {
        let mut key = vec![0u8; len];
        OsRng.fill_bytes(&mut key);
        key
    }

    #[test]
    fn encrypt_decrypt_round_trip() {
        for len in [AES_128_KEY_LEN, AES_256_KEY_LEN] {
            let key = random_key(len);
            let sealed = encrypt_cbc(&key, b"123-45-6789").unwrap();
            assert_eq!(decrypt_cbc(&key, &sealed).unwrap(), b"123-45-6789");
        }
    }

    #[test]
    fn output_is_iv_plus_padded_blocks() {
        let key = random_key(AES_256_KEY_LEN);
        // 16 bytes of plaintext gain a full block of padding.
        let sealed = encrypt_cbc(&key, &[0u8; 16]).unwrap();
        assert_eq!(sealed.len(), IV_LEN + 32);
        let sealed = encrypt_cbc(&key, b"").unwrap();
        assert_eq!(sealed.len(), IV_LEN + 16);
    }

    #[test]
    fn fresh_iv_per_call() {
        let key = random_key(AES_128_KEY_LEN);
        let a = encrypt_cbc(&key, b"same").unwrap();
        let b = encrypt_cbc(&key, b"same").unwrap();
        assert_ne!(a[..IV_LEN], b[..IV_LEN]);
    }

    #[test]
    fn invalid_key_length_rejected() {
        assert!(matches!(
            encrypt_cbc(&[0u8; 24], b"x"),
            Err(CipherError::InvalidKeyLength(24))
        ));
        assert!(matches!(
            decrypt_cbc(&[0u8; 5], &[0u8; 32]),
            Err(CipherError::InvalidKeyLength(5))
        ));
    }

    #[test]
    fn truncated_input_rejected() {
        let key = random_key(AES_256_KEY_LEN);
        assert!(matches!(
            decrypt_cbc(&key, &[0u8; 20]),
            Err(CipherError::Truncated(20))
        ));
    }

    #[test]
    fn wrong_key_fails_decryption() {
        let sealed = encrypt_cbc(&random_key(32), b"secret value").unwrap();
        // A wrong key yields garbage that almost never carries valid padding;
        // when it does, the bytes still differ from the plaintext.
        match decrypt_cbc(&random_key(32), &sealed) {
            Ok(bytes) => assert_ne!(bytes, b"secret value"),
            Err(e) => assert!(matches!(e, CipherError::Padding)),
        }
    }

    #[test]
    fn known_vector_decrypts() {
        let key = b"!mysecretkey#9^5usdk39d&dlf)03sL";
        let mut data = STANDARD.decode("wAg/Z+c81em+to/rR9T3PA==").unwrap();
        data.extend(STANDARD.decode("bvfUk9qkfCYKS2S5CCJPpg==").unwrap());
        assert_eq!(decrypt_cbc(key, &data).unwrap(), b"10");
    }

    #[test]
    fn known_vector_signature() {
        let message = "mypublickeyAES-256-HMAC-SHA256wAg/Z+c81em+to/rR9T3PA==bvfUk9qkfCYKS2S5CCJPpg==";
        let sig = sign(b"myauthpassword", message.as_bytes()).unwrap();
        assert_eq!(
            STANDARD.encode(&sig),
            "LAcwxznVSED4zQbuy+UjacQlvtVYvpVmiiAU5gJJASc="
        );
        assert!(verify(b"myauthpassword", message.as_bytes(), &sig));
    }

    #[test]
    fn tampered_message_fails_verification() {
        let sig = sign(b"k", b"message").unwrap();
        assert!(!verify(b"k", b"messagf", &sig));
        assert!(!verify(b"other", b"message", &sig));
        assert!(!verify(b"k", b"message", &sig[..31]));
    }
}
