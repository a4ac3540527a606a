//! Decrypt pass: verify envelopes and restore plaintext values.
//!
//! The provider is always chosen by the caller-supplied alias, never by the
//! envelope's own `alg`; the envelope only has to agree with it.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use common::protocol::{encrypted_field_name, plain_field_name};
use common::{CryptoError, Envelope};
use serde_json::{Map, Value};
use tracing::debug;

use super::path::escape_segment;
use crate::manager::CryptoManager;
use crate::provider::CryptoProvider;

/// Verify and decrypt one envelope with `provider`.
///
/// Order of checks: signature (if `sig` is present), then `alg` and `kid`
/// against the provider, then decryption. A tampered envelope therefore
/// always fails with [`CryptoError::SignatureVerification`].
///
/// # Errors
///
/// - [`CryptoError::MissingSigningKey`] if the envelope is signed but the
///   provider has no signing key name.
/// - [`CryptoError::SignatureVerification`] if `sig` does not verify.
/// - [`CryptoError::EnvelopeMismatch`] if `alg` or `kid` disagree with the provider.
/// - [`CryptoError::Transcoding`] for bad base64 or a non-JSON plaintext.
/// - Provider decryption errors.
pub fn open(provider: &CryptoProvider, envelope: &Envelope) -> Result<Value, CryptoError> {
    let alg = provider.algorithm_name();

    if let Some(sig) = &envelope.sig {
        if provider.key_store().signing_key_name().is_none() {
            return Err(CryptoError::MissingSigningKey { algorithm: alg });
        }
        let verified = STANDARD
            .decode(sig)
            .map(|sig| provider.verify_signature(envelope.signing_input().as_bytes(), &sig))
            .unwrap_or(false);
        if !verified {
            return Err(CryptoError::SignatureVerification { algorithm: alg });
        }
    }

    if !provider.check_algorithm_name_match(&envelope.alg) {
        return Err(CryptoError::EnvelopeMismatch {
            member: "alg",
            expected: alg.to_owned(),
            found: envelope.alg.clone(),
        });
    }
    let kid = provider
        .key_store()
        .public_key_name()
        .ok_or(CryptoError::MissingPublicKey { algorithm: alg })?;
    if envelope.kid != kid {
        return Err(CryptoError::EnvelopeMismatch {
            member: "kid",
            expected: kid.to_owned(),
            found: envelope.kid.clone(),
        });
    }

    let mut sealed = match &envelope.iv {
        Some(iv) => decode_member("iv", iv)?,
        None => Vec::new(),
    };
    sealed.extend(decode_member("ciphertext", &envelope.ciphertext)?);

    let plaintext = provider.decrypt(&sealed)?;
    Ok(serde_json::from_slice(&plaintext)?)
}

/// Decrypt the envelope stored under `__crypt_<name>` in `object`.
///
/// # Errors
///
/// [`CryptoError::PathResolution`] if there is no such entry; otherwise as for
/// [`open`], annotated with the field and alias.
pub fn decrypt_field(
    object: &Map<String, Value>,
    name: &str,
    alias: &str,
    manager: &CryptoManager,
) -> Result<Value, CryptoError> {
    let raw = object
        .get(&encrypted_field_name(name))
        .ok_or_else(|| CryptoError::PathResolution {
            path: escape_segment(name),
            reason: "no encrypted entry for this field".into(),
        })?;
    open_raw(raw, alias, manager).map_err(|e| e.in_field(escape_segment(name), alias))
}

/// Return a copy of `value` with every encrypted entry, at any depth,
/// replaced by its plaintext under the un-prefixed key.
///
/// # Errors
///
/// The first failing field aborts the pass; the error names its path.
/// [`CryptoError::PathResolution`] if an envelope's plaintext key is already
/// taken by a sibling.
pub fn decrypt_tree(value: &Value, alias: &str, manager: &CryptoManager) -> Result<Value, CryptoError> {
    let mut copy = value.clone();
    decrypt_in_place(&mut copy, alias, manager)?;
    Ok(copy)
}

/// Decrypt every encrypted entry of `value` in place, returning how many
/// envelopes were opened.
///
/// Values restored from an envelope are searched again, so fields sealed
/// inside an encrypted parent are restored too. On error `value` may be
/// partially decrypted; use [`decrypt_tree`] to keep the input intact.
///
/// # Errors
///
/// As for [`decrypt_tree`].
pub fn decrypt_in_place(
    value: &mut Value,
    alias: &str,
    manager: &CryptoManager,
) -> Result<usize, CryptoError> {
    let provider = manager.get_provider(alias)?;
    let opened = walk(value, "", alias, &provider)?;
    debug!(alias, fields = opened, "decrypted fields");
    Ok(opened)
}

fn walk(
    value: &mut Value,
    prefix: &str,
    alias: &str,
    provider: &CryptoProvider,
) -> Result<usize, CryptoError> {
    match value {
        Value::Object(map) => {
            let mut opened = 0;
            let sealed: Vec<String> = map
                .keys()
                .filter(|key| plain_field_name(key).is_some())
                .cloned()
                .collect();
            for key in sealed {
                let Some(name) = plain_field_name(&key).map(str::to_owned) else {
                    continue;
                };
                let path = child_path(prefix, &name);
                if map.contains_key(&name) {
                    return Err(CryptoError::PathResolution {
                        path,
                        reason: format!("plaintext `{name}` already present beside `{key}`"),
                    });
                }
                let Some(raw) = map.remove(&key) else {
                    continue;
                };
                let plain = open_with(&raw, provider).map_err(|e| e.in_field(&path, alias))?;
                map.insert(name, plain);
                opened += 1;
            }
            for (key, child) in map.iter_mut() {
                opened += walk(child, &child_path(prefix, key), alias, provider)?;
            }
            Ok(opened)
        }
        Value::Array(items) => {
            let mut opened = 0;
            for (index, item) in items.iter_mut().enumerate() {
                opened += walk(item, &child_path(prefix, &index.to_string()), alias, provider)?;
            }
            Ok(opened)
        }
        _ => Ok(0),
    }
}

fn open_raw(raw: &Value, alias: &str, manager: &CryptoManager) -> Result<Value, CryptoError> {
    let provider = manager.get_provider(alias)?;
    open_with(raw, &provider)
}

fn open_with(raw: &Value, provider: &CryptoProvider) -> Result<Value, CryptoError> {
    let envelope = Envelope::from_value(raw)
        .map_err(|e| CryptoError::Transcoding(format!("malformed envelope: {e}")))?;
    open(provider, &envelope)
}

fn decode_member(member: &str, encoded: &str) -> Result<Vec<u8>, CryptoError> {
    STANDARD
        .decode(encoded)
        .map_err(|e| CryptoError::Transcoding(format!("envelope `{member}` is not base64: {e}")))
}

fn child_path(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        escape_segment(key)
    } else {
        format!("{prefix}/{}", escape_segment(key))
    }
}
