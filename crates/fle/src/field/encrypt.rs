//! Encrypt pass: replace declared fields with envelopes.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use common::protocol::encrypted_field_name;
use common::{CryptoError, Envelope};
use serde_json::{Map, Value};
use tracing::debug;

use super::path::{parse_path, EncryptionPaths};
use crate::manager::CryptoManager;
use crate::provider::CryptoProvider;

/// Encrypt every field declared in `paths` inside `root`, then clear `paths`.
///
/// Declarations are applied in reverse lexicographic order, so a field
/// declared inside another declared field is sealed before its parent.
///
/// All paths are resolved before anything is encrypted: an unresolvable path
/// fails with [`CryptoError::PathResolution`] and leaves `root` untouched.
/// After that, the first failing field aborts the pass with
/// [`CryptoError::FieldEncryptFailed`]; fields sealed before it stay sealed
/// and are listed in the error. `paths` is only cleared on success.
///
/// # Errors
///
/// - [`CryptoError::PathResolution`] if `root` is not an object or a path
///   does not resolve to an existing key inside nested objects.
/// - [`CryptoError::FieldEncryptFailed`] wrapping the cause of a field failure.
pub fn encrypt_marked_fields(
    root: &mut Value,
    paths: &mut EncryptionPaths,
    manager: &CryptoManager,
) -> Result<(), CryptoError> {
    if paths.is_empty() {
        return Ok(());
    }
    let Value::Object(map) = root else {
        return Err(CryptoError::PathResolution {
            path: String::new(),
            reason: "document root is not an object".into(),
        });
    };
    encrypt_fields_in(map, paths, manager)
}

/// [`encrypt_marked_fields`] over a root object.
pub(crate) fn encrypt_fields_in(
    root: &mut Map<String, Value>,
    paths: &mut EncryptionPaths,
    manager: &CryptoManager,
) -> Result<(), CryptoError> {
    for (path, _) in paths.iter() {
        resolve(root, path)?;
    }

    let mut completed: Vec<String> = Vec::with_capacity(paths.len());
    for (path, alias) in paths.iter().rev() {
        if let Err(source) = encrypt_path(root, path, alias, manager) {
            return Err(CryptoError::FieldEncryptFailed {
                path: path.to_owned(),
                source: Box::new(source),
                completed,
            });
        }
        completed.push(path.to_owned());
    }

    debug!(fields = completed.len(), "encrypted declared fields");
    paths.clear();
    Ok(())
}

/// Seal `value` into an envelope with `provider`.
///
/// # Errors
///
/// Propagates provider errors; [`CryptoError::MissingPublicKey`] if the key
/// store has no public key name to use as `kid`.
pub fn seal(provider: &CryptoProvider, value: &Value) -> Result<Envelope, CryptoError> {
    let alg = provider.algorithm_name();
    let kid = provider
        .key_store()
        .public_key_name()
        .ok_or(CryptoError::MissingPublicKey { algorithm: alg })?
        .to_owned();

    let plaintext = serde_json::to_vec(value)?;
    let sealed = provider.encrypt(&plaintext)?;

    let iv_size = provider.iv_size();
    let (iv, ciphertext) = if iv_size > 0 {
        if sealed.len() <= iv_size {
            return Err(CryptoError::EncryptFailed {
                algorithm: alg,
                reason: format!("output of {} bytes holds no ciphertext", sealed.len()),
            });
        }
        let (iv, ciphertext) = sealed.split_at(iv_size);
        (Some(STANDARD.encode(iv)), ciphertext)
    } else {
        (None, sealed.as_slice())
    };

    let mut envelope = Envelope {
        alg: alg.to_owned(),
        kid,
        iv,
        ciphertext: STANDARD.encode(ciphertext),
        sig: None,
    };
    if let Some(sig) = provider.signature(envelope.signing_input().as_bytes())? {
        envelope.sig = Some(STANDARD.encode(sig));
    }
    Ok(envelope)
}

fn encrypt_path(
    root: &mut Map<String, Value>,
    path: &str,
    alias: &str,
    manager: &CryptoManager,
) -> Result<(), CryptoError> {
    let segments = parse_path(path);
    let (leaf, parents) = segments
        .split_last()
        .ok_or_else(|| unresolved(path, "path has no segments"))?;
    let parent = parent_object_mut(root, parents, path)?;
    let value = parent
        .get(leaf)
        .ok_or_else(|| unresolved(path, &format!("key `{leaf}` not found")))?;

    let provider = manager.get_provider(alias)?;
    let envelope = seal(&provider, value)?;

    parent.remove(leaf);
    parent.insert(encrypted_field_name(leaf), envelope.to_value());
    debug!(alias, algorithm = provider.algorithm_name(), "field sealed");
    Ok(())
}

/// Check that `path` names an existing key reachable through objects only,
/// and that no envelope is already stored for it.
fn resolve<'a>(root: &'a Map<String, Value>, path: &str) -> Result<&'a Value, CryptoError> {
    let segments = parse_path(path);
    let mut current = root;
    let (leaf, parents) = segments
        .split_last()
        .ok_or_else(|| unresolved(path, "path has no segments"))?;
    for segment in parents {
        current = match current.get(segment) {
            Some(Value::Object(map)) => map,
            Some(_) => return Err(unresolved(path, &format!("`{segment}` is not an object"))),
            None => return Err(unresolved(path, &format!("key `{segment}` not found"))),
        };
    }
    let sealed = encrypted_field_name(leaf);
    if current.contains_key(&sealed) {
        return Err(unresolved(path, &format!("`{sealed}` is already present")));
    }
    current
        .get(leaf)
        .ok_or_else(|| unresolved(path, &format!("key `{leaf}` not found")))
}

fn parent_object_mut<'a>(
    root: &'a mut Map<String, Value>,
    parents: &[String],
    path: &str,
) -> Result<&'a mut Map<String, Value>, CryptoError> {
    let mut current = root;
    for segment in parents {
        current = match current.get_mut(segment) {
            Some(Value::Object(map)) => map,
            Some(_) => return Err(unresolved(path, &format!("`{segment}` is not an object"))),
            None => return Err(unresolved(path, &format!("key `{segment}` not found"))),
        };
    }
    Ok(current)
}

fn unresolved(path: &str, reason: &str) -> CryptoError {
    CryptoError::PathResolution {
        path: path.to_owned(),
        reason: reason.to_owned(),
    }
}
