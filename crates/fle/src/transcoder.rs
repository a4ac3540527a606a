//! Encode/decode of [`JsonDocument`]s with field-level encryption applied.
//!
//! Encode runs the encrypt pass before serialising. Decode only parses: the
//! returned document carries the manager so the caller can decrypt the fields
//! it needs under the alias of its choice.

use bytes::Bytes;
use common::protocol::{has_json_flags, JSON_COMPAT_FLAGS};
use common::CryptoError;
use serde_json::Value;
use tracing::debug;

use crate::document::{JsonContent, JsonDocument};
use crate::manager::CryptoManager;

/// Serialised document content plus the flags stored alongside it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedDocument {
    /// Serialised JSON object.
    pub content: Bytes,
    /// Flags to store alongside `content`.
    pub flags: u32,
}

/// Transcoder for JSON documents whose declared fields are encrypted on the
/// way out.
#[derive(Debug, Clone, Default)]
pub struct JsonCryptoTranscoder {
    manager: CryptoManager,
}

impl JsonCryptoTranscoder {
    /// A transcoder encrypting and decrypting through `manager`.
    pub fn new(manager: CryptoManager) -> Self {
        Self { manager }
    }

    /// The manager attached to decoded documents.
    pub fn manager(&self) -> &CryptoManager {
        &self.manager
    }

    /// Encrypt the declared fields of `document` and serialise it.
    ///
    /// The encrypt pass runs on a copy, so `document` keeps its plaintext.
    /// Its declarations are cleared once the bytes are produced; on failure
    /// nothing is returned and `document` is left as it was.
    ///
    /// # Errors
    ///
    /// Any encrypt-pass error, or [`CryptoError::Transcoding`] if
    /// serialisation fails.
    pub fn encode(&self, document: &mut JsonDocument) -> Result<EncodedDocument, CryptoError> {
        let mut content = document.content().clone();
        let declared = content.encryption_paths().len();
        content.encrypt_declared_with(&self.manager)?;

        let bytes = serde_json::to_vec(content.as_map())?;
        document.content_mut().encryption_paths_mut().clear();
        debug!(
            id = document.id(),
            encrypted_fields = declared,
            size = bytes.len(),
            "document encoded"
        );
        Ok(EncodedDocument {
            content: Bytes::from(bytes),
            flags: JSON_COMPAT_FLAGS,
        })
    }

    /// Parse stored content into a document with this transcoder's manager
    /// attached. No field is decrypted.
    ///
    /// # Errors
    ///
    /// [`CryptoError::Transcoding`] if `flags` do not describe JSON, or the
    /// content is not a JSON object.
    pub fn decode(
        &self,
        id: &str,
        content: &[u8],
        cas: u64,
        expiry: u32,
        flags: u32,
    ) -> Result<JsonDocument, CryptoError> {
        if !has_json_flags(flags) {
            return Err(CryptoError::Transcoding(format!(
                "flags 0x{flags:08x} of document `{id}` do not describe JSON content"
            )));
        }

        let map = match serde_json::from_slice::<Value>(content)? {
            Value::Object(map) => map,
            other => {
                return Err(CryptoError::Transcoding(format!(
                    "document `{id}` is not a JSON object (found {})",
                    json_type(&other)
                )))
            }
        };

        debug!(id, fields = map.len(), "document decoded");
        let mut content = JsonContent::from_map(map);
        content.set_crypto_manager(self.manager.clone());
        Ok(JsonDocument::create(id, content)
            .with_cas(cas)
            .with_expiry(expiry))
    }

    /// Build a document from content, attaching this transcoder's manager.
    pub fn new_document(&self, id: impl Into<String>, mut content: JsonContent) -> JsonDocument {
        content.set_crypto_manager(self.manager.clone());
        JsonDocument::create(id, content)
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
