//! Wire types for encrypted fields and encoded documents.
//!
//! An encrypted field is stored in its parent object under
//! `__crypt_<fieldname>` as an [`Envelope`] object; the plaintext key is
//! removed. These types are serialised as plain JSON and carry no crypto
//! dependencies.

use serde::{Deserialize, Serialize};

/// Prefix marking a key whose value is an [`Envelope`] rather than plaintext.
pub const ENCRYPTION_PREFIX: &str = "__crypt_";

// ---------------------------------------------------------------------------
// Envelope
// ---------------------------------------------------------------------------

/// On-the-wire representation of one encrypted field.
///
/// ```text
/// {"alg": "...", "kid": "...", "iv": "<b64>", "ciphertext": "<b64>", "sig": "<b64>"}
/// ```
///
/// `iv` is present iff the provider prepends an IV; `sig` is present iff the
/// provider has a signing key configured.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    /// Algorithm name of the provider that sealed the field.
    pub alg: String,
    /// Public/encryption key name taken from the key store at encryption time.
    pub kid: String,
    /// Standard base64 IV.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iv: Option<String>,
    /// Standard base64 ciphertext with the IV stripped out.
    pub ciphertext: String,
    /// Standard base64 HMAC over [`Envelope::signing_input`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sig: Option<String>,
}

impl Envelope {
    /// The message covered by `sig`: `kid || alg || iv? || ciphertext`, as the
    /// envelope's own strings concatenated in that fixed order.
    pub fn signing_input(&self) -> String {
        let iv = self.iv.as_deref().unwrap_or_default();
        let mut out =
            String::with_capacity(self.kid.len() + self.alg.len() + iv.len() + self.ciphertext.len());
        out.push_str(&self.kid);
        out.push_str(&self.alg);
        out.push_str(iv);
        out.push_str(&self.ciphertext);
        out
    }

    /// Convert to a JSON object value for insertion into a document.
    pub fn to_value(&self) -> serde_json::Value {
        let mut map = serde_json::Map::new();
        map.insert("alg".into(), self.alg.clone().into());
        map.insert("kid".into(), self.kid.clone().into());
        if let Some(iv) = &self.iv {
            map.insert("iv".into(), iv.clone().into());
        }
        map.insert("ciphertext".into(), self.ciphertext.clone().into());
        if let Some(sig) = &self.sig {
            map.insert("sig".into(), sig.clone().into());
        }
        serde_json::Value::Object(map)
    }

    /// Parse an envelope out of a document value.
    ///
    /// # Errors
    ///
    /// Returns the underlying [`serde_json::Error`] if `value` is not an object
    /// or lacks `alg`, `kid` or `ciphertext`.
    pub fn from_value(value: &serde_json::Value) -> Result<Self, serde_json::Error> {
        Self::deserialize(value)
    }
}

/// `name` → `__crypt_name`.
pub fn encrypted_field_name(name: &str) -> String {
    format!("{ENCRYPTION_PREFIX}{name}")
}

/// `__crypt_name` → `Some("name")`; anything else → `None`.
pub fn plain_field_name(key: &str) -> Option<&str> {
    key.strip_prefix(ENCRYPTION_PREFIX)
}

// ---------------------------------------------------------------------------
// Document flags
// ---------------------------------------------------------------------------

/// Mask selecting the common-format nibble of document flags.
pub const COMMON_FORMAT_MASK: u32 = 0x0F00_0000;

/// Common flags for JSON content.
pub const JSON_COMMON_FLAGS: u32 = 2 << 24;

/// Legacy flags for JSON content (shared with strings).
pub const JSON_LEGACY_FLAGS: u32 = 0;

/// Flags written for every encoded JSON document.
pub const JSON_COMPAT_FLAGS: u32 = JSON_COMMON_FLAGS | JSON_LEGACY_FLAGS;

/// Returns `true` if `flags` describe JSON content, either through the
/// common-format nibble or the legacy value.
pub fn has_json_flags(flags: u32) -> bool {
    let has_common = (flags >> 24) > 0;
    (has_common && flags & COMMON_FORMAT_MASK == JSON_COMMON_FLAGS) || flags == JSON_LEGACY_FLAGS
}
