//! Error taxonomy for the field-level encryption engine.

use thiserror::Error;

/// Every failure the engine can report.
///
/// Callers branch on [`CryptoError::kind`] rather than on message text.
/// Variants that wrap another error ([`CryptoError::FieldEncryptFailed`],
/// [`CryptoError::InField`]) name the document path or alias involved.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// Alias was empty at registration or lookup.
    #[error("cryptographic providers require a non-empty alias")]
    AliasInvalid,

    /// No provider is registered under the alias.
    #[error("no cryptographic provider registered for alias `{alias}`")]
    ProviderNotFound { alias: String },

    /// The key store has no key stored under `name`.
    #[error("key `{name}` not found in key store")]
    KeyNotFound { name: String },

    /// The key store has no public key name configured.
    #[error("{algorithm} requires a public key name (kid) to be configured")]
    MissingPublicKey { algorithm: &'static str },

    /// The key store has no private key name configured.
    #[error("{algorithm} requires a private key name to be configured")]
    MissingPrivateKey { algorithm: &'static str },

    /// The envelope is signed but the key store has no signing key name.
    #[error("{algorithm} requires a signing key name to verify signed envelopes")]
    MissingSigningKey { algorithm: &'static str },

    /// Key material has the wrong size for the algorithm.
    #[error("{algorithm} requires a {expected}-{unit} key, got {actual}")]
    KeySize {
        algorithm: &'static str,
        expected: usize,
        actual: usize,
        unit: &'static str,
    },

    /// Key material could not be decoded (e.g. malformed DER).
    #[error("{algorithm} key material is invalid: {reason}")]
    InvalidKey {
        algorithm: &'static str,
        reason: String,
    },

    /// The cipher refused to encrypt the plaintext.
    #[error("{algorithm} encryption failed: {reason}")]
    EncryptFailed {
        algorithm: &'static str,
        reason: String,
    },

    /// Encrypting one declared field failed. Fields listed in `completed`
    /// were already replaced by envelopes in the same pass.
    #[error(
        "failed to encrypt field `{path}`{}: {source}",
        partial_note(.completed)
    )]
    FieldEncryptFailed {
        path: String,
        #[source]
        source: Box<CryptoError>,
        completed: Vec<String>,
    },

    /// Cipher, padding or authentication failure while decrypting.
    #[error("{algorithm} decryption failed: {reason}")]
    DecryptFailed {
        algorithm: &'static str,
        reason: String,
    },

    /// HMAC computation failed.
    #[error("{algorithm} signing failed: {reason}")]
    SigningFailed {
        algorithm: &'static str,
        reason: String,
    },

    /// The envelope's `sig` does not match the recomputed signature.
    #[error("signature verification failed for {algorithm} envelope")]
    SignatureVerification { algorithm: &'static str },

    /// The envelope verified but describes a different algorithm or key.
    #[error("envelope `{member}` is `{found}`, provider expects `{expected}`")]
    EnvelopeMismatch {
        member: &'static str,
        expected: String,
        found: String,
    },

    /// A declared path does not resolve to an encryptable leaf.
    #[error("path `{path}` cannot be resolved: {reason}")]
    PathResolution { path: String, reason: String },

    /// Content could not be parsed or serialised as JSON.
    #[error("transcoding failed: {0}")]
    Transcoding(String),

    /// Decryption was requested on content with no crypto manager attached.
    #[error("no crypto manager attached to this content")]
    CryptoManagerMissing,

    /// A decrypt-side failure, annotated with the field and alias involved.
    #[error("field `{field}` (alias `{alias}`): {source}")]
    InField {
        field: String,
        alias: String,
        #[source]
        source: Box<CryptoError>,
    },
}

/// Discriminant of [`CryptoError`].
///
/// [`CryptoError::InField`] reports the kind of the error it wraps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    AliasInvalid,
    ProviderNotFound,
    KeyNotFound,
    MissingPublicKey,
    MissingPrivateKey,
    MissingSigningKey,
    KeySize,
    InvalidKey,
    EncryptFailed,
    DecryptFailed,
    SigningFailed,
    SignatureVerification,
    EnvelopeMismatch,
    PathResolution,
    Transcoding,
    CryptoManagerMissing,
}

impl CryptoError {
    /// The failure kind.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::AliasInvalid => ErrorKind::AliasInvalid,
            Self::ProviderNotFound { .. } => ErrorKind::ProviderNotFound,
            Self::KeyNotFound { .. } => ErrorKind::KeyNotFound,
            Self::MissingPublicKey { .. } => ErrorKind::MissingPublicKey,
            Self::MissingPrivateKey { .. } => ErrorKind::MissingPrivateKey,
            Self::MissingSigningKey { .. } => ErrorKind::MissingSigningKey,
            Self::KeySize { .. } => ErrorKind::KeySize,
            Self::InvalidKey { .. } => ErrorKind::InvalidKey,
            Self::EncryptFailed { .. } | Self::FieldEncryptFailed { .. } => {
                ErrorKind::EncryptFailed
            }
            Self::DecryptFailed { .. } => ErrorKind::DecryptFailed,
            Self::SigningFailed { .. } => ErrorKind::SigningFailed,
            Self::SignatureVerification { .. } => ErrorKind::SignatureVerification,
            Self::EnvelopeMismatch { .. } => ErrorKind::EnvelopeMismatch,
            Self::PathResolution { .. } => ErrorKind::PathResolution,
            Self::Transcoding(_) => ErrorKind::Transcoding,
            Self::CryptoManagerMissing => ErrorKind::CryptoManagerMissing,
            Self::InField { source, .. } => source.kind(),
        }
    }

    /// The innermost error, looking through [`CryptoError::FieldEncryptFailed`]
    /// and [`CryptoError::InField`].
    pub fn root_cause(&self) -> &CryptoError {
        match self {
            Self::FieldEncryptFailed { source, .. } | Self::InField { source, .. } => {
                source.root_cause()
            }
            other => other,
        }
    }

    /// Returns `true` if the document this error came from may have been
    /// left with some fields encrypted and others not.
    pub fn is_partial(&self) -> bool {
        matches!(self, Self::FieldEncryptFailed { completed, .. } if !completed.is_empty())
    }

    /// Wrap a decrypt-side error with the field and alias it concerns.
    pub fn in_field(self, field: impl Into<String>, alias: impl Into<String>) -> Self {
        Self::InField {
            field: field.into(),
            alias: alias.into(),
            source: Box::new(self),
        }
    }
}

impl From<serde_json::Error> for CryptoError {
    fn from(e: serde_json::Error) -> Self {
        Self::Transcoding(e.to_string())
    }
}

fn partial_note(completed: &[String]) -> String {
    if completed.is_empty() {
        String::new()
    } else {
        format!(
            " (document partially encrypted: {} already sealed)",
            completed.join(", ")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_field_reports_inner_kind() {
        let e = CryptoError::SignatureVerification {
            algorithm: "AES-256-HMAC-SHA256",
        }
        .in_field("message", "AES");
        assert_eq!(e.kind(), ErrorKind::SignatureVerification);
        let msg = e.to_string();
        assert!(msg.contains("message"));
        assert!(msg.contains("AES"));
    }

    #[test]
    fn field_encrypt_failed_is_encrypt_kind() {
        let e = CryptoError::FieldEncryptFailed {
            path: "ssn".into(),
            source: Box::new(CryptoError::ProviderNotFound { alias: "x".into() }),
            completed: vec![],
        };
        assert_eq!(e.kind(), ErrorKind::EncryptFailed);
        assert_eq!(e.root_cause().kind(), ErrorKind::ProviderNotFound);
        assert!(!e.is_partial());
        assert!(!e.to_string().contains("partially"));
    }

    #[test]
    fn partial_failure_names_completed_paths() {
        let e = CryptoError::FieldEncryptFailed {
            path: "b".into(),
            source: Box::new(CryptoError::AliasInvalid),
            completed: vec!["a".into()],
        };
        assert!(e.is_partial());
        let msg = e.to_string();
        assert!(msg.contains("partially encrypted"), "{msg}");
        assert!(msg.contains("`b`"), "{msg}");
    }

    #[test]
    fn key_size_display() {
        let e = CryptoError::KeySize {
            algorithm: "AES-128-HMAC-SHA256",
            expected: 16,
            actual: 32,
            unit: "byte",
        };
        assert_eq!(
            e.to_string(),
            "AES-128-HMAC-SHA256 requires a 16-byte key, got 32"
        );
    }

    #[test]
    fn serde_errors_become_transcoding() {
        let parse = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        assert_eq!(CryptoError::from(parse).kind(), ErrorKind::Transcoding);
    }
}
