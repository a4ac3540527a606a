//! `fle` - field-level encryption for JSON documents.
//!
//! Selected fields of a document are replaced, before it is written, by a
//! signed envelope stored under `__crypt_<name>`; readers holding the keys
//! decrypt them back into typed JSON values.
//!
//! Setup:
//! 1. Build a [`KeyStore`] (by hand or from [`config::KeyStoreConfig`]).
//! 2. Wrap it in a [`CryptoProvider`] for one algorithm.
//! 3. Register the provider under an alias in a shared [`CryptoManager`].
//! 4. Declare fields with [`JsonContent::put_and_encrypt`] and encode through
//!    a [`JsonCryptoTranscoder`], or drive [`field::encrypt_marked_fields`]
//!    directly on a `serde_json::Value`.

pub mod config;
pub mod document;
pub mod field;
pub mod keystore;
pub mod manager;
pub mod provider;
pub mod telemetry;
pub mod transcoder;

#[cfg(test)]
mod test_support;

pub use common::protocol::{Envelope, ENCRYPTION_PREFIX};
pub use common::{CryptoError, ErrorKind};
pub use document::{JsonContent, JsonDocument};
pub use keystore::{KeyBytes, KeyRole, KeyStore};
pub use manager::CryptoManager;
pub use provider::{Algorithm, CryptoProvider};
pub use transcoder::{EncodedDocument, JsonCryptoTranscoder};
