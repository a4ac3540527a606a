//! Field-level encryption of JSON values.
//!
//! # Responsibilities
//!
//! - Track which fields of a document must be encrypted, and under which
//!   provider alias ([`EncryptionPaths`]).
//! - Replace each declared field with an envelope stored under
//!   `__crypt_<name>` in the same parent object ([`encrypt_marked_fields`]).
//! - Verify and decrypt envelopes back into typed JSON values
//!   ([`decrypt_field`], [`decrypt_tree`]).
//!
//! # Module invariants
//!
//! - A field's plaintext is serialised with `serde_json` before encryption and
//!   parsed back after decryption, so integers stay integers, floats stay
//!   floats and arrays keep their element order and types.
//! - The encrypt and decrypt passes take the tree by exclusive reference:
//!   one writer per document at a time. Distinct documents can be processed
//!   in parallel against the same shared [`crate::manager::CryptoManager`].

pub mod decrypt;
pub mod encrypt;
pub mod path;

pub use decrypt::{decrypt_field, decrypt_in_place, decrypt_tree, open};
pub use encrypt::{encrypt_marked_fields, seal};
pub use path::{escape_segment, parse_path, unescape_segment, EncryptionPaths};
