//! Key material lookup by logical name.
//!
//! # Lifecycle
//!
//! 1. At startup the embedding application builds a [`KeyStore`], either by
//!    hand with [`KeyStore::store_key`] or from [`crate::config::KeyStoreConfig`].
//! 2. Role names (public, private, signing) are set for the algorithm that
//!    will own the store.
//! 3. The store is wrapped in an `Arc` and handed to exactly one
//!    [`crate::provider::CryptoProvider`]; from then on it is read-only.
//!
//! # Security invariants
//!
//! - Key bytes are never logged or included in traces; [`KeyBytes`] redacts
//!   itself in `Debug` and zeroes its buffer on drop.

pub mod store;

pub use store::{KeyBytes, KeyRole, KeyStore};
