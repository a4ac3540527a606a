//! Envelope wire format and error taxonomy shared across the field-level encryption crates.

pub mod error;
pub mod protocol;

pub use error::{CryptoError, ErrorKind};
pub use protocol::Envelope;
