//! JSON documents carrying request-scoped encryption declarations.

use common::protocol::encrypted_field_name;
use common::CryptoError;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::field::{self, EncryptionPaths};
use crate::manager::CryptoManager;

/// A JSON object plus the fields declared for encryption on the next encode,
/// and the manager used for on-demand decryption after a decode.
#[derive(Debug, Clone, Default)]
pub struct JsonContent {
    map: Map<String, Value>,
    encryption_paths: EncryptionPaths,
    crypto_manager: Option<CryptoManager>,
}

impl JsonContent {
    /// Create empty content.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap an existing object.
    pub fn from_map(map: Map<String, Value>) -> Self {
        Self {
            map,
            ..Self::default()
        }
    }

    /// The value stored under `name`, plaintext or not.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.map.get(name)
    }

    /// Returns `true` if a plaintext entry exists under `name`.
    pub fn contains_key(&self, name: &str) -> bool {
        self.map.contains_key(name)
    }

    /// Returns `true` if `name` is stored as an envelope.
    pub fn is_encrypted(&self, name: &str) -> bool {
        self.map.contains_key(&encrypted_field_name(name))
    }

    /// Store `value` under `name` as plaintext.
    pub fn put(&mut self, name: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.map.insert(name.into(), value.into());
        self
    }

    /// Store `value` under `name` and declare it for encryption under `alias`.
    pub fn put_and_encrypt(
        &mut self,
        name: impl Into<String>,
        value: impl Into<Value>,
        alias: impl Into<String>,
    ) -> &mut Self {
        let name = name.into();
        self.encryption_paths.register_field(&name, alias);
        self.map.insert(name, value.into());
        self
    }

    /// Store a child object under `name`. Fields the child declared for
    /// encryption are re-declared relative to this content.
    pub fn put_content(&mut self, name: impl Into<String>, mut child: JsonContent) -> &mut Self {
        let name = name.into();
        self.encryption_paths.nest(&name, &mut child.encryption_paths);
        self.map.insert(name, Value::Object(child.map));
        self
    }

    /// Remove `name` and any pending encryption declaration for it.
    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.encryption_paths.remove_field(name);
        self.map.remove(name)
    }

    /// Fields declared for encryption on the next encode.
    pub fn encryption_paths(&self) -> &EncryptionPaths {
        &self.encryption_paths
    }

    /// Mutable access to the declarations, for paths below the top level.
    pub fn encryption_paths_mut(&mut self) -> &mut EncryptionPaths {
        &mut self.encryption_paths
    }

    /// Attach the manager used by the decrypt helpers and [`JsonContent::encrypt_declared`].
    pub fn set_crypto_manager(&mut self, manager: CryptoManager) {
        self.crypto_manager = Some(manager);
    }

    /// The attached manager, if any.
    pub fn crypto_manager(&self) -> Option<&CryptoManager> {
        self.crypto_manager.as_ref()
    }

    /// Encrypt every declared field in place with the attached manager.
    ///
    /// # Errors
    ///
    /// [`CryptoError::CryptoManagerMissing`] without a manager; otherwise as
    /// for [`field::encrypt_marked_fields`].
    pub fn encrypt_declared(&mut self) -> Result<(), CryptoError> {
        let manager = self
            .crypto_manager
            .clone()
            .ok_or(CryptoError::CryptoManagerMissing)?;
        self.encrypt_declared_with(&manager)
    }

    pub(crate) fn encrypt_declared_with(&mut self, manager: &CryptoManager) -> Result<(), CryptoError> {
        field::encrypt::encrypt_fields_in(&mut self.map, &mut self.encryption_paths, manager)
    }

    /// Decrypt the envelope stored for `name` under the provider `alias`.
    ///
    /// # Errors
    ///
    /// [`CryptoError::CryptoManagerMissing`] without a manager; otherwise as
    /// for [`field::decrypt_field`].
    pub fn get_and_decrypt(&self, name: &str, alias: &str) -> Result<Value, CryptoError> {
        field::decrypt_field(&self.map, name, alias, self.manager()?)
    }

    /// [`JsonContent::get_and_decrypt`] followed by deserialisation into `T`.
    ///
    /// # Errors
    ///
    /// [`CryptoError::Transcoding`] if the decrypted value does not fit `T`.
    pub fn get_and_decrypt_as<T: DeserializeOwned>(
        &self,
        name: &str,
        alias: &str,
    ) -> Result<T, CryptoError> {
        let value = self.get_and_decrypt(name, alias)?;
        serde_json::from_value(value).map_err(|e| {
            CryptoError::Transcoding(format!("decrypted field `{name}` has unexpected type: {e}"))
        })
    }

    /// A copy of the content with every encrypted field, at any depth,
    /// decrypted under `alias`.
    ///
    /// # Errors
    ///
    /// As for [`field::decrypt_tree`].
    pub fn to_decrypted(&self, alias: &str) -> Result<Map<String, Value>, CryptoError> {
        let mut value = Value::Object(self.map.clone());
        field::decrypt_in_place(&mut value, alias, self.manager()?)?;
        match value {
            Value::Object(map) => Ok(map),
            _ => Err(CryptoError::Transcoding("decrypted content is not an object".into())),
        }
    }

    /// [`JsonContent::to_decrypted`] serialised as a JSON string.
    pub fn to_decrypted_string(&self, alias: &str) -> Result<String, CryptoError> {
        Ok(serde_json::to_string(&self.to_decrypted(alias)?)?)
    }

    /// Borrow the underlying object.
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.map
    }

    /// Consume the content, returning the underlying object.
    pub fn into_map(self) -> Map<String, Value> {
        self.map
    }

    /// Number of top-level entries, envelopes included.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Returns `true` if there are no top-level entries.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    fn manager(&self) -> Result<&CryptoManager, CryptoError> {
        self.crypto_manager
            .as_ref()
            .ok_or(CryptoError::CryptoManagerMissing)
    }
}

impl From<Map<String, Value>> for JsonContent {
    fn from(map: Map<String, Value>) -> Self {
        Self::from_map(map)
    }
}

/// A document as stored in the remote data store.
#[derive(Debug, Clone, Default)]
pub struct JsonDocument {
    id: String,
    content: JsonContent,
    cas: u64,
    expiry: u32,
}

impl JsonDocument {
    /// A document with zero `cas` and `expiry`.
    pub fn create(id: impl Into<String>, content: JsonContent) -> Self {
        Self {
            id: id.into(),
            content,
            ..Self::default()
        }
    }

    /// Set the compare-and-swap value.
    pub fn with_cas(mut self, cas: u64) -> Self {
        self.cas = cas;
        self
    }

    /// Set the expiry, in seconds.
    pub fn with_expiry(mut self, expiry: u32) -> Self {
        self.expiry = expiry;
        self
    }

    /// Document key.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Borrow the content.
    pub fn content(&self) -> &JsonContent {
        &self.content
    }

    /// Mutable access to the content.
    pub fn content_mut(&mut self) -> &mut JsonContent {
        &mut self.content
    }

    /// Consume the document, returning its content.
    pub fn into_content(self) -> JsonContent {
        self.content
    }

    /// Compare-and-swap value returned by the store.
    pub fn cas(&self) -> u64 {
        self.cas
    }

    /// Expiry, in seconds.
    pub fn expiry(&self) -> u32 {
        self.expiry
    }
}
