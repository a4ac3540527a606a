//! Configuration loading and validation for an embedding application's
//! key store.
//!
//! Values come from an optional JSON file overlaid with environment variables
//! prefixed `FLE__` (e.g. `FLE__PUBLIC_KEY_NAME`). Key material is base64 and
//! is normally supplied by the file; environment variables are best suited to
//! the role names and log settings.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use config::builder::DefaultState;
use config::{ConfigBuilder, Environment, File, FileFormat};
use serde::Deserialize;

use crate::keystore::KeyStore;

/// One named key.
#[derive(Debug, Clone, Deserialize)]
pub struct KeyEntry {
    pub name: String,
    /// Standard base64 of the raw key bytes.
    pub material: String,
}

/// Validated key store configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct KeyStoreConfig {
    /// Name of the encryption key; also written as `kid`. **Required.**
    pub public_key_name: String,

    /// Name of the RSA private key. Only needed to decrypt RSA fields.
    #[serde(default)]
    pub private_key_name: Option<String>,

    /// Name of the HMAC key. Without it envelopes are written unsigned.
    #[serde(default)]
    pub signing_key_name: Option<String>,

    #[serde(default)]
    pub keys: Vec<KeyEntry>,

    /// Tracing log level (e.g. `"info"`, `"debug"`).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Emit JSON log lines instead of plain text.
    #[serde(default)]
    pub log_json: bool,
}

fn default_log_level() -> String {
    "info".into()
}

impl KeyStoreConfig {
    /// Load from `path` (if given) and the `FLE__*` environment, then validate.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, a value cannot be parsed
    /// or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path).format(FileFormat::Json));
        }
        builder = builder.add_source(Environment::with_prefix("FLE").separator("__"));
        Self::from_builder(builder)
    }

    /// Build, deserialise and validate from an already-assembled builder.
    pub fn from_builder(builder: ConfigBuilder<DefaultState>) -> Result<Self> {
        let cfg = builder
            .build()
            .context("failed to build key store configuration")?;

        let c: KeyStoreConfig = cfg
            .try_deserialize()
            .context("failed to deserialise key store configuration")?;

        c.validate()?;
        Ok(c)
    }

    /// Validate all fields, returning a descriptive error on the first failure.
    fn validate(&self) -> Result<()> {
        ensure_non_empty(&self.public_key_name, "public_key_name")?;

        let mut seen = HashSet::new();
        for entry in &self.keys {
            ensure_non_empty(&entry.name, "keys[].name")?;
            if entry.material.trim().is_empty() {
                anyhow::bail!("key `{}` has no material", entry.name);
            }
            if !seen.insert(entry.name.as_str()) {
                anyhow::bail!("key `{}` is configured more than once", entry.name);
            }
        }

        for (role, name) in [
            ("public_key_name", Some(&self.public_key_name)),
            ("private_key_name", self.private_key_name.as_ref()),
            ("signing_key_name", self.signing_key_name.as_ref()),
        ] {
            if let Some(name) = name {
                if !seen.contains(name.as_str()) {
                    anyhow::bail!("{role} `{name}` does not name a configured key");
                }
            }
        }
        Ok(())
    }

    /// Decode every key and build the [`KeyStore`].
    ///
    /// # Errors
    ///
    /// Returns an error if any key material is not valid base64.
    pub fn into_key_store(self) -> Result<KeyStore> {
        let mut store = KeyStore::new();
        for entry in &self.keys {
            let bytes = STANDARD
                .decode(entry.material.trim())
                .with_context(|| format!("key `{}` is not valid base64", entry.name))?;
            store.store_key(entry.name.as_str(), &bytes);
        }
        store.set_public_key_name(self.public_key_name);
        if let Some(name) = self.private_key_name {
            store.set_private_key_name(name);
        }
        if let Some(name) = self.signing_key_name {
            store.set_signing_key_name(name);
        }
        Ok(store)
    }
}

fn ensure_non_empty(value: &str, name: &str) -> Result<()> {
    if value.trim().is_empty() {
        anyhow::bail!("{name} is required and must not be empty");
    }
    Ok(())
}
