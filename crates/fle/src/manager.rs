//! [`CryptoManager`]: alias → provider registry.
//!
//! Providers are registered once while the application is being set up.
//! The map lives behind [`ArcSwap`] so lookups on the encode/decode path are
//! lock-free and each registration swaps in a fresh copy of the map.

use std::{collections::HashMap, sync::Arc};

use arc_swap::ArcSwap;
use common::CryptoError;
use tracing::info;

use crate::provider::CryptoProvider;

/// Shared registry of providers keyed by alias.
///
/// Cheap to clone; clones share the same registrations. There is no
/// unregister operation: registration is append/overwrite only.
#[derive(Clone, Debug)]
pub struct CryptoManager {
    inner: Arc<ArcSwap<HashMap<String, Arc<CryptoProvider>>>>,
}

impl CryptoManager {
    /// Create a new, empty [`CryptoManager`].
    pub fn new() -> Self {
        Self {
            inner: Arc::new(ArcSwap::new(Arc::new(HashMap::new()))),
        }
    }

    /// Register `provider` under `alias`, replacing any previous binding,
    /// and record the alias on the provider.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::AliasInvalid`] if `alias` is empty or blank.
    pub fn register_provider(
        &self,
        alias: &str,
        provider: Arc<CryptoProvider>,
    ) -> Result<(), CryptoError> {
        ensure_alias(alias)?;
        self.inner.rcu(|current| {
            let mut next = HashMap::clone(current);
            next.insert(alias.to_owned(), Arc::clone(&provider));
            next
        });
        provider.set_alias(alias);
        info!(
            alias,
            algorithm = provider.algorithm_name(),
            "crypto provider registered"
        );
        Ok(())
    }

    /// Look up the provider registered under `alias`.
    ///
    /// This is a lock-free read; safe to call on the hot encryption path.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::AliasInvalid`] if `alias` is empty or blank and
    /// [`CryptoError::ProviderNotFound`] if nothing is registered under it.
    pub fn get_provider(&self, alias: &str) -> Result<Arc<CryptoProvider>, CryptoError> {
        ensure_alias(alias)?;
        self.inner
            .load()
            .get(alias)
            .cloned()
            .ok_or_else(|| CryptoError::ProviderNotFound {
                alias: alias.to_owned(),
            })
    }

    /// Return the number of registered aliases.
    pub fn len(&self) -> usize {
        self.inner.load().len()
    }

    /// Return `true` if no providers are registered.
    pub fn is_empty(&self) -> bool {
        self.inner.load().is_empty()
    }

    /// Registered aliases, sorted.
    pub fn aliases(&self) -> Vec<String> {
        let mut aliases: Vec<String> = self.inner.load().keys().cloned().collect();
        aliases.sort();
        aliases
    }
}

impl Default for CryptoManager {
    fn default() -> Self {
        Self::new()
    }
}

fn ensure_alias(alias: &str) -> Result<(), CryptoError> {
    if alias.trim().is_empty() {
        return Err(CryptoError::AliasInvalid);
    }
    Ok(())
}
