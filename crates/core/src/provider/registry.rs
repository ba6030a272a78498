//! Provider registry
//!
//! Maps provider names to factories building a [`PdpProvider`] from its
//! configuration, so callers never depend on a concrete provider type.

use std::collections::BTreeMap;
use std::sync::Arc;

use pdpsync_domain::{PdpError, ProviderConfig, Result};
use tracing::debug;

use super::ports::PdpProvider;

/// Builds a provider client for one configured account
pub type ProviderFactory =
    Arc<dyn Fn(&ProviderConfig) -> Result<Arc<dyn PdpProvider>> + Send + Sync>;

#[derive(Default, Clone)]
pub struct ProviderRegistry {
    factories: BTreeMap<String, ProviderFactory>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the factory for a provider name
    pub fn register(&mut self, name: impl Into<String>, factory: ProviderFactory) {
        let name = name.into().to_lowercase();
        debug!(provider = %name, "Registered PDP provider");
        self.factories.insert(name, factory);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(&name.to_lowercase())
    }

    pub fn names(&self) -> Vec<String> {
        self.factories.keys().cloned().collect()
    }

    /// Instantiate the provider named by `config.name`
    ///
    /// # Errors
    /// Returns [`PdpError::Config`] for an unregistered name.
    pub fn create(&self, config: &ProviderConfig) -> Result<Arc<dyn PdpProvider>> {
        let factory = self
            .factories
            .get(&config.name.to_lowercase())
            .ok_or_else(|| PdpError::Config(format!("unknown PDP provider '{}'", config.name)))?;
        factory(config)
    }
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry").field("providers", &self.names()).finish()
    }
}
