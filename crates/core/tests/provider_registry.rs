//! Provider registry lookups.

mod support;

use std::sync::Arc;

use pdpsync_core::{PdpProvider, ProviderFactory, ProviderRegistry};
use pdpsync_domain::{PdpError, ProviderConfig};
use support::provider::MockProvider;

fn mock_factory() -> ProviderFactory {
    Arc::new(|config: &ProviderConfig| {
        Ok(Arc::new(MockProvider::new(&config.name)) as Arc<dyn PdpProvider>)
    })
}

#[test]
fn creates_registered_provider_case_insensitively() {
    let mut registry = ProviderRegistry::new();
    registry.register("Acme", mock_factory());

    let config = ProviderConfig::new("ACME", "https://pdp.test", "svc", "pw");
    let provider = registry.create(&config).unwrap();

    assert_eq!(provider.name(), "ACME");
    assert!(registry.contains("acme"));
    assert_eq!(registry.names(), vec!["acme".to_string()]);
}

#[test]
fn unknown_provider_is_a_configuration_error() {
    let registry = ProviderRegistry::new();
    let config = ProviderConfig::new("nowhere", "https://pdp.test", "svc", "pw");

    let err = registry.create(&config).err().unwrap();
    assert!(matches!(err, PdpError::Config(message) if message.contains("nowhere")));
}
