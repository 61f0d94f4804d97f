//! Assembles a ready [`ProviderService`] from configuration

use std::sync::Arc;

use ai_providers::build_adapters;
use application::{CredentialStorePort, ProviderService};
use tracing::{info, instrument};

use crate::adapters::{InMemoryCredentialStore, KeyringCredentialStore};
use crate::config::{AppConfig, ConfigError, CredentialBackend, CredentialsConfig};

/// Credential store selected by `[credentials] backend`
pub fn credential_store(config: &CredentialsConfig) -> Arc<dyn CredentialStorePort> {
    match config.backend {
        CredentialBackend::Keyring => Arc::new(KeyringCredentialStore::new(config.service.clone())),
        CredentialBackend::Memory => Arc::new(InMemoryCredentialStore::new()),
    }
}

/// Service over the configured credential backend
///
/// # Errors
///
/// Returns `ConfigError` when the configuration is invalid or an adapter
/// cannot be constructed.
pub fn build_provider_service(config: &AppConfig) -> Result<ProviderService, ConfigError> {
    build_provider_service_with_store(config, &credential_store(&config.credentials))
}

/// Service over an explicit credential store
///
/// # Errors
///
/// See [`build_provider_service`].
pub fn build_provider_service_with_store(
    config: &AppConfig,
    store: &Arc<dyn CredentialStorePort>,
) -> Result<ProviderService, ConfigError> {
    config.validate()?;
    let adapters = build_adapters(&config.providers, store)?;
    info!(
        adapters = adapters.len(),
        backend = %config.credentials.backend,
        "Provider adapters constructed"
    );
    Ok(ProviderService::new(
        adapters,
        config.health.clone(),
        &config.orchestrator,
    ))
}

/// Build the service and load every stored secret
///
/// # Errors
///
/// See [`build_provider_service`]. Secrets that fail to load are logged and
/// leave their provider unconfigured.
#[instrument(skip(config))]
pub async fn bootstrap(config: &AppConfig) -> Result<Arc<ProviderService>, ConfigError> {
    let service = build_provider_service(config)?;
    let restored = service.restore_credentials().await;
    info!(?restored, "Provider service ready");
    Ok(Arc::new(service))
}
