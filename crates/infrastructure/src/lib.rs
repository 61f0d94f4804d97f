//! Infrastructure layer - host integration for VoxBridge
//!
//! Implements the credential storage port against the host keychain, loads
//! layered configuration, installs logging and wires the provider adapters
//! into a [`application::ProviderService`].

pub mod adapters;
pub mod config;
pub mod telemetry;
pub mod wiring;

pub use adapters::*;
pub use config::{AppConfig, ConfigError, CredentialBackend, CredentialsConfig, LoggingConfig};
pub use telemetry::{TelemetryError, init_logging};
pub use wiring::{
    bootstrap, build_provider_service, build_provider_service_with_store, credential_store,
};
