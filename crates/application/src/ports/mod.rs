//! Port definitions for the application layer
//!
//! Ports are the interfaces adapters implement. Credential storage lives in
//! infrastructure; provider adapters live in `ai_providers`.

mod credential_store;
mod provider_adapter;

#[cfg(test)]
pub use credential_store::MockCredentialStorePort;
pub use credential_store::{CredentialError, CredentialStorePort};
pub use provider_adapter::ProviderAdapter;
