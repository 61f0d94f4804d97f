//! Port for provider secret storage
//!
//! Secrets are addressed by provider; implementations decide where the
//! bytes live (host keychain, memory for tests). A secret never leaves this
//! port except as a [`SecretString`], which redacts itself in `Debug`.

use async_trait::async_trait;
use domain::{ProviderError, ProviderKind};
#[cfg(test)]
use mockall::automock;
use secrecy::SecretString;
use thiserror::Error;

/// Failure of the underlying secure storage
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CredentialError {
    #[error("Failed to read credential: {0}")]
    Read(String),

    #[error("Failed to write credential: {0}")]
    Write(String),
}

impl From<CredentialError> for ProviderError {
    fn from(err: CredentialError) -> Self {
        Self::SecretInvalid(format!("rejected by secure storage: {err}"))
    }
}

/// Port for credential storage operations
#[cfg_attr(test, automock)]
#[async_trait]
pub trait CredentialStorePort: Send + Sync {
    /// Store a secret, replacing any existing one for the provider
    async fn store(&self, provider: ProviderKind, secret: &SecretString)
    -> Result<(), CredentialError>;

    /// Retrieve the secret, `None` when nothing is stored
    async fn retrieve(&self, provider: ProviderKind) -> Result<Option<SecretString>, CredentialError>;

    /// Remove the secret; removing an absent secret succeeds
    async fn delete(&self, provider: ProviderKind) -> Result<(), CredentialError>;

    /// Check whether a secret is stored
    async fn exists(&self, provider: ProviderKind) -> Result<bool, CredentialError>;
}
