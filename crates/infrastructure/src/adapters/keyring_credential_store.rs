//! Host keychain credential store
//!
//! Entries are filed under a service namespace with the provider's
//! credential key as the account name. `keyring` calls block, so each one
//! runs on the blocking pool.

use application::{CredentialError, CredentialStorePort};
use async_trait::async_trait;
use domain::ProviderKind;
use keyring::Entry;
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, instrument};

use crate::config::DEFAULT_KEYRING_SERVICE;

#[derive(Debug, Clone)]
pub struct KeyringCredentialStore {
    service: String,
}

impl Default for KeyringCredentialStore {
    fn default() -> Self {
        Self::new(DEFAULT_KEYRING_SERVICE)
    }
}

impl KeyringCredentialStore {
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    #[must_use]
    pub fn service(&self) -> &str {
        &self.service
    }

    async fn with_entry<T, F>(&self, provider: ProviderKind, op: F) -> Result<T, CredentialError>
    where
        F: FnOnce(&Entry) -> Result<T, CredentialError> + Send + 'static,
        T: Send + 'static,
    {
        let service = self.service.clone();
        let account = provider.credential_key();
        tokio::task::spawn_blocking(move || {
            let entry = Entry::new(&service, &account)
                .map_err(|e| CredentialError::Read(format!("keychain entry for {account}: {e}")))?;
            op(&entry)
        })
        .await
        .map_err(|e| CredentialError::Read(format!("keychain task failed: {e}")))?
    }
}

fn read_outcome(result: Result<String, keyring::Error>) -> Result<Option<SecretString>, CredentialError> {
    match result {
        Ok(secret) => Ok(Some(SecretString::from(secret))),
        Err(keyring::Error::NoEntry) => Ok(None),
        Err(e) => Err(CredentialError::Read(e.to_string())),
    }
}

fn delete_outcome(result: Result<(), keyring::Error>) -> Result<(), CredentialError> {
    match result {
        Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
        Err(e) => Err(CredentialError::Write(e.to_string())),
    }
}

#[async_trait]
impl CredentialStorePort for KeyringCredentialStore {
    #[instrument(skip(self, secret), fields(service = %self.service))]
    async fn store(
        &self,
        provider: ProviderKind,
        secret: &SecretString,
    ) -> Result<(), CredentialError> {
        let secret = SecretString::from(secret.expose_secret().to_owned());
        self.with_entry(provider, move |entry| {
            delete_outcome(entry.delete_credential())?;
            entry
                .set_password(secret.expose_secret())
                .map_err(|e| CredentialError::Write(e.to_string()))
        })
        .await?;
        debug!("Stored credential in keychain");
        Ok(())
    }

    #[instrument(skip(self), fields(service = %self.service))]
    async fn retrieve(
        &self,
        provider: ProviderKind,
    ) -> Result<Option<SecretString>, CredentialError> {
        self.with_entry(provider, |entry| read_outcome(entry.get_password()))
            .await
    }

    #[instrument(skip(self), fields(service = %self.service))]
    async fn delete(&self, provider: ProviderKind) -> Result<(), CredentialError> {
        self.with_entry(provider, |entry| delete_outcome(entry.delete_credential()))
            .await?;
        debug!("Removed credential from keychain");
        Ok(())
    }

    async fn exists(&self, provider: ProviderKind) -> Result<bool, CredentialError> {
        Ok(self.retrieve(provider).await?.is_some())
    }
}
