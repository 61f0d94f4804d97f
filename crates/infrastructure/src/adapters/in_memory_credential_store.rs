//! Process-local credential store
//!
//! For tests and for hosts without a usable keychain. Secrets are lost when
//! the process exits.

use std::collections::HashMap;

use application::{CredentialError, CredentialStorePort};
use async_trait::async_trait;
use domain::ProviderKind;
use parking_lot::RwLock;
use secrecy::{ExposeSecret, SecretString};

#[derive(Default)]
pub struct InMemoryCredentialStore {
    secrets: RwLock<HashMap<ProviderKind, SecretString>>,
}

impl std::fmt::Debug for InMemoryCredentialStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut providers: Vec<ProviderKind> = self.secrets.read().keys().copied().collect();
        providers.sort();
        f.debug_struct("InMemoryCredentialStore")
            .field("providers", &providers)
            .finish()
    }
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored secrets
    pub fn len(&self) -> usize {
        self.secrets.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.secrets.read().is_empty()
    }
}

#[async_trait]
impl CredentialStorePort for InMemoryCredentialStore {
    async fn store(
        &self,
        provider: ProviderKind,
        secret: &SecretString,
    ) -> Result<(), CredentialError> {
        self.secrets.write().insert(
            provider,
            SecretString::from(secret.expose_secret().to_owned()),
        );
        Ok(())
    }

    async fn retrieve(
        &self,
        provider: ProviderKind,
    ) -> Result<Option<SecretString>, CredentialError> {
        Ok(self
            .secrets
            .read()
            .get(&provider)
            .map(|secret| SecretString::from(secret.expose_secret().to_owned())))
    }

    async fn delete(&self, provider: ProviderKind) -> Result<(), CredentialError> {
        self.secrets.write().remove(&provider);
        Ok(())
    }

    async fn exists(&self, provider: ProviderKind) -> Result<bool, CredentialError> {
        Ok(self.secrets.read().contains_key(&provider))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn store_replaces_previous_secret() {
        let store = InMemoryCredentialStore::new();
        store
            .store(ProviderKind::OpenAi, &SecretString::from("sk-old"))
            .await
            .unwrap();
        store
            .store(ProviderKind::OpenAi, &SecretString::from("sk-new"))
            .await
            .unwrap();

        let secret = store.retrieve(ProviderKind::OpenAi).await.unwrap().unwrap();
        assert_eq!(secret.expose_secret(), "sk-new");
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn absent_secret_is_none() {
        let store = InMemoryCredentialStore::new();
        assert!(store.retrieve(ProviderKind::Groq).await.unwrap().is_none());
        assert!(!store.exists(ProviderKind::Groq).await.unwrap());
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let store = InMemoryCredentialStore::new();
        store
            .store(ProviderKind::Anthropic, &SecretString::from("sk-ant"))
            .await
            .unwrap();

        store.delete(ProviderKind::Anthropic).await.unwrap();
        store.delete(ProviderKind::Anthropic).await.unwrap();
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn debug_lists_providers_only() {
        let store = InMemoryCredentialStore::new();
        store
            .store(ProviderKind::ElevenLabs, &SecretString::from("xi-very-secret"))
            .await
            .unwrap();

        let debug = format!("{store:?}");
        assert!(debug.contains("ElevenLabs"));
        assert!(!debug.contains("xi-very-secret"));
    }
}
