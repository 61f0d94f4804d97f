//! Provider adapter port - one implementation per [`ProviderKind`]
//!
//! An adapter owns its transport client and the credential it was configured
//! with. Service methods an adapter does not override fail with
//! [`ProviderError::UnsupportedService`]; the orchestrator checks the
//! capability registry before calling, so those defaults are only a guard.

use std::fmt;

use async_trait::async_trait;
use domain::{
    AudioData, ProviderCapabilities, ProviderError, ProviderKind, RefinementMode, ServiceKind,
    Transcription,
};
use secrecy::SecretString;

use crate::request::{CallOptions, ServiceOutput, ServiceRequest};

/// Uniform contract over local and remote providers
#[async_trait]
pub trait ProviderAdapter: Send + Sync + fmt::Debug {
    /// Which provider this adapter talks to
    fn kind(&self) -> ProviderKind;

    /// Static capabilities from the registry
    fn capabilities(&self) -> &'static ProviderCapabilities {
        domain::capabilities(self.kind())
    }

    /// True only while a validated credential is held (always for local)
    fn is_configured(&self) -> bool;

    /// Install a secret: persist it, hold it, probe the provider
    ///
    /// # Errors
    /// `SecretMissing` when a remote provider gets no secret. Any probe
    /// failure is returned after the configuration has been rolled back, so
    /// a failed call leaves nothing stored and `is_configured()` false.
    async fn configure(&self, secret: Option<SecretString>) -> Result<(), ProviderError>;

    /// Reload a previously stored secret without probing
    ///
    /// Returns whether the adapter is configured afterwards.
    async fn restore(&self) -> Result<bool, ProviderError>;

    /// Forget the held secret and delete it from storage
    async fn clear(&self) -> Result<(), ProviderError>;

    /// Minimal live probe; must not mutate user data
    ///
    /// `Ok(false)` means the probe ran but the provider is not usable.
    async fn test_connection(&self) -> Result<bool, ProviderError>;

    async fn transcribe(
        &self,
        _audio: &AudioData,
        _language: Option<&str>,
        _options: &CallOptions,
    ) -> Result<Transcription, ProviderError> {
        Err(unsupported(self.kind(), ServiceKind::Transcription))
    }

    async fn refine(
        &self,
        _text: &str,
        _mode: &RefinementMode,
        _options: &CallOptions,
    ) -> Result<String, ProviderError> {
        Err(unsupported(self.kind(), ServiceKind::Refinement))
    }

    async fn synthesize_speech(
        &self,
        _text: &str,
        _options: &CallOptions,
    ) -> Result<AudioData, ProviderError> {
        Err(unsupported(self.kind(), ServiceKind::TextToSpeech))
    }

    /// Dispatch a request to the matching service method
    async fn perform(
        &self,
        request: &ServiceRequest,
        options: &CallOptions,
    ) -> Result<ServiceOutput, ProviderError> {
        match request {
            ServiceRequest::Transcription { audio, language } => self
                .transcribe(audio, language.as_deref(), options)
                .await
                .map(ServiceOutput::Transcription),
            ServiceRequest::Refinement { text, mode } => self
                .refine(text, mode, options)
                .await
                .map(ServiceOutput::Refinement),
            ServiceRequest::TextToSpeech { text } => self
                .synthesize_speech(text, options)
                .await
                .map(ServiceOutput::Speech),
        }
    }
}

const fn unsupported(provider: ProviderKind, service: ServiceKind) -> ProviderError {
    ProviderError::UnsupportedService { provider, service }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct RefineOnly;

    #[async_trait]
    impl ProviderAdapter for RefineOnly {
        fn kind(&self) -> ProviderKind {
            ProviderKind::Anthropic
        }

        fn is_configured(&self) -> bool {
            true
        }

        async fn configure(&self, _secret: Option<SecretString>) -> Result<(), ProviderError> {
            Ok(())
        }

        async fn restore(&self) -> Result<bool, ProviderError> {
            Ok(true)
        }

        async fn clear(&self) -> Result<(), ProviderError> {
            Ok(())
        }

        async fn test_connection(&self) -> Result<bool, ProviderError> {
            Ok(true)
        }

        async fn refine(
            &self,
            text: &str,
            _mode: &RefinementMode,
            _options: &CallOptions,
        ) -> Result<String, ProviderError> {
            Ok(text.to_uppercase())
        }
    }

    #[tokio::test]
    async fn perform_dispatches_by_request() {
        let adapter = RefineOnly;
        let out = adapter
            .perform(
                &ServiceRequest::refinement("ok", RefinementMode::Clean),
                &CallOptions::default(),
            )
            .await
            .unwrap();
        assert_eq!(out, ServiceOutput::Refinement("OK".to_string()));
    }

    #[tokio::test]
    async fn unimplemented_service_is_unsupported() {
        let err = RefineOnly
            .perform(&ServiceRequest::speech("hi"), &CallOptions::default())
            .await
            .unwrap_err();
        assert_eq!(
            err,
            ProviderError::UnsupportedService {
                provider: ProviderKind::Anthropic,
                service: ServiceKind::TextToSpeech,
            }
        );
    }

    #[test]
    fn capabilities_come_from_registry() {
        assert!(RefineOnly.capabilities().supports(ServiceKind::Refinement));
    }
}
