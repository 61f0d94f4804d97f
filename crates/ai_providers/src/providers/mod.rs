//! Provider adapter implementations

mod anthropic;
mod elevenlabs;
mod groq;
pub mod local;
mod openai;
mod openai_compatible;

pub use anthropic::AnthropicProvider;
pub use elevenlabs::ElevenLabsProvider;
pub use groq::GroqProvider;
pub use local::LocalProvider;
pub use openai::OpenAiProvider;
pub use openai_compatible::OpenAiCompatibleClient;

use std::sync::Arc;

use application::{CallOptions, CredentialStorePort, ProviderAdapter};
use domain::{ProviderCapabilities, ProviderError, ServiceKind};

use crate::config::ProvidersConfig;
use crate::error::AdapterError;

/// One adapter per provider kind, all sharing the credential store
///
/// # Errors
///
/// Returns the first configuration or client construction failure.
pub fn build_adapters(
    config: &ProvidersConfig,
    store: &Arc<dyn CredentialStorePort>,
) -> Result<Vec<Arc<dyn ProviderAdapter>>, AdapterError> {
    config.validate().map_err(AdapterError::Configuration)?;

    let local = LocalProvider::new(config.local.clone())?;
    let openai = OpenAiProvider::new(config.openai.clone(), Arc::clone(store))?;
    let groq = GroqProvider::new(config.groq.clone(), Arc::clone(store))?;
    let anthropic = AnthropicProvider::new(config.anthropic.clone(), Arc::clone(store))?;
    let elevenlabs = ElevenLabsProvider::new(config.elevenlabs.clone(), Arc::clone(store))?;

    Ok(vec![
        Arc::new(local) as Arc<dyn ProviderAdapter>,
        Arc::new(openai),
        Arc::new(groq),
        Arc::new(anthropic),
        Arc::new(elevenlabs),
    ])
}

/// Model for one call: the caller's choice if it is in the vocabulary,
/// otherwise the configured default, otherwise the built-in default
pub(crate) fn resolve_model<'a>(
    caps: &ProviderCapabilities,
    service: ServiceKind,
    options: &'a CallOptions,
    configured: Option<&'a str>,
    builtin: &'a str,
) -> Result<&'a str, ProviderError> {
    match options.model.as_deref() {
        Some(model) => {
            caps.check_model(service, model)?;
            Ok(model)
        },
        None => Ok(configured.unwrap_or(builtin)),
    }
}

/// Voice for one call, resolved like [`resolve_model`]
pub(crate) fn resolve_voice<'a>(
    caps: &ProviderCapabilities,
    options: &'a CallOptions,
    configured: Option<&'a str>,
    builtin: &'a str,
) -> Result<&'a str, ProviderError> {
    match options.voice.as_deref() {
        Some(voice) => {
            caps.check_voice(voice)?;
            Ok(voice)
        },
        None => Ok(configured.unwrap_or(builtin)),
    }
}

/// Reject a language hint the provider cannot honour
pub(crate) fn check_language(
    caps: &ProviderCapabilities,
    language: Option<&str>,
) -> Result<(), ProviderError> {
    if caps.accepts_language(language) {
        Ok(())
    } else {
        Err(ProviderError::ModelNotSupported(format!(
            "language {} is not supported by {}",
            language.unwrap_or_default(),
            caps.provider
        )))
    }
}


#[cfg(test)]
mod tests {
    use domain::{ProviderKind, capabilities};

    use super::*;

    #[test]
    fn builds_one_adapter_per_kind() {
        let store: Arc<dyn CredentialStorePort> = Arc::new(test_store::MapStore::default());
        let adapters = build_adapters(&ProvidersConfig::default(), &store).unwrap();

        let kinds: Vec<ProviderKind> = adapters.iter().map(|a| a.kind()).collect();
        assert_eq!(kinds, ProviderKind::ALL.to_vec());
        assert!(adapters[0].is_configured());
        assert!(adapters[1..].iter().all(|a| !a.is_configured()));
    }

    #[test]
    fn invalid_config_is_rejected() {
        let store: Arc<dyn CredentialStorePort> = Arc::new(test_store::MapStore::default());
        let mut config = ProvidersConfig::default();
        config.openai.timeout_ms = 0;
        assert!(matches!(
            build_adapters(&config, &store),
            Err(AdapterError::Configuration(_))
        ));
    }

    #[test]
    fn requested_model_must_be_in_vocabulary() {
        let caps = capabilities(ProviderKind::OpenAi);
        let options = CallOptions::default().with_model("claude-sonnet-4-0");
        let err = resolve_model(caps, ServiceKind::Refinement, &options, None, "gpt-4o-mini")
            .unwrap_err();
        assert!(matches!(err, ProviderError::ModelNotSupported(_)));
    }

    #[test]
    fn model_falls_back_to_configured_then_builtin() {
        let caps = capabilities(ProviderKind::OpenAi);
        let options = CallOptions::default();
        assert_eq!(
            resolve_model(caps, ServiceKind::Refinement, &options, Some("gpt-4o"), "gpt-4o-mini")
                .unwrap(),
            "gpt-4o"
        );
        assert_eq!(
            resolve_model(caps, ServiceKind::Refinement, &options, None, "gpt-4o-mini").unwrap(),
            "gpt-4o-mini"
        );
    }

    #[test]
    fn requested_voice_is_checked() {
        let caps = capabilities(ProviderKind::OpenAi);
        let ok = CallOptions::default().with_voice("alloy");
        assert_eq!(resolve_voice(caps, &ok, None, "nova").unwrap(), "alloy");

        let bad = CallOptions::default().with_voice("21m00Tcm4TlvDq8ikWAM");
        assert!(resolve_voice(caps, &bad, None, "nova").is_err());
    }

    #[test]
    fn unknown_language_is_rejected() {
        let caps = capabilities(ProviderKind::Groq);
        assert!(check_language(caps, Some("en")).is_ok());
        assert!(check_language(caps, None).is_ok());
        assert!(matches!(
            check_language(caps, Some("tlh")),
            Err(ProviderError::ModelNotSupported(_))
        ));
    }
}
