//! User service preferences
//!
//! Persisted by the host application; this layer only reads them.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::capabilities::capabilities;
use crate::errors::ProviderError;
use crate::value_objects::{ProviderKind, ServiceKind};

/// Per-provider model and voice choices
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderSelection {
    pub transcription_model: Option<String>,
    pub refinement_model: Option<String>,
    pub speech_model: Option<String>,
    pub voice: Option<String>,
}

impl ProviderSelection {
    /// Chosen model for a service, if any
    #[must_use]
    pub fn model_for(&self, service: ServiceKind) -> Option<&str> {
        match service {
            ServiceKind::Transcription => self.transcription_model.as_deref(),
            ServiceKind::Refinement => self.refinement_model.as_deref(),
            ServiceKind::TextToSpeech => self.speech_model.as_deref(),
        }
    }
}

/// Which provider serves each service and whether to fall back
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServicePreferences {
    #[serde(default = "default_transcription_provider")]
    pub transcription_provider: ProviderKind,

    #[serde(default = "default_refinement_provider")]
    pub refinement_provider: ProviderKind,

    #[serde(default = "default_speech_provider")]
    pub speech_provider: ProviderKind,

    /// Try other providers when the preferred one fails
    #[serde(default = "default_use_fallback")]
    pub use_fallback_hierarchy: bool,

    #[serde(default)]
    pub selections: BTreeMap<ProviderKind, ProviderSelection>,
}

const fn default_transcription_provider() -> ProviderKind {
    ProviderKind::Local
}

const fn default_refinement_provider() -> ProviderKind {
    ProviderKind::OpenAi
}

const fn default_speech_provider() -> ProviderKind {
    ProviderKind::Local
}

const fn default_use_fallback() -> bool {
    true
}

impl Default for ServicePreferences {
    fn default() -> Self {
        Self {
            transcription_provider: default_transcription_provider(),
            refinement_provider: default_refinement_provider(),
            speech_provider: default_speech_provider(),
            use_fallback_hierarchy: default_use_fallback(),
            selections: BTreeMap::new(),
        }
    }
}

impl ServicePreferences {
    /// Preferred provider for a service
    #[must_use]
    pub const fn preferred(&self, service: ServiceKind) -> ProviderKind {
        match service {
            ServiceKind::Transcription => self.transcription_provider,
            ServiceKind::Refinement => self.refinement_provider,
            ServiceKind::TextToSpeech => self.speech_provider,
        }
    }

    /// Builder-style override of the preferred provider
    #[must_use]
    pub const fn with_preferred(mut self, service: ServiceKind, provider: ProviderKind) -> Self {
        match service {
            ServiceKind::Transcription => self.transcription_provider = provider,
            ServiceKind::Refinement => self.refinement_provider = provider,
            ServiceKind::TextToSpeech => self.speech_provider = provider,
        }
        self
    }

    #[must_use]
    pub const fn with_fallback(mut self, enabled: bool) -> Self {
        self.use_fallback_hierarchy = enabled;
        self
    }

    #[must_use]
    pub fn with_selection(mut self, provider: ProviderKind, selection: ProviderSelection) -> Self {
        self.selections.insert(provider, selection);
        self
    }

    /// Model/voice choices for a provider (empty when none were made)
    #[must_use]
    pub fn selection(&self, provider: ProviderKind) -> ProviderSelection {
        self.selections.get(&provider).cloned().unwrap_or_default()
    }

    /// Check every selection against the provider's vocabulary
    ///
    /// A preferred provider that does not offer its service is also rejected.
    pub fn validate(&self) -> Result<(), ProviderError> {
        for service in ServiceKind::ALL {
            capabilities(self.preferred(service)).check_service(service)?;
        }

        for (provider, selection) in &self.selections {
            let caps = capabilities(*provider);
            for service in ServiceKind::ALL {
                if let Some(model) = selection.model_for(service) {
                    caps.check_service(service)?;
                    caps.check_model(service, model)?;
                }
            }
            if let Some(voice) = selection.voice.as_deref() {
                caps.check_voice(voice)?;
            }
        }
        Ok(())
    }
}
