//! Service requests and their results

use domain::{
    AudioData, ProviderFailure, ProviderKind, ProviderSelection, RefinementMode, ServiceKind,
    Transcription,
};

/// Input for one `perform` call; the variant determines the service
#[derive(Debug, Clone)]
pub enum ServiceRequest {
    Transcription {
        audio: AudioData,
        /// ISO 639-1 hint, `None` for auto-detection
        language: Option<String>,
    },
    Refinement {
        text: String,
        mode: RefinementMode,
    },
    TextToSpeech {
        text: String,
    },
}

impl ServiceRequest {
    #[must_use]
    pub fn transcription(audio: AudioData) -> Self {
        Self::Transcription {
            audio,
            language: None,
        }
    }

    #[must_use]
    pub fn refinement(text: impl Into<String>, mode: RefinementMode) -> Self {
        Self::Refinement {
            text: text.into(),
            mode,
        }
    }

    #[must_use]
    pub fn speech(text: impl Into<String>) -> Self {
        Self::TextToSpeech { text: text.into() }
    }

    /// Service this request asks for
    #[must_use]
    pub const fn service(&self) -> ServiceKind {
        match self {
            Self::Transcription { .. } => ServiceKind::Transcription,
            Self::Refinement { .. } => ServiceKind::Refinement,
            Self::TextToSpeech { .. } => ServiceKind::TextToSpeech,
        }
    }
}

/// Result produced by a provider
#[derive(Debug, Clone, PartialEq)]
pub enum ServiceOutput {
    Transcription(Transcription),
    Refinement(String),
    Speech(AudioData),
}

impl ServiceOutput {
    /// Text content for transcription and refinement outputs
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Transcription(t) => Some(&t.text),
            Self::Refinement(text) => Some(text),
            Self::Speech(_) => None,
        }
    }
}

/// Successful `perform` outcome
#[derive(Debug, Clone)]
pub struct ServiceResponse {
    /// Provider that produced the output
    pub provider: ProviderKind,
    pub output: ServiceOutput,
    /// Failures of earlier candidates, in attempt order
    pub failures: Vec<ProviderFailure>,
}

impl ServiceResponse {
    /// Whether a provider other than the first candidate answered
    #[must_use]
    pub fn used_fallback(&self) -> bool {
        !self.failures.is_empty()
    }
}

/// Per-call model and voice choices resolved for one provider
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallOptions {
    pub model: Option<String>,
    pub voice: Option<String>,
}

impl CallOptions {
    /// Pick the selection entries relevant to a service
    #[must_use]
    pub fn for_service(selection: &ProviderSelection, service: ServiceKind) -> Self {
        Self {
            model: selection.model_for(service).map(str::to_string),
            voice: match service {
                ServiceKind::TextToSpeech => selection.voice.clone(),
                _ => None,
            },
        }
    }

    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    #[must_use]
    pub fn with_voice(mut self, voice: impl Into<String>) -> Self {
        self.voice = Some(voice.into());
        self
    }
}
