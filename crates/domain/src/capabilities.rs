//! Static provider capability registry
//!
//! Every [`ProviderKind`] has exactly one [`ProviderCapabilities`] entry,
//! defined at compile time. Lookups are exhaustive matches, so an unknown
//! provider cannot reach this module at runtime.
//!
//! Adapters use the `check_*` helpers to reject input locally before any
//! network I/O happens.

use std::time::Duration;

use crate::errors::ProviderError;
use crate::value_objects::{AudioData, AudioFormat, ProviderKind, ServiceKind};

/// Model and voice names a provider accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelVocabulary {
    pub transcription_models: &'static [&'static str],
    pub refinement_models: &'static [&'static str],
    pub speech_models: &'static [&'static str],
    pub voices: &'static [&'static str],
}

impl ModelVocabulary {
    const EMPTY: Self = Self {
        transcription_models: &[],
        refinement_models: &[],
        speech_models: &[],
        voices: &[],
    };

    /// Model names valid for the given service
    #[must_use]
    pub const fn models_for(&self, service: ServiceKind) -> &'static [&'static str] {
        match service {
            ServiceKind::Transcription => self.transcription_models,
            ServiceKind::Refinement => self.refinement_models,
            ServiceKind::TextToSpeech => self.speech_models,
        }
    }
}

/// What a provider can do and under which limits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProviderCapabilities {
    pub provider: ProviderKind,
    pub supported_services: &'static [ServiceKind],
    pub max_audio_duration: Option<Duration>,
    pub max_text_length: Option<usize>,
    /// Accepted input formats, most preferred first
    pub supported_audio_formats: &'static [AudioFormat],
    pub supports_streaming: bool,
    pub supports_timestamps: bool,
    pub supported_languages: &'static [&'static str],
    pub vocabulary: ModelVocabulary,
}

const WHISPER_LANGUAGES: &[&str] = &[
    "auto", "en", "de", "fr", "es", "it", "pt", "nl", "pl", "ru", "uk", "sv", "tr", "ja", "zh",
    "ko",
];

static LOCAL: ProviderCapabilities = ProviderCapabilities {
    provider: ProviderKind::Local,
    supported_services: &[
        ServiceKind::Transcription,
        ServiceKind::Refinement,
        ServiceKind::TextToSpeech,
    ],
    max_audio_duration: Some(Duration::from_secs(30 * 60)),
    max_text_length: Some(20_000),
    supported_audio_formats: &[
        AudioFormat::Wav,
        AudioFormat::Mp3,
        AudioFormat::Flac,
        AudioFormat::Ogg,
    ],
    supports_streaming: false,
    supports_timestamps: true,
    supported_languages: WHISPER_LANGUAGES,
    vocabulary: ModelVocabulary {
        transcription_models: &["tiny", "base", "small", "medium", "large-v3"],
        refinement_models: &["llama3.2", "qwen2.5", "mistral", "gemma2"],
        speech_models: &["piper"],
        voices: &[
            "en_US-lessac-medium",
            "en_GB-alan-medium",
            "de_DE-thorsten-medium",
            "fr_FR-siwis-medium",
        ],
    },
};

static OPENAI: ProviderCapabilities = ProviderCapabilities {
    provider: ProviderKind::OpenAi,
    supported_services: &[
        ServiceKind::Transcription,
        ServiceKind::Refinement,
        ServiceKind::TextToSpeech,
    ],
    max_audio_duration: Some(Duration::from_secs(25 * 60)),
    max_text_length: Some(4_096),
    supported_audio_formats: &[
        AudioFormat::Flac,
        AudioFormat::M4a,
        AudioFormat::Mp3,
        AudioFormat::Ogg,
        AudioFormat::Wav,
        AudioFormat::Webm,
    ],
    supports_streaming: true,
    supports_timestamps: true,
    supported_languages: WHISPER_LANGUAGES,
    vocabulary: ModelVocabulary {
        transcription_models: &["whisper-1", "gpt-4o-transcribe", "gpt-4o-mini-transcribe"],
        refinement_models: &["gpt-4o-mini", "gpt-4o", "gpt-4.1-mini", "gpt-4.1"],
        speech_models: &["tts-1", "tts-1-hd", "gpt-4o-mini-tts"],
        voices: &["alloy", "echo", "fable", "onyx", "nova", "shimmer"],
    },
};

static GROQ: ProviderCapabilities = ProviderCapabilities {
    provider: ProviderKind::Groq,
    supported_services: &[ServiceKind::Transcription, ServiceKind::Refinement],
    max_audio_duration: Some(Duration::from_secs(30 * 60)),
    max_text_length: Some(32_000),
    supported_audio_formats: &[
        AudioFormat::Flac,
        AudioFormat::M4a,
        AudioFormat::Mp3,
        AudioFormat::Ogg,
        AudioFormat::Wav,
        AudioFormat::Webm,
        AudioFormat::Opus,
    ],
    supports_streaming: true,
    supports_timestamps: true,
    supported_languages: WHISPER_LANGUAGES,
    vocabulary: ModelVocabulary {
        transcription_models: &[
            "whisper-large-v3",
            "whisper-large-v3-turbo",
            "distil-whisper-large-v3-en",
        ],
        refinement_models: &["llama-3.3-70b-versatile", "llama-3.1-8b-instant"],
        ..ModelVocabulary::EMPTY
    },
};

static ANTHROPIC: ProviderCapabilities = ProviderCapabilities {
    provider: ProviderKind::Anthropic,
    supported_services: &[ServiceKind::Refinement],
    max_audio_duration: None,
    max_text_length: Some(100_000),
    supported_audio_formats: &[],
    supports_streaming: true,
    supports_timestamps: false,
    supported_languages: &[],
    vocabulary: ModelVocabulary {
        refinement_models: &[
            "claude-3-5-haiku-latest",
            "claude-3-7-sonnet-latest",
            "claude-sonnet-4-0",
        ],
        ..ModelVocabulary::EMPTY
    },
};

static ELEVENLABS: ProviderCapabilities = ProviderCapabilities {
    provider: ProviderKind::ElevenLabs,
    supported_services: &[ServiceKind::TextToSpeech],
    max_audio_duration: None,
    max_text_length: Some(5_000),
    supported_audio_formats: &[],
    supports_streaming: true,
    supports_timestamps: false,
    supported_languages: &[],
    vocabulary: ModelVocabulary {
        speech_models: &[
            "eleven_multilingual_v2",
            "eleven_turbo_v2_5",
            "eleven_flash_v2_5",
        ],
        // Rachel, Domi, Bella, Antoni
        voices: &[
            "21m00Tcm4TlvDq8ikWAM",
            "AZnzlk1XvdvUeBnXmlld",
            "EXAVITQu4vr4xnSDxMaL",
            "ErXwobaYiN019PkySvjV",
        ],
        ..ModelVocabulary::EMPTY
    },
};

/// Capabilities of a provider
#[must_use]
pub fn capabilities(provider: ProviderKind) -> &'static ProviderCapabilities {
    match provider {
        ProviderKind::Local => &LOCAL,
        ProviderKind::OpenAi => &OPENAI,
        ProviderKind::Groq => &GROQ,
        ProviderKind::Anthropic => &ANTHROPIC,
        ProviderKind::ElevenLabs => &ELEVENLABS,
    }
}

/// Whether a provider offers a service
#[must_use]
pub fn supports(provider: ProviderKind, service: ServiceKind) -> bool {
    capabilities(provider).supports(service)
}

impl ProviderCapabilities {
    #[must_use]
    pub fn supports(&self, service: ServiceKind) -> bool {
        self.supported_services.contains(&service)
    }

    /// Fail with `UnsupportedService` unless the service is offered
    pub fn check_service(&self, service: ServiceKind) -> Result<(), ProviderError> {
        if self.supports(service) {
            Ok(())
        } else {
            Err(ProviderError::UnsupportedService {
                provider: self.provider,
                service,
            })
        }
    }

    /// Enforce the text length limit (counted in characters)
    pub fn check_text(&self, text: &str) -> Result<(), ProviderError> {
        let Some(max) = self.max_text_length else {
            return Ok(());
        };
        let length = text.chars().count();
        if length > max {
            return Err(ProviderError::TextTooLong { length, max });
        }
        Ok(())
    }

    /// Enforce the accepted formats and the duration limit
    pub fn check_audio(&self, audio: &AudioData) -> Result<(), ProviderError> {
        if !self.supported_audio_formats.contains(&audio.format()) {
            return Err(ProviderError::AudioFormatNotSupported(format!(
                "{} does not accept {}",
                self.provider,
                audio.format()
            )));
        }

        if let (Some(max), Some(duration_ms)) = (self.max_audio_duration, audio.duration_ms()) {
            let max_ms = u64::try_from(max.as_millis()).unwrap_or(u64::MAX);
            if duration_ms > max_ms {
                return Err(ProviderError::AudioTooLong {
                    duration_ms,
                    max_ms,
                });
            }
        }
        Ok(())
    }

    /// Accept a model name only if it belongs to this provider's vocabulary
    pub fn check_model(&self, service: ServiceKind, model: &str) -> Result<(), ProviderError> {
        if self.vocabulary.models_for(service).contains(&model) {
            Ok(())
        } else {
            Err(ProviderError::ModelNotSupported(format!(
                "{model} is not a {service} model of {}",
                self.provider
            )))
        }
    }

    /// Accept a voice only if this provider lists it
    pub fn check_voice(&self, voice: &str) -> Result<(), ProviderError> {
        if self.vocabulary.voices.contains(&voice) {
            Ok(())
        } else {
            Err(ProviderError::ModelNotSupported(format!(
                "voice {voice} is not offered by {}",
                self.provider
            )))
        }
    }

    /// Whether the language is accepted (`None` or empty list means any)
    #[must_use]
    pub fn accepts_language(&self, language: Option<&str>) -> bool {
        match language {
            None => true,
            Some(_) if self.supported_languages.is_empty() => true,
            Some(lang) => self.supported_languages.contains(&lang),
        }
    }
}
