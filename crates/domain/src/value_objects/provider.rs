//! Provider, service and health vocabularies

use std::fmt;

use serde::{Deserialize, Serialize};

/// An AI service a provider may offer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceKind {
    /// Speech-to-text
    Transcription,
    /// Rewriting dictated text (cleanup, tone, summary)
    Refinement,
    /// Text-to-speech
    TextToSpeech,
}

impl ServiceKind {
    /// All services, in declaration order
    pub const ALL: [Self; 3] = [Self::Transcription, Self::Refinement, Self::TextToSpeech];

    /// Stable lowercase identifier
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Transcription => "transcription",
            Self::Refinement => "refinement",
            Self::TextToSpeech => "text_to_speech",
        }
    }
}

impl fmt::Display for ServiceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ServiceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "transcription" | "stt" => Ok(Self::Transcription),
            "refinement" | "refine" => Ok(Self::Refinement),
            "text_to_speech" | "tts" | "speech" => Ok(Self::TextToSpeech),
            _ => Err(format!(
                "Invalid service: {s}. Use 'transcription', 'refinement' or 'text_to_speech'"
            )),
        }
    }
}

/// A backend that implements one or more services
///
/// The declaration order is the registry order used to break ties when
/// ordering fallback candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// On-device engines (whisper.cpp, Ollama, Piper)
    Local,
    /// OpenAI API
    OpenAi,
    /// Groq API (OpenAI-compatible)
    Groq,
    /// Anthropic Messages API
    Anthropic,
    /// ElevenLabs speech API
    ElevenLabs,
}

impl ProviderKind {
    /// All providers in registry order
    pub const ALL: [Self; 5] = [
        Self::Local,
        Self::OpenAi,
        Self::Groq,
        Self::Anthropic,
        Self::ElevenLabs,
    ];

    /// Whether an API secret must be configured before use
    #[must_use]
    pub const fn requires_secret(&self) -> bool {
        !self.is_local()
    }

    /// Whether this provider runs on the device
    #[must_use]
    pub const fn is_local(&self) -> bool {
        matches!(self, Self::Local)
    }

    /// Stable lowercase identifier
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::OpenAi => "openai",
            Self::Groq => "groq",
            Self::Anthropic => "anthropic",
            Self::ElevenLabs => "elevenlabs",
        }
    }

    /// Key under which this provider's secret lives in secure storage
    #[must_use]
    pub fn credential_key(&self) -> String {
        format!("{}_api_key", self.as_str())
    }

    /// Position in the registry, used as the final tie-break
    #[must_use]
    pub const fn registry_index(&self) -> usize {
        match self {
            Self::Local => 0,
            Self::OpenAi => 1,
            Self::Groq => 2,
            Self::Anthropic => 3,
            Self::ElevenLabs => 4,
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "openai" => Ok(Self::OpenAi),
            "groq" => Ok(Self::Groq),
            "anthropic" => Ok(Self::Anthropic),
            "elevenlabs" | "eleven_labs" => Ok(Self::ElevenLabs),
            _ => Err(format!(
                "Invalid provider: {s}. Use one of local, openai, groq, anthropic, elevenlabs"
            )),
        }
    }
}

/// Best-effort liveness classification of a provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// Last call succeeded
    #[default]
    Healthy,
    /// Recent recoverable failure
    Degraded,
    /// Authentication failure or repeated failures
    Unavailable,
    /// A connection test is in flight
    Testing,
}

impl HealthStatus {
    /// Ordering rank for fallback candidates (lower is tried first)
    #[must_use]
    pub const fn rank(&self) -> u8 {
        match self {
            Self::Healthy => 0,
            Self::Degraded => 1,
            Self::Testing | Self::Unavailable => 2,
        }
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Healthy => write!(f, "healthy"),
            Self::Degraded => write!(f, "degraded"),
            Self::Unavailable => write!(f, "unavailable"),
            Self::Testing => write!(f, "testing"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_local_skips_secret() {
        for kind in ProviderKind::ALL {
            assert_eq!(kind.requires_secret(), kind != ProviderKind::Local);
        }
    }

    #[test]
    fn credential_key_uses_lowercase_name() {
        assert_eq!(ProviderKind::OpenAi.credential_key(), "openai_api_key");
        assert_eq!(ProviderKind::ElevenLabs.credential_key(), "elevenlabs_api_key");
    }

    #[test]
    fn registry_index_matches_all_order() {
        for (idx, kind) in ProviderKind::ALL.iter().enumerate() {
            assert_eq!(kind.registry_index(), idx);
        }
    }

    #[test]
    fn provider_parses_from_display() {
        for kind in ProviderKind::ALL {
            assert_eq!(kind.to_string().parse::<ProviderKind>(), Ok(kind));
        }
        assert!("mistral".parse::<ProviderKind>().is_err());
    }

    #[test]
    fn service_aliases_parse() {
        assert_eq!("stt".parse::<ServiceKind>(), Ok(ServiceKind::Transcription));
        assert_eq!("tts".parse::<ServiceKind>(), Ok(ServiceKind::TextToSpeech));
        assert_eq!("refine".parse::<ServiceKind>(), Ok(ServiceKind::Refinement));
    }

    #[test]
    fn testing_ranks_with_unavailable() {
        assert!(HealthStatus::Healthy.rank() < HealthStatus::Degraded.rank());
        assert_eq!(HealthStatus::Testing.rank(), HealthStatus::Unavailable.rank());
    }

    #[test]
    fn provider_serializes_lowercase() {
        let json = serde_json::to_string(&ProviderKind::OpenAi).unwrap();
        assert_eq!(json, "\"openai\"");
    }
}
