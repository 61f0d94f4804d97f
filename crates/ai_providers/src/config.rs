//! Adapter configuration
//!
//! Remote providers share one [`RemoteConfig`] shape; unset fields fall back
//! to the provider's defaults (base URL, models, voice). Defaults that are set
//! explicitly are checked against the capability registry by
//! [`ProvidersConfig::validate`].

use std::path::PathBuf;

use domain::{ProviderKind, ServiceKind, capabilities};
use serde::{Deserialize, Serialize};

const fn default_timeout_ms() -> u64 {
    30_000
}

const fn default_connect_timeout_ms() -> u64 {
    5_000
}

/// Connection and default-model settings for one remote provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// Override of the provider's API base URL (mainly for proxies and tests)
    #[serde(default)]
    pub base_url: Option<String>,

    /// Overall request timeout in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Connect timeout in milliseconds
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,

    #[serde(default)]
    pub transcription_model: Option<String>,

    #[serde(default)]
    pub refinement_model: Option<String>,

    #[serde(default)]
    pub speech_model: Option<String>,

    #[serde(default)]
    pub voice: Option<String>,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout_ms: default_timeout_ms(),
            connect_timeout_ms: default_connect_timeout_ms(),
            transcription_model: None,
            refinement_model: None,
            speech_model: None,
            voice: None,
        }
    }
}

impl RemoteConfig {
    /// Config pointing at a specific base URL, everything else default
    #[must_use]
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: Some(base_url.into()),
            ..Self::default()
        }
    }

    /// Base URL without a trailing slash
    #[must_use]
    pub fn base_url_or<'a>(&'a self, default: &'a str) -> &'a str {
        self.base_url
            .as_deref()
            .unwrap_or(default)
            .trim_end_matches('/')
    }

    /// Configured default model for a service
    #[must_use]
    pub fn model_for(&self, service: ServiceKind) -> Option<&str> {
        match service {
            ServiceKind::Transcription => self.transcription_model.as_deref(),
            ServiceKind::Refinement => self.refinement_model.as_deref(),
            ServiceKind::TextToSpeech => self.speech_model.as_deref(),
        }
    }

    fn validate(&self, provider: ProviderKind) -> Result<(), String> {
        if self.timeout_ms == 0 {
            return Err(format!("{provider}: timeout_ms must be greater than 0"));
        }
        if self.connect_timeout_ms == 0 {
            return Err(format!(
                "{provider}: connect_timeout_ms must be greater than 0"
            ));
        }
        if let Some(url) = &self.base_url {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(format!("{provider}: base_url must be http(s), got {url}"));
            }
        }

        let caps = capabilities(provider);
        for service in ServiceKind::ALL {
            if let Some(model) = self.model_for(service) {
                caps.check_model(service, model)
                    .map_err(|e| format!("{provider}: {e}"))?;
            }
        }
        if let Some(voice) = &self.voice {
            caps.check_voice(voice)
                .map_err(|e| format!("{provider}: {e}"))?;
        }
        Ok(())
    }
}

/// whisper.cpp command line settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WhisperConfig {
    /// `whisper-cli` executable name or path
    pub executable_path: String,
    /// Directory holding `ggml-<model>.bin` files
    pub models_dir: PathBuf,
    /// Model used when the request names none
    pub default_model: String,
    pub threads: u32,
}

impl Default for WhisperConfig {
    fn default() -> Self {
        Self {
            executable_path: "whisper-cli".to_string(),
            models_dir: PathBuf::from("models"),
            default_model: "base".to_string(),
            threads: 4,
        }
    }
}

impl WhisperConfig {
    /// Path of the ggml weights for a model name
    #[must_use]
    pub fn model_path(&self, model: &str) -> PathBuf {
        self.models_dir.join(format!("ggml-{model}.bin"))
    }
}

/// Ollama server used for local refinement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OllamaConfig {
    pub base_url: String,
    pub default_model: String,
    pub timeout_ms: u64,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            default_model: "llama3.2".to_string(),
            timeout_ms: 120_000,
        }
    }
}

/// Piper command line settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PiperConfig {
    pub executable_path: String,
    /// Directory holding `<voice>.onnx` models
    pub voices_dir: PathBuf,
    pub default_voice: String,
    /// Speaking rate, lower is faster
    pub length_scale: f32,
    /// Silence after each sentence in seconds
    pub sentence_silence: f32,
}

impl Default for PiperConfig {
    fn default() -> Self {
        Self {
            executable_path: "piper".to_string(),
            voices_dir: PathBuf::from("voices"),
            default_voice: "en_US-lessac-medium".to_string(),
            length_scale: 1.0,
            sentence_silence: 0.2,
        }
    }
}

impl PiperConfig {
    #[must_use]
    pub fn voice_path(&self, voice: &str) -> PathBuf {
        self.voices_dir.join(format!("{voice}.onnx"))
    }
}

/// On-device engines
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LocalConfig {
    pub whisper: WhisperConfig,
    pub ollama: OllamaConfig,
    pub piper: PiperConfig,
}

impl LocalConfig {
    fn validate(&self) -> Result<(), String> {
        let caps = capabilities(ProviderKind::Local);
        if self.whisper.threads == 0 {
            return Err("local: whisper threads must be greater than 0".to_string());
        }
        caps.check_model(ServiceKind::Transcription, &self.whisper.default_model)
            .map_err(|e| format!("local: {e}"))?;
        caps.check_model(ServiceKind::Refinement, &self.ollama.default_model)
            .map_err(|e| format!("local: {e}"))?;
        caps.check_voice(&self.piper.default_voice)
            .map_err(|e| format!("local: {e}"))?;
        if self.ollama.timeout_ms == 0 {
            return Err("local: ollama timeout_ms must be greater than 0".to_string());
        }
        if !(0.25..=4.0).contains(&self.piper.length_scale) {
            return Err(format!(
                "local: piper length_scale must be between 0.25 and 4.0, got {}",
                self.piper.length_scale
            ));
        }
        Ok(())
    }
}

/// Settings for every adapter, one section per provider
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvidersConfig {
    pub local: LocalConfig,
    pub openai: RemoteConfig,
    pub groq: RemoteConfig,
    pub anthropic: RemoteConfig,
    pub elevenlabs: RemoteConfig,
}

impl ProvidersConfig {
    /// Section for a remote provider; `None` for local
    #[must_use]
    pub const fn remote(&self, provider: ProviderKind) -> Option<&RemoteConfig> {
        match provider {
            ProviderKind::Local => None,
            ProviderKind::OpenAi => Some(&self.openai),
            ProviderKind::Groq => Some(&self.groq),
            ProviderKind::Anthropic => Some(&self.anthropic),
            ProviderKind::ElevenLabs => Some(&self.elevenlabs),
        }
    }

    /// Validate every section
    ///
    /// # Errors
    ///
    /// Returns a description of the first invalid setting.
    pub fn validate(&self) -> Result<(), String> {
        self.local.validate()?;
        for provider in ProviderKind::ALL {
            if let Some(remote) = self.remote(provider) {
                remote.validate(provider)?;
            }
        }
        Ok(())
    }
}
