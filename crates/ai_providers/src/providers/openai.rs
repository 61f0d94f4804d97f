//! OpenAI adapter
//!
//! Whisper/GPT-4o transcription, chat-completion refinement and TTS, all
//! through the shared [`OpenAiCompatibleClient`].

use std::sync::Arc;

use application::{CallOptions, CredentialStorePort, ProviderAdapter};
use async_trait::async_trait;
use domain::{AudioData, ProviderError, ProviderKind, RefinementMode, ServiceKind, Transcription};
use secrecy::SecretString;
use tracing::{debug, instrument};

use super::{OpenAiCompatibleClient, check_language, resolve_model, resolve_voice};
use crate::config::RemoteConfig;
use crate::credentials::CredentialSlot;
use crate::error::AdapterError;
use crate::prompts;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_TRANSCRIPTION_MODEL: &str = "whisper-1";
const DEFAULT_REFINEMENT_MODEL: &str = "gpt-4o-mini";
const DEFAULT_SPEECH_MODEL: &str = "tts-1";
const DEFAULT_VOICE: &str = "nova";

#[derive(Debug)]
pub struct OpenAiProvider {
    api: OpenAiCompatibleClient,
    credentials: CredentialSlot,
    config: RemoteConfig,
}

impl OpenAiProvider {
    /// # Errors
    ///
    /// Returns `AdapterError::Client` if the HTTP client cannot be built.
    pub fn new(
        config: RemoteConfig,
        store: Arc<dyn CredentialStorePort>,
    ) -> Result<Self, AdapterError> {
        Ok(Self {
            api: OpenAiCompatibleClient::new(ProviderKind::OpenAi, &config, DEFAULT_BASE_URL)?,
            credentials: CredentialSlot::new(ProviderKind::OpenAi, store),
            config,
        })
    }
}

#[async_trait]
impl ProviderAdapter for OpenAiProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::OpenAi
    }

    fn is_configured(&self) -> bool {
        self.credentials.is_active()
    }

    async fn configure(&self, secret: Option<SecretString>) -> Result<(), ProviderError> {
        self.credentials
            .configure(secret, || self.test_connection())
            .await
    }

    async fn restore(&self) -> Result<bool, ProviderError> {
        self.credentials.restore().await
    }

    async fn clear(&self) -> Result<(), ProviderError> {
        self.credentials.clear().await
    }

    #[instrument(skip(self), fields(provider = "openai"))]
    async fn test_connection(&self) -> Result<bool, ProviderError> {
        let secret = self.credentials.current()?;
        self.api.probe(&secret).await
    }

    #[instrument(skip(self, audio, options), fields(provider = "openai", audio_size = audio.len()))]
    async fn transcribe(
        &self,
        audio: &AudioData,
        language: Option<&str>,
        options: &CallOptions,
    ) -> Result<Transcription, ProviderError> {
        let caps = self.capabilities();
        caps.check_audio(audio)?;
        check_language(caps, language)?;
        let model = resolve_model(
            caps,
            ServiceKind::Transcription,
            options,
            self.config.transcription_model.as_deref(),
            DEFAULT_TRANSCRIPTION_MODEL,
        )?;
        let secret = self.credentials.active()?;

        debug!(model, "Transcribing with OpenAI");
        self.api.transcribe(&secret, audio, model, language).await
    }

    #[instrument(skip(self, text, options), fields(provider = "openai", text_len = text.len()))]
    async fn refine(
        &self,
        text: &str,
        mode: &RefinementMode,
        options: &CallOptions,
    ) -> Result<String, ProviderError> {
        let caps = self.capabilities();
        caps.check_text(text)?;
        let model = resolve_model(
            caps,
            ServiceKind::Refinement,
            options,
            self.config.refinement_model.as_deref(),
            DEFAULT_REFINEMENT_MODEL,
        )?;
        let secret = self.credentials.active()?;

        debug!(model, %mode, "Refining with OpenAI");
        self.api
            .chat(&secret, model, &prompts::system_prompt(mode), text)
            .await
    }

    #[instrument(skip(self, text, options), fields(provider = "openai", text_len = text.len()))]
    async fn synthesize_speech(
        &self,
        text: &str,
        options: &CallOptions,
    ) -> Result<AudioData, ProviderError> {
        let caps = self.capabilities();
        caps.check_text(text)?;
        let model = resolve_model(
            caps,
            ServiceKind::TextToSpeech,
            options,
            self.config.speech_model.as_deref(),
            DEFAULT_SPEECH_MODEL,
        )?;
        let voice = resolve_voice(caps, options, self.config.voice.as_deref(), DEFAULT_VOICE)?;
        let secret = self.credentials.active()?;

        debug!(model, voice, "Synthesizing with OpenAI");
        self.api.speech(&secret, model, voice, text).await
    }
}
