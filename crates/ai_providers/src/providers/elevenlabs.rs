//! ElevenLabs adapter (text-to-speech only)

use std::sync::Arc;

use application::{CallOptions, CredentialStorePort, ProviderAdapter};
use async_trait::async_trait;
use domain::{AudioData, AudioFormat, ProviderError, ProviderKind, ServiceKind};
use reqwest::{Client, RequestBuilder};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use tracing::{debug, instrument};

use super::{resolve_model, resolve_voice};
use crate::config::RemoteConfig;
use crate::credentials::CredentialSlot;
use crate::error::AdapterError;
use crate::http::{self, Payload};

pub const DEFAULT_BASE_URL: &str = "https://api.elevenlabs.io/v1";
const DEFAULT_SPEECH_MODEL: &str = "eleven_multilingual_v2";
// Rachel
const DEFAULT_VOICE: &str = "21m00Tcm4TlvDq8ikWAM";
const OUTPUT_FORMAT: &str = "mp3_44100_128";

#[derive(Debug)]
pub struct ElevenLabsProvider {
    client: Client,
    base_url: String,
    credentials: CredentialSlot,
    config: RemoteConfig,
}

#[derive(Debug, Serialize)]
struct SpeechRequest<'a> {
    text: &'a str,
    model_id: &'a str,
}

impl ElevenLabsProvider {
    /// # Errors
    ///
    /// Returns `AdapterError::Client` if the HTTP client cannot be built.
    pub fn new(
        config: RemoteConfig,
        store: Arc<dyn CredentialStorePort>,
    ) -> Result<Self, AdapterError> {
        Ok(Self {
            client: http::build_client(&config)?,
            base_url: config.base_url_or(DEFAULT_BASE_URL).to_string(),
            credentials: CredentialSlot::new(ProviderKind::ElevenLabs, store),
            config,
        })
    }

    fn authorized(&self, request: RequestBuilder, secret: &SecretString) -> RequestBuilder {
        request
            .bearer_auth(secret.expose_secret())
            .header("xi-api-key", secret.expose_secret())
    }
}

#[async_trait]
impl ProviderAdapter for ElevenLabsProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::ElevenLabs
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

    #[instrument(skip(self), fields(provider = "elevenlabs"))]
    async fn test_connection(&self) -> Result<bool, ProviderError> {
        let secret = self.credentials.current()?;
        let response = self
            .authorized(self.client.get(format!("{}/user", self.base_url)), &secret)
            .send()
            .await
            .map_err(|e| http::transport_error(&e))?;
        http::ensure_success(response, Payload::Empty).await?;
        Ok(true)
    }

    #[instrument(skip(self, text, options), fields(provider = "elevenlabs", text_len = text.len()))]
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

        debug!(model, voice, "Synthesizing with ElevenLabs");
        let response = self
            .authorized(
                self.client
                    .post(format!("{}/text-to-speech/{voice}", self.base_url)),
                &secret,
            )
            .query(&[("output_format", OUTPUT_FORMAT)])
            .header("accept", AudioFormat::Mp3.mime_type())
            .json(&SpeechRequest {
                text,
                model_id: model,
            })
            .send()
            .await
            .map_err(|e| http::transport_error(&e))?;
        let response =
            http::ensure_success(response, Payload::Text(text.chars().count())).await?;
        let bytes = http::read_bytes(response).await?;

        Ok(AudioData::new(bytes, AudioFormat::Mp3))
    }
}
