//! Client for the OpenAI-style REST protocol
//!
//! OpenAI and Groq speak the same protocol for model listing, multipart
//! audio transcription and chat completions, so both adapters wrap this
//! client and differ only in base URL, defaults and capabilities.

use domain::{AudioData, AudioFormat, ProviderError, ProviderKind, Transcription};
use reqwest::Client;
use reqwest::multipart::{Form, Part};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::RemoteConfig;
use crate::error::AdapterError;
use crate::http::{self, Payload};

#[derive(Debug, Clone)]
pub struct OpenAiCompatibleClient {
    provider: ProviderKind,
    client: Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct TranscriptionResponse {
    text: String,
    #[serde(default)]
    language: Option<String>,
    #[serde(default)]
    duration: Option<f64>,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Serialize)]
struct SpeechRequest<'a> {
    model: &'a str,
    input: &'a str,
    voice: &'a str,
    response_format: &'a str,
}

impl OpenAiCompatibleClient {
    /// # Errors
    ///
    /// Returns `AdapterError::Client` if the HTTP client cannot be built.
    pub fn new(
        provider: ProviderKind,
        config: &RemoteConfig,
        default_base_url: &str,
    ) -> Result<Self, AdapterError> {
        Ok(Self {
            provider,
            client: http::build_client(config)?,
            base_url: config.base_url_or(default_base_url).to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Authenticated `GET /models`
    ///
    /// # Errors
    ///
    /// The mapped error when the request fails or the key is refused.
    pub async fn probe(&self, secret: &SecretString) -> Result<bool, ProviderError> {
        let response = self
            .client
            .get(self.url("/models"))
            .bearer_auth(secret.expose_secret())
            .send()
            .await
            .map_err(|e| http::transport_error(&e))?;
        http::ensure_success(response, Payload::Empty).await?;
        debug!(provider = %self.provider, "Probe succeeded");
        Ok(true)
    }

    /// Multipart `POST /audio/transcriptions`
    ///
    /// # Errors
    ///
    /// The mapped error for transport failures, error statuses or bad payloads.
    pub async fn transcribe(
        &self,
        secret: &SecretString,
        audio: &AudioData,
        model: &str,
        language: Option<&str>,
    ) -> Result<Transcription, ProviderError> {
        let part = Part::bytes(audio.bytes().to_vec())
            .file_name(audio.file_name("audio"))
            .mime_str(audio.format().mime_type())
            .map_err(|e| ProviderError::AudioFormatNotSupported(e.to_string()))?;

        let mut form = Form::new()
            .part("file", part)
            .text("model", model.to_string());
        if let Some(language) = language {
            form = form.text("language", language.to_string());
        }

        let response = self
            .client
            .post(self.url("/audio/transcriptions"))
            .bearer_auth(secret.expose_secret())
            .multipart(form)
            .send()
            .await
            .map_err(|e| http::transport_error(&e))?;
        let response =
            http::ensure_success(response, Payload::Audio(audio.duration_ms())).await?;
        let body: TranscriptionResponse = http::read_json(response).await?;

        debug!(
            provider = %self.provider,
            text_len = body.text.len(),
            language = ?body.language,
            "Transcription complete"
        );

        let mut transcription = Transcription::new(body.text);
        if let Some(detected) = body.language.or_else(|| language.map(str::to_string)) {
            transcription = transcription.with_language(detected);
        }
        if let Some(duration) = body.duration {
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let duration_ms = (duration * 1000.0) as u64;
            transcription = transcription.with_duration(duration_ms);
        }
        Ok(transcription)
    }

    /// `POST /chat/completions` with a system and a user message
    ///
    /// # Errors
    ///
    /// The mapped error, or `InvalidResponse` when no text comes back.
    pub async fn chat(
        &self,
        secret: &SecretString,
        model: &str,
        system: &str,
        text: &str,
    ) -> Result<String, ProviderError> {
        let request = ChatRequest {
            model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: text,
                },
            ],
            temperature: 0.2,
        };

        let response = self
            .client
            .post(self.url("/chat/completions"))
            .bearer_auth(secret.expose_secret())
            .json(&request)
            .send()
            .await
            .map_err(|e| http::transport_error(&e))?;
        let response =
            http::ensure_success(response, Payload::Text(text.chars().count())).await?;
        let body: ChatResponse = http::read_json(response).await?;

        body.choices
            .into_iter()
            .find_map(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .filter(|content| !content.is_empty())
            .ok_or_else(|| {
                ProviderError::InvalidResponse(format!(
                    "{} returned no completion text",
                    self.provider
                ))
            })
    }

    /// `POST /audio/speech`, returning mp3 audio
    ///
    /// # Errors
    ///
    /// The mapped error, or `InvalidResponse` for an empty body.
    pub async fn speech(
        &self,
        secret: &SecretString,
        model: &str,
        voice: &str,
        text: &str,
    ) -> Result<AudioData, ProviderError> {
        let request = SpeechRequest {
            model,
            input: text,
            voice,
            response_format: AudioFormat::Mp3.extension(),
        };

        let response = self
            .client
            .post(self.url("/audio/speech"))
            .bearer_auth(secret.expose_secret())
            .json(&request)
            .send()
            .await
            .map_err(|e| http::transport_error(&e))?;
        let response =
            http::ensure_success(response, Payload::Text(text.chars().count())).await?;
        let bytes = http::read_bytes(response).await?;

        debug!(provider = %self.provider, audio_size = bytes.len(), "Speech synthesized");
        Ok(AudioData::new(bytes, AudioFormat::Mp3))
    }
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{body_partial_json, header, header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    async fn client(server: &MockServer) -> OpenAiCompatibleClient {
        OpenAiCompatibleClient::new(
            ProviderKind::OpenAi,
            &RemoteConfig::with_base_url(server.uri()),
            "unused",
        )
        .unwrap()
    }

    fn key() -> SecretString {
        SecretString::from("sk-test".to_string())
    }

    #[tokio::test]
    async fn probe_sends_auth_and_client_headers() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/models"))
            .and(header("authorization", "Bearer sk-test"))
            .and(header("x-client-name", "voxbridge"))
            .and(header_exists("user-agent"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"data": []})))
            .expect(1)
            .mount(&server)
            .await;

        assert!(client(&server).await.probe(&key()).await.unwrap());
    }

    #[tokio::test]
    async fn probe_maps_unauthorized() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/models"))
            .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
                "error": {"message": "Incorrect API key", "code": "invalid_api_key"}
            })))
            .mount(&server)
            .await;

        let err = client(&server).await.probe(&key()).await.unwrap_err();
        assert!(matches!(err, ProviderError::SecretInvalid(_)));
    }

    #[tokio::test]
    async fn transcribe_parses_text_and_duration() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/audio/transcriptions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "text": "hello world",
                "language": "en",
                "duration": 1.5
            })))
            .mount(&server)
            .await;

        let audio = AudioData::new(vec![0_u8; 64], AudioFormat::Wav);
        let result = client(&server)
            .await
            .transcribe(&key(), &audio, "whisper-1", None)
            .await
            .unwrap();

        assert_eq!(result.text, "hello world");
        assert_eq!(result.language.as_deref(), Some("en"));
        assert_eq!(result.duration_ms, Some(1500));
    }

    #[tokio::test]
    async fn transcribe_keeps_requested_language_when_not_echoed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/audio/transcriptions"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"text": "hallo"})),
            )
            .mount(&server)
            .await;

        let audio = AudioData::new(vec![1_u8; 16], AudioFormat::Mp3);
        let result = client(&server)
            .await
            .transcribe(&key(), &audio, "whisper-1", Some("de"))
            .await
            .unwrap();

        assert_eq!(result.language.as_deref(), Some("de"));
    }

    #[tokio::test]
    async fn chat_sends_system_prompt_and_returns_content() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(body_partial_json(serde_json::json!({
                "model": "gpt-4o-mini",
                "messages": [{"role": "system", "content": "be brief"}, {"role": "user", "content": "um hi"}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"message": {"role": "assistant", "content": "  Hi.  "}}]
            })))
            .mount(&server)
            .await;

        let text = client(&server)
            .await
            .chat(&key(), "gpt-4o-mini", "be brief", "um hi")
            .await
            .unwrap();
        assert_eq!(text, "Hi.");
    }

    #[tokio::test]
    async fn chat_without_choices_is_invalid_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"choices": []})))
            .mount(&server)
            .await;

        let err = client(&server)
            .await
            .chat(&key(), "gpt-4o-mini", "s", "t")
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn malformed_json_is_invalid_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let err = client(&server)
            .await
            .chat(&key(), "gpt-4o-mini", "s", "t")
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn speech_returns_mp3_bytes() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/audio/speech"))
            .and(body_partial_json(serde_json::json!({
                "model": "tts-1", "voice": "nova", "input": "hello", "response_format": "mp3"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0xFF, 0xFB, 0x90]))
            .mount(&server)
            .await;

        let audio = client(&server)
            .await
            .speech(&key(), "tts-1", "nova", "hello")
            .await
            .unwrap();
        assert_eq!(audio.format(), AudioFormat::Mp3);
        assert_eq!(audio.bytes(), &[0xFF, 0xFB, 0x90]);
    }

    #[tokio::test]
    async fn rate_limit_and_server_errors_map() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/audio/speech"))
            .respond_with(ResponseTemplate::new(429).set_body_json(serde_json::json!({
                "error": {"message": "Rate limit reached", "code": "rate_limit_exceeded"}
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let client = client(&server).await;
        assert_eq!(
            client.speech(&key(), "tts-1", "nova", "x").await.unwrap_err(),
            ProviderError::RateLimitExceeded
        );
        assert!(matches!(
            client.chat(&key(), "gpt-4o", "s", "t").await.unwrap_err(),
            ProviderError::ServiceUnavailable(_)
        ));
    }

    #[tokio::test]
    async fn unreachable_server_is_network_error() {
        let client = OpenAiCompatibleClient::new(
            ProviderKind::Groq,
            &RemoteConfig::with_base_url("http://127.0.0.1:9"),
            "unused",
        )
        .unwrap();

        let err = client.probe(&key()).await.unwrap_err();
        assert!(matches!(err, ProviderError::NetworkError(_)));
    }
}
