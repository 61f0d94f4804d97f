//! On-device provider
//!
//! Combines three engines behind one adapter:
//!
//! - transcription: whisper.cpp (`whisper-cli`)
//! - refinement: an Ollama server on localhost
//! - speech: piper
//!
//! No secret is involved, so the adapter always reports itself configured.
//! Missing binaries or models surface as `ServiceUnavailable` on the call
//! that needs them.

mod ollama;
mod piper;
mod whisper;

use std::path::Path;
use std::process::Stdio;

use application::{CallOptions, ProviderAdapter};
use async_trait::async_trait;
use domain::{AudioData, ProviderError, ProviderKind, RefinementMode, ServiceKind, Transcription};
pub use ollama::OllamaEngine;
pub use piper::PiperEngine;
use secrecy::SecretString;
use tokio::process::Command;
use tracing::{debug, info, instrument};
pub use whisper::WhisperEngine;

use super::{check_language, resolve_model, resolve_voice};
use crate::config::LocalConfig;
use crate::error::AdapterError;
use crate::prompts;

#[derive(Debug)]
pub struct LocalProvider {
    whisper: WhisperEngine,
    ollama: OllamaEngine,
    piper: PiperEngine,
}

impl LocalProvider {
    /// # Errors
    ///
    /// Returns `AdapterError::Client` if the Ollama HTTP client cannot be built.
    pub fn new(config: LocalConfig) -> Result<Self, AdapterError> {
        Ok(Self {
            ollama: OllamaEngine::new(&config.ollama)?,
            whisper: WhisperEngine::new(config.whisper),
            piper: PiperEngine::new(config.piper),
        })
    }
}

#[async_trait]
impl ProviderAdapter for LocalProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Local
    }

    fn is_configured(&self) -> bool {
        true
    }

    async fn configure(&self, secret: Option<SecretString>) -> Result<(), ProviderError> {
        if secret.is_some() {
            debug!("Local provider ignores the supplied secret");
        }
        info!("Local provider ready");
        Ok(())
    }

    async fn restore(&self) -> Result<bool, ProviderError> {
        Ok(true)
    }

    async fn clear(&self) -> Result<(), ProviderError> {
        Ok(())
    }

    #[instrument(skip(self), fields(provider = "local"))]
    async fn test_connection(&self) -> Result<bool, ProviderError> {
        let (whisper, ollama, piper) = tokio::join!(
            self.whisper.is_available(),
            self.ollama.is_available(),
            self.piper.is_available()
        );
        debug!(whisper, ollama, piper, "Local engine availability");
        Ok(whisper || ollama || piper)
    }

    #[instrument(skip(self, audio, options), fields(provider = "local", audio_size = audio.len()))]
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
            None,
            self.whisper.default_model(),
        )?;
        self.whisper.transcribe(audio, model, language).await
    }

    #[instrument(skip(self, text, options), fields(provider = "local", text_len = text.len()))]
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
            None,
            self.ollama.default_model(),
        )?;
        self.ollama
            .generate(model, &prompts::system_prompt(mode), text)
            .await
    }

    #[instrument(skip(self, text, options), fields(provider = "local", text_len = text.len()))]
    async fn synthesize_speech(
        &self,
        text: &str,
        options: &CallOptions,
    ) -> Result<AudioData, ProviderError> {
        let caps = self.capabilities();
        caps.check_text(text)?;
        resolve_model(caps, ServiceKind::TextToSpeech, options, None, "piper")?;
        let voice = resolve_voice(caps, options, None, self.piper.default_voice())?;
        self.piper.synthesize(text, voice).await
    }
}

/// Whether `executable` is a path that exists or a command that answers `--help`
pub(crate) async fn executable_available(executable: &str) -> bool {
    if Path::new(executable).exists() {
        return true;
    }
    Command::new(executable)
        .arg("--help")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .kill_on_drop(true)
        .status()
        .await
        .is_ok_and(|status| status.success())
}

pub(crate) fn io_error(action: &str, err: &std::io::Error) -> ProviderError {
    ProviderError::ServiceUnavailable(format!("failed to {action}: {err}"))
}

#[cfg(test)]
mod tests {
    use domain::AudioFormat;
    use tempfile::TempDir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::config::{OllamaConfig, PiperConfig, WhisperConfig};

    fn offline_config(dir: &TempDir, ollama_url: String) -> LocalConfig {
        LocalConfig {
            whisper: WhisperConfig {
                executable_path: "voxbridge-missing-whisper-cli".to_string(),
                models_dir: dir.path().to_path_buf(),
                ..WhisperConfig::default()
            },
            ollama: OllamaConfig {
                base_url: ollama_url,
                ..OllamaConfig::default()
            },
            piper: PiperConfig {
                executable_path: "voxbridge-missing-piper".to_string(),
                voices_dir: dir.path().to_path_buf(),
                ..PiperConfig::default()
            },
        }
    }

    #[tokio::test]
    async fn configure_without_secret_succeeds() {
        let dir = TempDir::new().unwrap();
        let provider = LocalProvider::new(offline_config(&dir, "http://127.0.0.1:9".into())).unwrap();

        provider.configure(None).await.unwrap();
        assert!(provider.is_configured());
        assert!(provider.restore().await.unwrap());
        provider.clear().await.unwrap();
        assert!(provider.is_configured());
    }

    #[tokio::test]
    async fn probe_fails_when_no_engine_is_available() {
        let dir = TempDir::new().unwrap();
        let provider = LocalProvider::new(offline_config(&dir, "http://127.0.0.1:9".into())).unwrap();
        assert!(!provider.test_connection().await.unwrap());
    }

    #[tokio::test]
    async fn probe_succeeds_when_ollama_answers() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/tags"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"models": []})))
            .mount(&server)
            .await;
        let dir = TempDir::new().unwrap();
        let provider = LocalProvider::new(offline_config(&dir, server.uri())).unwrap();

        assert!(provider.test_connection().await.unwrap());
    }

    #[tokio::test]
    async fn refine_goes_through_ollama() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"response": "Done."})))
            .mount(&server)
            .await;
        let dir = TempDir::new().unwrap();
        let provider = LocalProvider::new(offline_config(&dir, server.uri())).unwrap();

        let text = provider
            .refine("done", &RefinementMode::Clean, &CallOptions::default())
            .await
            .unwrap();
        assert_eq!(text, "Done.");
    }

    #[tokio::test]
    async fn rejects_formats_and_models_it_cannot_handle() {
        let dir = TempDir::new().unwrap();
        let provider = LocalProvider::new(offline_config(&dir, "http://127.0.0.1:9".into())).unwrap();

        let webm = AudioData::new(vec![0; 8], AudioFormat::Webm);
        assert!(matches!(
            provider.transcribe(&webm, None, &CallOptions::default()).await,
            Err(ProviderError::AudioFormatNotSupported(_))
        ));

        let remote_model = CallOptions::default().with_model("gpt-4o");
        assert!(matches!(
            provider
                .refine("x", &RefinementMode::Clean, &remote_model)
                .await,
            Err(ProviderError::ModelNotSupported(_))
        ));
    }

    #[tokio::test]
    async fn transcription_without_whisper_is_service_unavailable() {
        let dir = TempDir::new().unwrap();
        let provider = LocalProvider::new(offline_config(&dir, "http://127.0.0.1:9".into())).unwrap();

        let wav = AudioData::new(vec![0; 8], AudioFormat::Wav);
        let err = provider
            .transcribe(&wav, Some("en"), &CallOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::ServiceUnavailable(_)));
    }

    #[tokio::test]
    async fn executable_lookup() {
        assert!(!executable_available("voxbridge-definitely-not-installed").await);

        let dir = TempDir::new().unwrap();
        let file = dir.path().join("tool");
        std::fs::write(&file, b"").unwrap();
        assert!(executable_available(file.to_str().unwrap()).await);
    }
}
