//! whisper.cpp transcription engine
//!
//! Runs the `whisper-cli` binary on a temporary copy of the audio and reads
//! the plain-text transcript it writes next to it.

use std::path::Path;
use std::process::Stdio;

use domain::{AudioData, ProviderError, Transcription};
use tempfile::TempDir;
use tokio::process::Command;
use tracing::{debug, instrument, warn};

use super::{executable_available, io_error};
use crate::config::WhisperConfig;

const TRANSCRIPT_STEM: &str = "transcript";

#[derive(Debug, Clone)]
pub struct WhisperEngine {
    config: WhisperConfig,
}

impl WhisperEngine {
    #[must_use]
    pub const fn new(config: WhisperConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn default_model(&self) -> &str {
        &self.config.default_model
    }

    /// Executable runs and the default model file is present
    pub async fn is_available(&self) -> bool {
        let executable = executable_available(&self.config.executable_path).await;
        let model = self
            .config
            .model_path(&self.config.default_model)
            .exists();
        debug!(executable, model, "whisper.cpp availability");
        executable && model
    }

    #[instrument(skip(self, audio), fields(format = %audio.format()))]
    pub async fn transcribe(
        &self,
        audio: &AudioData,
        model: &str,
        language: Option<&str>,
    ) -> Result<Transcription, ProviderError> {
        let model_path = self.config.model_path(model);
        if !model_path.exists() {
            return Err(ProviderError::ServiceUnavailable(format!(
                "whisper model file {} not found",
                model_path.display()
            )));
        }

        let workdir = TempDir::new().map_err(|e| io_error("create temp dir", &e))?;
        let input = workdir.path().join(audio.file_name("input"));
        tokio::fs::write(&input, audio.bytes())
            .await
            .map_err(|e| io_error("write audio", &e))?;

        let text = self
            .run(&model_path, &input, &workdir.path().join(TRANSCRIPT_STEM), language)
            .await?;
        if text.is_empty() {
            warn!("whisper.cpp returned an empty transcription");
        }

        let mut transcription = Transcription::new(text);
        if let Some(language) = language {
            transcription = transcription.with_language(language);
        }
        if let Some(duration_ms) = audio.duration_ms() {
            transcription = transcription.with_duration(duration_ms);
        }
        Ok(transcription)
    }

    async fn run(
        &self,
        model_path: &Path,
        input: &Path,
        output_stem: &Path,
        language: Option<&str>,
    ) -> Result<String, ProviderError> {
        let mut cmd = Command::new(&self.config.executable_path);
        cmd.arg("--model")
            .arg(model_path)
            .arg("--file")
            .arg(input)
            .arg("--output-txt")
            .arg("--output-file")
            .arg(output_stem)
            .arg("--no-timestamps")
            .arg("--threads")
            .arg(self.config.threads.to_string())
            .arg("--language")
            .arg(language.unwrap_or("auto"))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        debug!(?cmd, "Running whisper.cpp");
        let output = cmd.output().await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ProviderError::ServiceUnavailable(format!(
                    "{} not found, install whisper.cpp",
                    self.config.executable_path
                ))
            } else {
                io_error("run whisper.cpp", &e)
            }
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ProviderError::ServiceUnavailable(format!(
                "whisper.cpp exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        let transcript = output_stem.with_extension("txt");
        let text = tokio::fs::read_to_string(&transcript).await.map_err(|e| {
            ProviderError::InvalidResponse(format!("whisper.cpp wrote no transcript: {e}"))
        })?;
        Ok(text.trim().to_string())
    }
}
