//! Piper text-to-speech engine
//!
//! Text goes in on stdin; piper writes a WAV file we read back.

use std::process::Stdio;

use domain::{AudioData, AudioFormat, ProviderError};
use tempfile::TempDir;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, instrument};

use super::{executable_available, io_error};
use crate::config::PiperConfig;

#[derive(Debug, Clone)]
pub struct PiperEngine {
    config: PiperConfig,
}

impl PiperEngine {
    #[must_use]
    pub const fn new(config: PiperConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn default_voice(&self) -> &str {
        &self.config.default_voice
    }

    /// Executable runs and the default voice model is present
    pub async fn is_available(&self) -> bool {
        let executable = executable_available(&self.config.executable_path).await;
        let voice = self
            .config
            .voice_path(&self.config.default_voice)
            .exists();
        debug!(executable, voice, "Piper availability");
        executable && voice
    }

    #[instrument(skip(self, text), fields(text_len = text.len()))]
    pub async fn synthesize(&self, text: &str, voice: &str) -> Result<AudioData, ProviderError> {
        let voice_path = self.config.voice_path(voice);
        if !voice_path.exists() {
            return Err(ProviderError::ServiceUnavailable(format!(
                "piper voice model {} not found",
                voice_path.display()
            )));
        }

        let workdir = TempDir::new().map_err(|e| io_error("create temp dir", &e))?;
        let output_path = workdir.path().join("speech.wav");

        let mut child = Command::new(&self.config.executable_path)
            .arg("--model")
            .arg(&voice_path)
            .arg("--output_file")
            .arg(&output_path)
            .arg("--length_scale")
            .arg(self.config.length_scale.to_string())
            .arg("--sentence_silence")
            .arg(self.config.sentence_silence.to_string())
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    ProviderError::ServiceUnavailable(format!(
                        "{} not found, install piper",
                        self.config.executable_path
                    ))
                } else {
                    io_error("start piper", &e)
                }
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(text.as_bytes())
                .await
                .map_err(|e| io_error("write piper input", &e))?;
            // closing stdin tells piper the text is complete
            drop(stdin);
        }

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| io_error("wait for piper", &e))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ProviderError::ServiceUnavailable(format!(
                "piper exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        let bytes = tokio::fs::read(&output_path)
            .await
            .map_err(|e| ProviderError::InvalidResponse(format!("piper wrote no audio: {e}")))?;
        if bytes.is_empty() {
            return Err(ProviderError::InvalidResponse(
                "piper produced empty audio".to_string(),
            ));
        }

        debug!(voice, audio_size = bytes.len(), "Speech synthesized locally");
        Ok(AudioData::new(bytes, AudioFormat::Wav))
    }
}
