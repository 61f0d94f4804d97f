//! Ollama refinement engine

use std::time::Duration;

use domain::ProviderError;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::config::OllamaConfig;
use crate::error::AdapterError;
use crate::http::{self, Payload};

const HEALTH_TIMEOUT: Duration = Duration::from_secs(5);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub struct OllamaEngine {
    client: Client,
    base_url: String,
    default_model: String,
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    system: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

impl OllamaEngine {
    /// # Errors
    ///
    /// Returns `AdapterError::Client` if the HTTP client cannot be built.
    pub fn new(config: &OllamaConfig) -> Result<Self, AdapterError> {
        Ok(Self {
            client: http::client_with_timeouts(
                Duration::from_millis(config.timeout_ms),
                CONNECT_TIMEOUT,
            )?,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            default_model: config.default_model.clone(),
        })
    }

    #[must_use]
    pub fn default_model(&self) -> &str {
        &self.default_model
    }

    /// Whether the server answers `GET /api/tags`
    pub async fn is_available(&self) -> bool {
        let result = self
            .client
            .get(format!("{}/api/tags", self.base_url))
            .timeout(HEALTH_TIMEOUT)
            .send()
            .await;
        match result {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                debug!(error = %e, "Ollama not reachable");
                false
            },
        }
    }

    #[instrument(skip(self, system, text), fields(text_len = text.len()))]
    pub async fn generate(
        &self,
        model: &str,
        system: &str,
        text: &str,
    ) -> Result<String, ProviderError> {
        let request = GenerateRequest {
            model,
            system,
            prompt: text,
            stream: false,
        };

        let response = self
            .client
            .post(format!("{}/api/generate", self.base_url))
            .json(&request)
            .send()
            .await
            .map_err(|e| http::transport_error(&e))?;
        let response =
            http::ensure_success(response, Payload::Text(text.chars().count())).await?;
        let body: GenerateResponse = http::read_json(response).await?;

        let refined = body.response.trim();
        if refined.is_empty() {
            return Err(ProviderError::InvalidResponse(
                "ollama returned an empty response".to_string(),
            ));
        }
        Ok(refined.to_string())
    }
}
