//! Anthropic adapter (refinement only, Messages API)

use std::sync::Arc;

use application::{CallOptions, CredentialStorePort, ProviderAdapter};
use async_trait::async_trait;
use domain::{ProviderError, ProviderKind, RefinementMode, ServiceKind};
use reqwest::{Client, RequestBuilder};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::resolve_model;
use crate::config::RemoteConfig;
use crate::credentials::CredentialSlot;
use crate::error::AdapterError;
use crate::http::{self, Payload};
use crate::prompts;

pub const DEFAULT_BASE_URL: &str = "https://api.anthropic.com/v1";
const API_VERSION: &str = "2023-06-01";
const DEFAULT_REFINEMENT_MODEL: &str = "claude-3-5-haiku-latest";
const MAX_OUTPUT_TOKENS: u32 = 4_096;

#[derive(Debug)]
pub struct AnthropicProvider {
    client: Client,
    base_url: String,
    credentials: CredentialSlot,
    config: RemoteConfig,
}

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: [Message<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

impl AnthropicProvider {
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
            credentials: CredentialSlot::new(ProviderKind::Anthropic, store),
            config,
        })
    }

    fn authorized(&self, request: RequestBuilder, secret: &SecretString) -> RequestBuilder {
        request
            .bearer_auth(secret.expose_secret())
            .header("x-api-key", secret.expose_secret())
            .header("anthropic-version", API_VERSION)
    }
}

#[async_trait]
impl ProviderAdapter for AnthropicProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Anthropic
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

    #[instrument(skip(self), fields(provider = "anthropic"))]
    async fn test_connection(&self) -> Result<bool, ProviderError> {
        let secret = self.credentials.current()?;
        let response = self
            .authorized(self.client.get(format!("{}/models", self.base_url)), &secret)
            .send()
            .await
            .map_err(|e| http::transport_error(&e))?;
        http::ensure_success(response, Payload::Empty).await?;
        Ok(true)
    }

    #[instrument(skip(self, text, options), fields(provider = "anthropic", text_len = text.len()))]
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
        let system = prompts::system_prompt(mode);

        let request = MessagesRequest {
            model,
            max_tokens: MAX_OUTPUT_TOKENS,
            system: &system,
            messages: [Message {
                role: "user",
                content: text,
            }],
        };

        debug!(model, %mode, "Refining with Anthropic");
        let response = self
            .authorized(
                self.client.post(format!("{}/messages", self.base_url)),
                &secret,
            )
            .json(&request)
            .send()
            .await
            .map_err(|e| http::transport_error(&e))?;
        let response =
            http::ensure_success(response, Payload::Text(text.chars().count())).await?;
        let body: MessagesResponse = http::read_json(response).await?;

        let refined: String = body
            .content
            .into_iter()
            .filter(|block| block.kind == "text")
            .filter_map(|block| block.text)
            .collect();
        let refined = refined.trim();
        if refined.is_empty() {
            return Err(ProviderError::InvalidResponse(
                "anthropic returned no text content".to_string(),
            ));
        }
        Ok(refined.to_string())
    }
}
