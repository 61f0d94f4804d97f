//! Shared HTTP plumbing for remote adapters
//!
//! Every adapter builds its client here so all requests carry the same client
//! identifier, and every non-2xx response goes through [`map_status`] so the
//! error taxonomy is applied uniformly across vendors.

use std::time::Duration;

use domain::ProviderError;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::config::RemoteConfig;
use crate::error::AdapterError;

/// Value of the `X-Client-Name` header
pub const CLIENT_NAME: &str = "voxbridge";

/// `User-Agent` sent on every request
pub const USER_AGENT: &str = concat!("voxbridge/", env!("CARGO_PKG_VERSION"));

const MAX_ERROR_MESSAGE_CHARS: usize = 200;

/// Build a client with the configured timeouts and identifier headers
///
/// # Errors
///
/// Returns `AdapterError::Client` if the TLS backend cannot be initialised.
pub fn build_client(config: &RemoteConfig) -> Result<Client, AdapterError> {
    client_with_timeouts(
        Duration::from_millis(config.timeout_ms),
        Duration::from_millis(config.connect_timeout_ms),
    )
}

/// Build a client with explicit timeouts and identifier headers
///
/// # Errors
///
/// Returns `AdapterError::Client` if the TLS backend cannot be initialised.
pub fn client_with_timeouts(
    timeout: Duration,
    connect_timeout: Duration,
) -> Result<Client, AdapterError> {
    let mut headers = HeaderMap::new();
    headers.insert("X-Client-Name", HeaderValue::from_static(CLIENT_NAME));

    Ok(Client::builder()
        .user_agent(USER_AGENT)
        .default_headers(headers)
        .timeout(timeout)
        .connect_timeout(connect_timeout)
        .build()?)
}

/// What a request carried, used to describe `413 Payload Too Large`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Payload {
    /// Text of this many characters
    Text(usize),
    /// Audio of this duration, if known
    Audio(Option<u64>),
    /// Probe or other request without a body
    Empty,
}

/// Map a transport-level failure
#[must_use]
pub fn transport_error(err: &reqwest::Error) -> ProviderError {
    if err.is_timeout() {
        ProviderError::NetworkError(format!("request timed out: {err}"))
    } else if err.is_connect() {
        ProviderError::NetworkError(format!("connection failed: {err}"))
    } else if err.is_decode() {
        ProviderError::InvalidResponse(err.to_string())
    } else {
        ProviderError::NetworkError(err.to_string())
    }
}

/// Pass 2xx responses through; turn anything else into a `ProviderError`
///
/// # Errors
///
/// Returns the mapped error for every non-success status.
pub async fn ensure_success(response: Response, payload: Payload) -> Result<Response, ProviderError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    debug!(status = %status, "Provider returned an error response");
    Err(map_status(status, &body, payload))
}

/// Decode a JSON body
///
/// # Errors
///
/// Returns `InvalidResponse` if the body does not match `T`.
pub async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, ProviderError> {
    let bytes = response.bytes().await.map_err(|e| transport_error(&e))?;
    serde_json::from_slice(&bytes)
        .map_err(|e| ProviderError::InvalidResponse(format!("unexpected payload: {e}")))
}

/// Read a binary body, rejecting empty ones
///
/// # Errors
///
/// Returns `InvalidResponse` for an empty body, or a transport error.
pub async fn read_bytes(response: Response) -> Result<Vec<u8>, ProviderError> {
    let bytes = response.bytes().await.map_err(|e| transport_error(&e))?;
    if bytes.is_empty() {
        return Err(ProviderError::InvalidResponse(
            "empty audio payload".to_string(),
        ));
    }
    Ok(bytes.to_vec())
}

/// Map a non-success status and its body to the error taxonomy
#[must_use]
pub fn map_status(status: StatusCode, body: &str, payload: Payload) -> ProviderError {
    let detail = ErrorBody::parse(body);
    let message = detail.describe(status);

    match status.as_u16() {
        401 | 403 | 429 if detail.is_quota() => ProviderError::QuotaExceeded,
        401 | 403 => ProviderError::SecretInvalid(message),
        402 => ProviderError::QuotaExceeded,
        429 => ProviderError::RateLimitExceeded,
        404 if detail.is_model_not_found() => ProviderError::ModelNotSupported(message),
        413 => match payload {
            // The server only reports that its limit was exceeded.
            Payload::Text(length) => ProviderError::TextTooLong {
                length,
                max: length.saturating_sub(1),
            },
            Payload::Audio(Some(duration_ms)) => ProviderError::AudioTooLong {
                duration_ms,
                max_ms: duration_ms.saturating_sub(1),
            },
            Payload::Audio(None) | Payload::Empty => {
                ProviderError::InvalidResponse(format!("payload too large: {message}"))
            },
        },
        415 => ProviderError::AudioFormatNotSupported(message),
        500..=599 => ProviderError::ServiceUnavailable(message),
        _ => ProviderError::InvalidResponse(message),
    }
}

/// Error code and message pulled out of a vendor error body
///
/// Understands `{"error": {...}}` (OpenAI, Groq, Anthropic) and
/// `{"detail": ...}` (ElevenLabs); anything else is kept as plain text.
#[derive(Debug, Default, PartialEq, Eq)]
struct ErrorBody {
    code: Option<String>,
    message: Option<String>,
}

impl ErrorBody {
    fn parse(body: &str) -> Self {
        let Ok(value) = serde_json::from_str::<Value>(body) else {
            let text = body.trim();
            return Self {
                code: None,
                message: (!text.is_empty()).then(|| truncate(text)),
            };
        };

        let inner = value
            .get("error")
            .or_else(|| value.get("detail"))
            .unwrap_or(&value);

        match inner {
            Value::String(text) => Self {
                code: None,
                message: Some(truncate(text)),
            },
            Value::Object(fields) => {
                let text_field = |key: &str| fields.get(key).and_then(Value::as_str);
                Self {
                    code: text_field("code")
                        .or_else(|| text_field("status"))
                        .or_else(|| text_field("type"))
                        .map(ToString::to_string),
                    message: text_field("message").map(truncate),
                }
            },
            _ => Self::default(),
        }
    }

    fn describe(&self, status: StatusCode) -> String {
        match (&self.code, &self.message) {
            (Some(code), Some(message)) => format!("{status} {code}: {message}"),
            (None, Some(message)) => format!("{status}: {message}"),
            (Some(code), None) => format!("{status} {code}"),
            (None, None) => status.to_string(),
        }
    }

    fn is_quota(&self) -> bool {
        self.code
            .as_deref()
            .is_some_and(|code| matches!(code, "insufficient_quota" | "quota_exceeded"))
    }

    /// OpenAI/Groq `model_not_found`, Anthropic `not_found_error` on a
    /// `model:` message, or Ollama's bare "model ... not found"
    fn is_model_not_found(&self) -> bool {
        let message = self.message.as_deref().unwrap_or_default().to_lowercase();
        match self.code.as_deref() {
            Some(code) if code.contains("model_not_found") => true,
            Some("not_found_error") => message.starts_with("model:"),
            Some(_) => false,
            None => message.starts_with("model ") && message.contains("not found"),
        }
    }
}

fn truncate(text: &str) -> String {
    text.chars().take(MAX_ERROR_MESSAGE_CHARS).collect()
}
