//! Errors raised while building adapters
//!
//! Runtime failures use [`domain::ProviderError`]; this type only covers
//! construction, before any request is sent.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AdapterError {
    /// Invalid adapter configuration
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The HTTP client could not be created
    #[error("Failed to create HTTP client: {0}")]
    Client(String),
}

impl From<reqwest::Error> for AdapterError {
    fn from(err: reqwest::Error) -> Self {
        Self::Client(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configuration_error_message() {
        let err = AdapterError::Configuration("timeout_ms must be greater than 0".to_string());
        assert_eq!(
            err.to_string(),
            "Configuration error: timeout_ms must be greater than 0"
        );
    }

    #[test]
    fn client_error_message() {
        let err = AdapterError::Client("tls backend missing".to_string());
        assert_eq!(
            err.to_string(),
            "Failed to create HTTP client: tls backend missing"
        );
    }
}
