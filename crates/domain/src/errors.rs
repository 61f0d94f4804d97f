//! Provider error taxonomy

use std::fmt;

use thiserror::Error;

use crate::value_objects::{ProviderKind, ServiceKind};

/// Failure of a provider call, configuration or orchestration
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    /// A remote provider was used without a configured secret
    #[error("API secret missing")]
    SecretMissing,

    /// The secret was rejected by the provider or by local storage
    #[error("API secret invalid: {0}")]
    SecretInvalid(String),

    /// Provider is down or returned a server error
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("Model not supported: {0}")]
    ModelNotSupported(String),

    /// Transport failure (connect, timeout, TLS)
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Malformed or unexpected payload
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Audio format not supported: {0}")]
    AudioFormatNotSupported(String),

    #[error("Audio too long: {duration_ms}ms exceeds maximum {max_ms}ms")]
    AudioTooLong { duration_ms: u64, max_ms: u64 },

    #[error("Text too long: {length} characters exceeds maximum {max}")]
    TextTooLong { length: usize, max: usize },

    #[error("Quota exceeded")]
    QuotaExceeded,

    /// Provider was asked for a service it does not offer
    #[error("{provider} does not support {service}")]
    UnsupportedService {
        provider: ProviderKind,
        service: ServiceKind,
    },

    /// No configured provider supports the requested service
    #[error("No provider available for {0}")]
    NoProviderAvailable(ServiceKind),

    /// The caller cancelled the request
    #[error("Request cancelled")]
    Cancelled,

    /// Every candidate failed; failures are in attempt order
    #[error("All providers failed: {}", FailureList(.0))]
    Aggregated(Vec<ProviderFailure>),
}

/// How a failure should affect a provider's health entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureImpact {
    /// Credential problem; the provider cannot succeed until reconfigured
    Authentication,
    /// Transient; counts toward the consecutive-failure threshold
    Recoverable,
    /// The input was refused; says nothing about liveness
    Rejected,
    /// Not a provider outcome at all
    Cancelled,
}

impl ProviderError {
    /// Classify this error for health tracking
    #[must_use]
    pub const fn impact(&self) -> FailureImpact {
        match self {
            Self::SecretMissing | Self::SecretInvalid(_) | Self::QuotaExceeded => {
                FailureImpact::Authentication
            },
            Self::TextTooLong { .. }
            | Self::AudioFormatNotSupported(_)
            | Self::AudioTooLong { .. }
            | Self::ModelNotSupported(_)
            | Self::UnsupportedService { .. } => FailureImpact::Rejected,
            Self::Cancelled => FailureImpact::Cancelled,
            Self::ServiceUnavailable(_)
            | Self::RateLimitExceeded
            | Self::NetworkError(_)
            | Self::InvalidResponse(_)
            | Self::NoProviderAvailable(_)
            | Self::Aggregated(_) => FailureImpact::Recoverable,
        }
    }

    /// Whether trying again later might succeed without user action
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(self.impact(), FailureImpact::Recoverable)
    }

    /// Providers tried before this error was produced, in order
    #[must_use]
    pub fn failures(&self) -> &[ProviderFailure] {
        match self {
            Self::Aggregated(failures) => failures,
            _ => &[],
        }
    }
}

/// One provider's failure inside an aggregated error
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderFailure {
    pub provider: ProviderKind,
    pub error: ProviderError,
}

impl ProviderFailure {
    #[must_use]
    pub const fn new(provider: ProviderKind, error: ProviderError) -> Self {
        Self { provider, error }
    }
}

impl fmt::Display for ProviderFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.provider, self.error)
    }
}

struct FailureList<'a>(&'a [ProviderFailure]);

impl fmt::Display for FailureList<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, failure) in self.0.iter().enumerate() {
            if idx > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{failure}")?;
        }
        Ok(())
    }
}
