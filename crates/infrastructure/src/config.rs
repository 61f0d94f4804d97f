//! Application configuration
//!
//! Layered with the `config` crate: serde defaults, then an optional TOML
//! file, then `VOXBRIDGE_*` environment variables. Nested keys use `__` in
//! environment variables, e.g. `VOXBRIDGE_PROVIDERS__OPENAI__TIMEOUT_MS`.

use std::fmt;
use std::path::Path;

use ai_providers::{AdapterError, ProvidersConfig};
use application::{HealthConfig, OrchestratorConfig};
use domain::ServicePreferences;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// File looked up in the working directory when no path is given
pub const DEFAULT_CONFIG_NAME: &str = "voxbridge";

/// Prefix of environment overrides
pub const ENV_PREFIX: &str = "VOXBRIDGE";

/// Keychain service namespace used when none is configured
pub const DEFAULT_KEYRING_SERVICE: &str = "voxbridge";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Failed to build provider adapters: {0}")]
    Adapters(#[from] AdapterError),
}

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Health transition thresholds
    #[serde(default)]
    pub health: HealthConfig,

    /// Attempt timeout and background recovery cadence
    #[serde(default)]
    pub orchestrator: OrchestratorConfig,

    /// Where provider secrets are kept
    #[serde(default)]
    pub credentials: CredentialsConfig,

    /// Endpoints, timeouts and default models per provider
    #[serde(default)]
    pub providers: ProvidersConfig,

    /// Default provider choice per service
    #[serde(default)]
    pub preferences: ServicePreferences,
}

/// Log output settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `EnvFilter` directives used when `RUST_LOG` is not set
    #[serde(default = "default_log_filter")]
    pub filter: String,

    /// Emit JSON lines instead of human-readable text
    #[serde(default)]
    pub json: bool,
}

fn default_log_filter() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
            json: false,
        }
    }
}

/// Secure storage backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CredentialBackend {
    /// Host keychain (macOS Keychain, Windows Credential Manager, Linux keyutils)
    #[default]
    Keyring,
    /// Process memory only; secrets are lost on exit
    Memory,
}

impl fmt::Display for CredentialBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Keyring => write!(f, "keyring"),
            Self::Memory => write!(f, "memory"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialsConfig {
    #[serde(default)]
    pub backend: CredentialBackend,

    /// Service name under which keychain entries are filed
    #[serde(default = "default_keyring_service")]
    pub service: String,
}

fn default_keyring_service() -> String {
    DEFAULT_KEYRING_SERVICE.to_string()
}

impl Default for CredentialsConfig {
    fn default() -> Self {
        Self {
            backend: CredentialBackend::default(),
            service: default_keyring_service(),
        }
    }
}

impl LoggingConfig {
    /// # Errors
    ///
    /// Returns a message when the filter is empty or not valid `EnvFilter` syntax.
    pub fn validate(&self) -> Result<(), String> {
        if self.filter.trim().is_empty() {
            return Err("logging.filter must not be empty".to_string());
        }
        tracing_subscriber::EnvFilter::try_new(&self.filter)
            .map(|_| ())
            .map_err(|e| format!("logging.filter is invalid: {e}"))
    }
}

impl CredentialsConfig {
    /// # Errors
    ///
    /// Returns a message when the keychain service name is blank.
    pub fn validate(&self) -> Result<(), String> {
        if self.service.trim().is_empty() {
            return Err("credentials.service must not be empty".to_string());
        }
        Ok(())
    }
}

impl AppConfig {
    /// Load configuration from an optional file and the environment
    ///
    /// With `path`, that file must exist. Without it, `voxbridge.toml` in the
    /// working directory is used when present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Load` when a source cannot be read or
    /// deserialized, `ConfigError::Invalid` when a value is out of range.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_with_env(path, environment())
    }

    fn load_with_env(
        path: Option<&Path>,
        environment: config::Environment,
    ) -> Result<Self, ConfigError> {
        let file = match path {
            Some(path) => config::File::from(path).required(true),
            None => config::File::with_name(DEFAULT_CONFIG_NAME).required(false),
        };

        let config: Self = config::Config::builder()
            .add_source(file)
            .add_source(environment)
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    /// Check every section
    ///
    /// # Errors
    ///
    /// Returns the first section error as `ConfigError::Invalid`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.logging.validate().map_err(ConfigError::Invalid)?;
        self.health.validate().map_err(ConfigError::Invalid)?;
        self.orchestrator.validate().map_err(ConfigError::Invalid)?;
        self.credentials.validate().map_err(ConfigError::Invalid)?;
        self.providers.validate().map_err(ConfigError::Invalid)?;
        self.preferences
            .validate()
            .map_err(|e| ConfigError::Invalid(format!("preferences: {e}")))?;
        Ok(())
    }
}

fn environment() -> config::Environment {
    config::Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}
