//! Provider adapters for VoxBridge
//!
//! One [`application::ProviderAdapter`] implementation per provider kind:
//!
//! | Adapter | Transcription | Refinement | Speech |
//! |---------|---------------|------------|--------|
//! | [`LocalProvider`] | whisper.cpp | Ollama | piper |
//! | [`OpenAiProvider`] | `/audio/transcriptions` | `/chat/completions` | `/audio/speech` |
//! | [`GroqProvider`] | `/audio/transcriptions` | `/chat/completions` | - |
//! | [`AnthropicProvider`] | - | `/messages` | - |
//! | [`ElevenLabsProvider`] | - | - | `/text-to-speech/{voice}` |
//!
//! Remote adapters hold their secret in a [`CredentialSlot`] backed by the
//! injected credential store, and share the HTTP plumbing in [`http`].

pub mod config;
pub mod credentials;
pub mod error;
pub mod http;
pub mod prompts;
pub mod providers;

pub use config::{
    LocalConfig, OllamaConfig, PiperConfig, ProvidersConfig, RemoteConfig, WhisperConfig,
};
pub use credentials::CredentialSlot;
pub use error::AdapterError;
pub use providers::{
    AnthropicProvider, ElevenLabsProvider, GroqProvider, LocalProvider, OpenAiProvider,
    build_adapters,
};
