//! Domain layer for VoxBridge
//!
//! Contains the fixed provider and service vocabularies, the static capability
//! registry, user preferences, and the provider error taxonomy.
//! This layer performs no I/O and defines the ubiquitous language.

pub mod capabilities;
pub mod errors;
pub mod preferences;
pub mod value_objects;

pub use capabilities::{ModelVocabulary, ProviderCapabilities, capabilities, supports};
pub use errors::{FailureImpact, ProviderError, ProviderFailure};
pub use preferences::{ProviderSelection, ServicePreferences};
pub use value_objects::*;
