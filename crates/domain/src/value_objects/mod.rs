//! Value objects - immutable types identified by their values

pub mod audio;
pub mod provider;
pub mod refinement;

pub use audio::{AudioData, AudioFormat, Transcription};
pub use provider::{HealthStatus, ProviderKind, ServiceKind};
pub use refinement::RefinementMode;
