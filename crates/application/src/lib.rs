//! Application layer - provider orchestration
//!
//! Defines the ports adapters implement (credential storage, provider
//! adapters) and the services that drive them: health tracking, the
//! fallback orchestrator and the [`ProviderService`] facade.
//!
//! # Architecture
//!
//! ```text
//! caller ──► ProviderService ──► FallbackOrchestrator ──► dyn ProviderAdapter
//!                 │                      │                       │
//!                 └──── HealthTracker ◄──┘        CredentialStorePort
//!                          │
//!                          └──► EventBus (broadcast of ProviderEvent)
//! ```

pub mod events;
pub mod ports;
pub mod request;
pub mod services;

pub use events::{EventBus, ProviderEvent};
pub use ports::*;
pub use request::{CallOptions, ServiceOutput, ServiceRequest, ServiceResponse};
pub use services::*;

#[cfg(test)]
pub(crate) mod test_support;
