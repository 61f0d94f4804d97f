//! Application services

mod fallback_orchestrator;
mod health_tracker;
mod provider_service;

pub use fallback_orchestrator::{FallbackOrchestrator, OrchestratorConfig};
pub use health_tracker::{HealthConfig, HealthTracker, ProviderHealth, TestGuard};
pub use provider_service::ProviderService;
