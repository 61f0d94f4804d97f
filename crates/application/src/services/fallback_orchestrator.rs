//! Fallback orchestrator
//!
//! Picks an ordered candidate list for a request and tries the candidates one
//! at a time until one succeeds. There is never more than one in-flight
//! provider call per request, so billable work is not duplicated.

use std::sync::Arc;
use std::time::Duration;

use domain::{ProviderError, ProviderFailure, ProviderKind, ServiceKind, ServicePreferences};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::events::{EventBus, ProviderEvent};
use crate::ports::ProviderAdapter;
use crate::request::{CallOptions, ServiceRequest, ServiceResponse};
use crate::services::health_tracker::HealthTracker;

const DEFAULT_ATTEMPT_TIMEOUT_SECS: u64 = 120;
const DEFAULT_RECOVERY_INTERVAL_SECS: u64 = 30;

/// Orchestrator timing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Upper bound for one provider attempt, on top of the adapter's own timeout
    #[serde(default = "default_attempt_timeout")]
    pub attempt_timeout_secs: u64,

    /// How often unavailable providers are re-probed in the background
    #[serde(default = "default_recovery_interval")]
    pub recovery_interval_secs: u64,
}

const fn default_attempt_timeout() -> u64 {
    DEFAULT_ATTEMPT_TIMEOUT_SECS
}

const fn default_recovery_interval() -> u64 {
    DEFAULT_RECOVERY_INTERVAL_SECS
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            attempt_timeout_secs: default_attempt_timeout(),
            recovery_interval_secs: default_recovery_interval(),
        }
    }
}

impl OrchestratorConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.attempt_timeout_secs == 0 {
            return Err("orchestrator.attempt_timeout_secs must be greater than 0".to_string());
        }
        if self.recovery_interval_secs == 0 {
            return Err("orchestrator.recovery_interval_secs must be greater than 0".to_string());
        }
        Ok(())
    }

    #[must_use]
    pub const fn attempt_timeout(&self) -> Duration {
        Duration::from_secs(self.attempt_timeout_secs)
    }

    #[must_use]
    pub const fn recovery_interval(&self) -> Duration {
        Duration::from_secs(self.recovery_interval_secs)
    }
}

/// Drives the attempt/fallback sequence for one request at a time
#[derive(Debug)]
pub struct FallbackOrchestrator {
    /// One adapter per provider, in registry order
    adapters: Vec<Arc<dyn ProviderAdapter>>,
    health: Arc<HealthTracker>,
    events: EventBus,
    attempt_timeout: Duration,
}

impl FallbackOrchestrator {
    /// Create an orchestrator; later adapters for an already-seen kind are ignored
    pub fn new(
        adapters: Vec<Arc<dyn ProviderAdapter>>,
        health: Arc<HealthTracker>,
        events: EventBus,
        attempt_timeout: Duration,
    ) -> Self {
        let mut unique: Vec<Arc<dyn ProviderAdapter>> = Vec::with_capacity(adapters.len());
        for adapter in adapters {
            if unique.iter().any(|a| a.kind() == adapter.kind()) {
                warn!(provider = %adapter.kind(), "Duplicate adapter ignored");
                continue;
            }
            unique.push(adapter);
        }
        unique.sort_by_key(|a| a.kind().registry_index());

        Self {
            adapters: unique,
            health,
            events,
            attempt_timeout,
        }
    }

    /// Adapter registered for a provider
    pub fn adapter(&self, provider: ProviderKind) -> Option<&Arc<dyn ProviderAdapter>> {
        self.adapters.iter().find(|a| a.kind() == provider)
    }

    /// All registered adapters in registry order
    pub fn adapters(&self) -> &[Arc<dyn ProviderAdapter>] {
        &self.adapters
    }

    /// Ordered, configured candidates for a service
    ///
    /// Preferred provider first. With fallback enabled, the other remote
    /// providers follow by health rank (registry order breaks ties) and the
    /// local provider closes the list.
    pub fn candidates(
        &self,
        service: ServiceKind,
        preferences: &ServicePreferences,
    ) -> Vec<Arc<dyn ProviderAdapter>> {
        let preferred = preferences.preferred(service);
        let mut ordered: Vec<&Arc<dyn ProviderAdapter>> = Vec::new();

        if let Some(adapter) = self.adapter(preferred) {
            if adapter.capabilities().supports(service) {
                ordered.push(adapter);
            }
        }

        if preferences.use_fallback_hierarchy {
            let mut remotes: Vec<&Arc<dyn ProviderAdapter>> = self
                .adapters
                .iter()
                .filter(|a| {
                    let kind = a.kind();
                    kind != preferred && !kind.is_local() && a.capabilities().supports(service)
                })
                .collect();
            // Stable sort keeps registry order within a rank.
            remotes.sort_by_key(|a| self.health.status(a.kind()).rank());
            ordered.extend(remotes);

            if let Some(local) = self.adapters.iter().find(|a| a.kind().is_local()) {
                if local.kind() != preferred && local.capabilities().supports(service) {
                    ordered.push(local);
                }
            }
        }

        ordered
            .into_iter()
            .filter(|a| a.is_configured())
            .cloned()
            .collect()
    }

    /// Serve a request
    pub async fn perform(
        &self,
        request: &ServiceRequest,
        preferences: &ServicePreferences,
    ) -> Result<ServiceResponse, ProviderError> {
        self.perform_with_cancellation(request, preferences, &CancellationToken::new())
            .await
    }

    /// Serve a request until it completes or `cancel` fires
    ///
    /// On cancellation the in-flight provider call is dropped, nothing is
    /// recorded against its health, and no further candidate is tried.
    #[instrument(skip(self, request, preferences, cancel), fields(service = %request.service()))]
    pub async fn perform_with_cancellation(
        &self,
        request: &ServiceRequest,
        preferences: &ServicePreferences,
        cancel: &CancellationToken,
    ) -> Result<ServiceResponse, ProviderError> {
        let service = request.service();
        let candidates = self.candidates(service, preferences);

        if candidates.is_empty() {
            warn!(%service, "No configured provider supports this service");
            return Err(ProviderError::NoProviderAvailable(service));
        }

        debug!(
            candidates = ?candidates.iter().map(|a| a.kind()).collect::<Vec<_>>(),
            "Candidate order"
        );

        let mut failures = Vec::new();

        for adapter in candidates {
            let provider = adapter.kind();
            let options = CallOptions::for_service(&preferences.selection(provider), service);
            let attempt = tokio::time::timeout(self.attempt_timeout, adapter.perform(request, &options));

            let outcome = tokio::select! {
                biased;
                () = cancel.cancelled() => {
                    info!(%provider, "Request cancelled");
                    return Err(ProviderError::Cancelled);
                }
                result = attempt => result.unwrap_or_else(|_| {
                    Err(ProviderError::NetworkError(format!(
                        "timed out after {:?}",
                        self.attempt_timeout
                    )))
                }),
            };

            match outcome {
                Ok(output) => {
                    self.health.record_success(provider);
                    if !failures.is_empty() {
                        info!(%provider, failed = failures.len(), "Served by fallback provider");
                    }
                    return Ok(ServiceResponse {
                        provider,
                        output,
                        failures,
                    });
                },
                Err(ProviderError::Cancelled) => return Err(ProviderError::Cancelled),
                Err(error) => {
                    warn!(%provider, error = %error, "Provider attempt failed");
                    self.health.record_failure(provider, &error);
                    self.events.emit(ProviderEvent::AttemptFailed {
                        provider,
                        service,
                        error: error.clone(),
                    });

                    if !preferences.use_fallback_hierarchy {
                        return Err(error);
                    }
                    failures.push(ProviderFailure::new(provider, error));
                },
            }
        }

        Err(ProviderError::Aggregated(failures))
    }
}
