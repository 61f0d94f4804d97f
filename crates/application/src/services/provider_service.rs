//! Inbound facade over the provider layer
//!
//! UI and application code talk to [`ProviderService`] only. It owns the
//! health tracker, the orchestrator and the event bus; the credential store
//! is reached through the adapters.

use std::sync::Arc;
use std::time::Duration;

use domain::{HealthStatus, ProviderError, ProviderKind, ServicePreferences};
use secrecy::SecretString;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::events::{EventBus, ProviderEvent};
use crate::ports::ProviderAdapter;
use crate::request::{ServiceRequest, ServiceResponse};
use crate::services::fallback_orchestrator::{FallbackOrchestrator, OrchestratorConfig};
use crate::services::health_tracker::{HealthConfig, HealthTracker, ProviderHealth};

/// Entry point for transcription, refinement and speech requests
#[derive(Debug)]
pub struct ProviderService {
    orchestrator: FallbackOrchestrator,
    health: Arc<HealthTracker>,
    events: EventBus,
}

impl ProviderService {
    /// Wire the adapters with fresh health state and a new event bus
    pub fn new(
        adapters: Vec<Arc<dyn ProviderAdapter>>,
        health_config: HealthConfig,
        orchestrator_config: &OrchestratorConfig,
    ) -> Self {
        let events = EventBus::default();
        let health = Arc::new(HealthTracker::new(health_config, events.clone()));
        let orchestrator = FallbackOrchestrator::new(
            adapters,
            Arc::clone(&health),
            events.clone(),
            orchestrator_config.attempt_timeout(),
        );
        Self {
            orchestrator,
            health,
            events,
        }
    }

    fn adapter(&self, provider: ProviderKind) -> Result<&Arc<dyn ProviderAdapter>, ProviderError> {
        self.orchestrator.adapter(provider).ok_or_else(|| {
            ProviderError::ServiceUnavailable(format!("no adapter registered for {provider}"))
        })
    }

    /// Serve a request with the caller's preferences
    pub async fn perform(
        &self,
        request: &ServiceRequest,
        preferences: &ServicePreferences,
    ) -> Result<ServiceResponse, ProviderError> {
        self.orchestrator.perform(request, preferences).await
    }

    /// Serve a request that the caller may cancel
    pub async fn perform_with_cancellation(
        &self,
        request: &ServiceRequest,
        preferences: &ServicePreferences,
        cancel: &CancellationToken,
    ) -> Result<ServiceResponse, ProviderError> {
        self.orchestrator
            .perform_with_cancellation(request, preferences, cancel)
            .await
    }

    /// Install a provider's secret (all-or-nothing)
    ///
    /// The provider shows `Testing` while its probe runs. A missing secret is
    /// rejected before any call and leaves health untouched.
    #[instrument(skip(self, secret), fields(provider = %provider))]
    pub async fn configure_provider(
        &self,
        provider: ProviderKind,
        secret: Option<SecretString>,
    ) -> Result<(), ProviderError> {
        let adapter = self.adapter(provider)?;
        let guard = self.health.begin_test(provider);

        match adapter.configure(secret).await {
            Ok(()) => {
                guard.succeeded();
                info!("Provider configured");
                self.events.emit(ProviderEvent::Configured { provider });
                Ok(())
            },
            Err(error) => {
                if matches!(error, ProviderError::SecretMissing) {
                    drop(guard);
                } else {
                    guard.failed(&error);
                }
                warn!(error = %error, "Provider configuration rolled back");
                self.events.emit(ProviderEvent::ConfigurationFailed {
                    provider,
                    error: error.clone(),
                });
                Err(error)
            },
        }
    }

    /// Probe a provider and record the outcome
    ///
    /// Returns `Ok(false)` when the probe ran but the provider is unusable.
    #[instrument(skip(self), fields(provider = %provider))]
    pub async fn test_provider(&self, provider: ProviderKind) -> Result<bool, ProviderError> {
        let adapter = self.adapter(provider)?;
        let guard = self.health.begin_test(provider);

        match adapter.test_connection().await {
            Ok(true) => {
                guard.succeeded();
                debug!("Connection test passed");
                Ok(true)
            },
            Ok(false) => {
                guard.failed(&ProviderError::ServiceUnavailable(
                    "connection test reported provider unusable".to_string(),
                ));
                Ok(false)
            },
            Err(ProviderError::SecretMissing) => {
                drop(guard);
                Err(ProviderError::SecretMissing)
            },
            Err(error) => {
                guard.failed(&error);
                Err(error)
            },
        }
    }

    pub fn is_provider_configured(&self, provider: ProviderKind) -> bool {
        self.orchestrator
            .adapter(provider)
            .is_some_and(|a| a.is_configured())
    }

    pub fn current_health(&self, provider: ProviderKind) -> HealthStatus {
        self.health.status(provider)
    }

    pub fn health_snapshot(&self) -> Vec<ProviderHealth> {
        self.health.snapshot()
    }

    /// Subscribe to health and configuration changes
    pub fn subscribe(&self) -> broadcast::Receiver<ProviderEvent> {
        self.events.subscribe()
    }

    /// Delete a provider's secret and forget its health history
    #[instrument(skip(self), fields(provider = %provider))]
    pub async fn remove_provider(&self, provider: ProviderKind) -> Result<(), ProviderError> {
        self.adapter(provider)?.clear().await?;
        self.health.reset(provider);
        info!("Provider configuration cleared");
        self.events.emit(ProviderEvent::ConfigurationCleared { provider });
        Ok(())
    }

    /// Reload stored secrets into every adapter
    ///
    /// Returns the providers that are configured afterwards. A provider whose
    /// storage cannot be read is logged and skipped.
    pub async fn restore_credentials(&self) -> Vec<ProviderKind> {
        let mut configured = Vec::new();
        for adapter in self.orchestrator.adapters() {
            match adapter.restore().await {
                Ok(true) => configured.push(adapter.kind()),
                Ok(false) => debug!(provider = %adapter.kind(), "No stored credential"),
                Err(e) => warn!(provider = %adapter.kind(), error = %e, "Failed to restore credential"),
            }
        }
        info!(count = configured.len(), "Restored provider credentials");
        configured
    }

    /// Re-test configured providers whose cooldown has elapsed
    ///
    /// Returns the providers that are healthy again.
    pub async fn probe_unavailable(&self) -> Vec<ProviderKind> {
        let mut recovered = Vec::new();
        for provider in self.health.due_for_retry_all() {
            if !self.is_provider_configured(provider) {
                continue;
            }
            debug!(%provider, "Re-probing unavailable provider");
            if matches!(self.test_provider(provider).await, Ok(true)) {
                recovered.push(provider);
            }
        }
        recovered
    }

    /// Periodically re-probe unavailable providers until the handle is aborted
    pub fn spawn_recovery_task(self: &Arc<Self>, interval: Duration) -> JoinHandle<()> {
        let service = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately.
            ticker.tick().await;

            loop {
                ticker.tick().await;
                let recovered = service.probe_unavailable().await;
                if !recovered.is_empty() {
                    info!(?recovered, "Providers recovered");
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use domain::{RefinementMode, ServiceKind};

    use super::*;
    use crate::test_support::{Behavior, ScriptedAdapter, as_adapters};

    fn service_with(adapters: Vec<Arc<dyn ProviderAdapter>>, cooldown_secs: u64) -> ProviderService {
        ProviderService::new(
            adapters,
            HealthConfig {
                retry_cooldown_secs: cooldown_secs,
                ..HealthConfig::default()
            },
            &OrchestratorConfig::default(),
        )
    }

    fn refine() -> ServiceRequest {
        ServiceRequest::refinement("hello", RefinementMode::Clean)
    }

    #[tokio::test]
    async fn local_configures_without_secret() {
        let local = ScriptedAdapter::unconfigured(ProviderKind::Local, Behavior::Succeed);
        let service = service_with(as_adapters(&[&local]), 30);

        service.configure_provider(ProviderKind::Local, None).await.unwrap();

        assert!(service.is_provider_configured(ProviderKind::Local));
        assert_eq!(service.current_health(ProviderKind::Local), HealthStatus::Healthy);
    }

    #[tokio::test]
    async fn remote_without_secret_is_rejected_and_health_untouched() {
        let openai = ScriptedAdapter::unconfigured(ProviderKind::OpenAi, Behavior::Succeed);
        let service = service_with(as_adapters(&[&openai]), 30);
        let mut rx = service.subscribe();

        let err = service
            .configure_provider(ProviderKind::OpenAi, None)
            .await
            .unwrap_err();

        assert_eq!(err, ProviderError::SecretMissing);
        assert!(!service.is_provider_configured(ProviderKind::OpenAi));
        assert_eq!(service.current_health(ProviderKind::OpenAi), HealthStatus::Healthy);
        assert_eq!(openai.probes(), 0);

        let mut saw_failure = false;
        while let Ok(event) = rx.try_recv() {
            saw_failure |= matches!(event, ProviderEvent::ConfigurationFailed { .. });
        }
        assert!(saw_failure);
    }

    #[tokio::test]
    async fn failed_probe_marks_provider_unavailable() {
        let groq = ScriptedAdapter::unconfigured(ProviderKind::Groq, Behavior::Succeed);
        groq.set_probe(Err(ProviderError::SecretInvalid("401".to_string())));
        let service = service_with(as_adapters(&[&groq]), 30);

        let err = service
            .configure_provider(ProviderKind::Groq, Some(SecretString::from("bad")))
            .await
            .unwrap_err();

        assert!(matches!(err, ProviderError::SecretInvalid(_)));
        assert!(!service.is_provider_configured(ProviderKind::Groq));
        assert_eq!(service.current_health(ProviderKind::Groq), HealthStatus::Unavailable);
    }

    #[tokio::test]
    async fn configure_passes_through_testing() {
        let openai = ScriptedAdapter::unconfigured(ProviderKind::OpenAi, Behavior::Succeed);
        let service = service_with(as_adapters(&[&openai]), 30);
        let mut rx = service.subscribe();

        service
            .configure_provider(ProviderKind::OpenAi, Some(SecretString::from("sk-test")))
            .await
            .unwrap();

        let mut statuses = Vec::new();
        while let Ok(event) = rx.try_recv() {
            if let ProviderEvent::HealthChanged { current, .. } = event {
                statuses.push(current);
            }
        }
        assert_eq!(statuses, vec![HealthStatus::Testing, HealthStatus::Healthy]);
    }

    #[tokio::test]
    async fn test_provider_reports_unusable_probe() {
        let local = ScriptedAdapter::new(ProviderKind::Local, Behavior::Succeed);
        local.set_probe(Ok(false));
        let service = service_with(as_adapters(&[&local]), 30);

        assert!(!service.test_provider(ProviderKind::Local).await.unwrap());
        assert_eq!(service.current_health(ProviderKind::Local), HealthStatus::Degraded);
    }

    #[tokio::test]
    async fn unknown_adapter_is_service_unavailable() {
        let service = service_with(Vec::new(), 30);
        assert!(matches!(
            service.test_provider(ProviderKind::Anthropic).await,
            Err(ProviderError::ServiceUnavailable(_))
        ));
        assert!(!service.is_provider_configured(ProviderKind::Anthropic));
    }

    #[tokio::test]
    async fn remove_provider_clears_configuration_and_health() {
        let openai = ScriptedAdapter::new(
            ProviderKind::OpenAi,
            Behavior::Fail(ProviderError::QuotaExceeded),
        );
        let service = service_with(as_adapters(&[&openai]), 30);
        let prefs = ServicePreferences::default()
            .with_preferred(ServiceKind::Refinement, ProviderKind::OpenAi);
        let _ = service.perform(&refine(), &prefs).await;
        assert_eq!(service.current_health(ProviderKind::OpenAi), HealthStatus::Unavailable);

        service.remove_provider(ProviderKind::OpenAi).await.unwrap();

        assert!(!service.is_provider_configured(ProviderKind::OpenAi));
        assert_eq!(service.current_health(ProviderKind::OpenAi), HealthStatus::Healthy);
    }

    #[tokio::test]
    async fn missing_secret_during_a_call_marks_provider_unavailable() {
        let openai = ScriptedAdapter::new(
            ProviderKind::OpenAi,
            Behavior::Fail(ProviderError::SecretMissing),
        );
        let service = service_with(as_adapters(&[&openai]), 30);
        let prefs = ServicePreferences::default()
            .with_preferred(ServiceKind::Refinement, ProviderKind::OpenAi)
            .with_fallback(false);

        let err = service.perform(&refine(), &prefs).await.unwrap_err();

        assert_eq!(err, ProviderError::SecretMissing);
        assert_eq!(service.current_health(ProviderKind::OpenAi), HealthStatus::Unavailable);
    }

    #[tokio::test]
    async fn restore_lists_configured_providers() {
        let local = ScriptedAdapter::new(ProviderKind::Local, Behavior::Succeed);
        let groq = ScriptedAdapter::new(ProviderKind::Groq, Behavior::Succeed);
        let openai = ScriptedAdapter::unconfigured(ProviderKind::OpenAi, Behavior::Succeed);
        let service = service_with(as_adapters(&[&local, &groq, &openai]), 30);

        assert_eq!(
            service.restore_credentials().await,
            vec![ProviderKind::Local, ProviderKind::Groq]
        );
    }

    #[tokio::test]
    async fn probe_unavailable_recovers_after_cooldown() {
        let openai = ScriptedAdapter::new(
            ProviderKind::OpenAi,
            Behavior::Fail(ProviderError::SecretInvalid("401".to_string())),
        );
        let service = service_with(as_adapters(&[&openai]), 0);
        let prefs = ServicePreferences::default()
            .with_preferred(ServiceKind::Refinement, ProviderKind::OpenAi);
        let _ = service.perform(&refine(), &prefs).await;
        assert_eq!(service.current_health(ProviderKind::OpenAi), HealthStatus::Unavailable);

        assert_eq!(service.probe_unavailable().await, vec![ProviderKind::OpenAi]);
        assert_eq!(service.current_health(ProviderKind::OpenAi), HealthStatus::Healthy);
        assert_eq!(openai.probes(), 1);
    }

    #[tokio::test]
    async fn probe_unavailable_waits_for_cooldown() {
        let openai = ScriptedAdapter::new(
            ProviderKind::OpenAi,
            Behavior::Fail(ProviderError::QuotaExceeded),
        );
        let service = service_with(as_adapters(&[&openai]), 3600);
        let prefs = ServicePreferences::default()
            .with_preferred(ServiceKind::Refinement, ProviderKind::OpenAi);
        let _ = service.perform(&refine(), &prefs).await;

        assert!(service.probe_unavailable().await.is_empty());
        assert_eq!(openai.probes(), 0);
    }

    #[tokio::test]
    async fn recovery_task_reprobes_in_background() {
        let groq = ScriptedAdapter::new(
            ProviderKind::Groq,
            Behavior::Fail(ProviderError::QuotaExceeded),
        );
        let service = Arc::new(service_with(as_adapters(&[&groq]), 0));
        let prefs = ServicePreferences::default()
            .with_preferred(ServiceKind::Refinement, ProviderKind::Groq);
        let _ = service.perform(&refine(), &prefs).await;

        let handle = service.spawn_recovery_task(Duration::from_millis(10));
        for _ in 0..200 {
            if service.current_health(ProviderKind::Groq) == HealthStatus::Healthy {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        handle.abort();

        assert_eq!(service.current_health(ProviderKind::Groq), HealthStatus::Healthy);
        assert!(groq.probes() >= 1);
    }
}
