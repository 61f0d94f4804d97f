//! Per-provider health state machine
//!
//! Each provider has its own entry behind its own mutex, so concurrent
//! outcomes for one provider are applied one at a time and never block
//! other providers.
//!
//! Transitions:
//! - success (call or probe) → `Healthy`
//! - recoverable failure → `Degraded`, or `Unavailable` once
//!   `failure_threshold` consecutive failures accumulate
//! - authentication or quota failure → `Unavailable`
//! - rejected input → attempt recorded, status unchanged
//! - `Testing` while a connection probe is in flight
//!
//! `Unavailable` is never final: [`HealthTracker::due_for_retry`] reports
//! providers whose cooldown has elapsed so they can be probed again.

use std::time::{Duration, Instant};

use domain::{FailureImpact, HealthStatus, ProviderError, ProviderKind};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::events::{EventBus, ProviderEvent};

const DEFAULT_FAILURE_THRESHOLD: u32 = 3;
const DEFAULT_RETRY_COOLDOWN_SECS: u64 = 30;

/// Thresholds for health transitions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthConfig {
    /// Consecutive recoverable failures before a provider is unavailable
    #[serde(default = "default_failure_threshold")]
    pub failure_threshold: u32,

    /// Seconds before an unavailable provider is probed again
    #[serde(default = "default_retry_cooldown")]
    pub retry_cooldown_secs: u64,
}

const fn default_failure_threshold() -> u32 {
    DEFAULT_FAILURE_THRESHOLD
}

const fn default_retry_cooldown() -> u64 {
    DEFAULT_RETRY_COOLDOWN_SECS
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            failure_threshold: default_failure_threshold(),
            retry_cooldown_secs: default_retry_cooldown(),
        }
    }
}

impl HealthConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.failure_threshold == 0 {
            return Err("health.failure_threshold must be at least 1".to_string());
        }
        Ok(())
    }

    #[must_use]
    pub const fn retry_cooldown(&self) -> Duration {
        Duration::from_secs(self.retry_cooldown_secs)
    }
}

/// Read-only view of one provider's health
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderHealth {
    pub provider: ProviderKind,
    pub status: HealthStatus,
    pub consecutive_failures: u32,
    pub last_error: Option<String>,
    /// Time since the last counted failure
    pub since_last_failure: Option<Duration>,
}

#[derive(Debug, Default)]
struct HealthEntry {
    status: HealthStatus,
    consecutive_failures: u32,
    last_error: Option<String>,
    last_failure: Option<Instant>,
}

/// Process-wide health state for every provider
#[derive(Debug)]
pub struct HealthTracker {
    config: HealthConfig,
    entries: [Mutex<HealthEntry>; ProviderKind::ALL.len()],
    events: EventBus,
}

impl HealthTracker {
    /// Create a tracker with every provider `Healthy`
    #[must_use]
    pub fn new(config: HealthConfig, events: EventBus) -> Self {
        Self {
            config,
            entries: std::array::from_fn(|_| Mutex::new(HealthEntry::default())),
            events,
        }
    }

    fn entry(&self, provider: ProviderKind) -> &Mutex<HealthEntry> {
        &self.entries[provider.registry_index()]
    }

    /// Current status of a provider
    pub fn status(&self, provider: ProviderKind) -> HealthStatus {
        self.entry(provider).lock().status
    }

    /// Full view of a provider's entry
    pub fn health(&self, provider: ProviderKind) -> ProviderHealth {
        let entry = self.entry(provider).lock();
        ProviderHealth {
            provider,
            status: entry.status,
            consecutive_failures: entry.consecutive_failures,
            last_error: entry.last_error.clone(),
            since_last_failure: entry.last_failure.map(|at| at.elapsed()),
        }
    }

    /// Health of all providers in registry order
    pub fn snapshot(&self) -> Vec<ProviderHealth> {
        ProviderKind::ALL.iter().map(|kind| self.health(*kind)).collect()
    }

    /// Record a successful call or probe
    pub fn record_success(&self, provider: ProviderKind) {
        let mut entry = self.entry(provider).lock();
        entry.consecutive_failures = 0;
        entry.last_error = None;
        self.transition(provider, &mut entry, HealthStatus::Healthy);
    }

    /// Record a failed call or probe and return the resulting status
    pub fn record_failure(&self, provider: ProviderKind, error: &ProviderError) -> HealthStatus {
        let mut entry = self.entry(provider).lock();
        let baseline = entry.status;
        self.apply_failure(provider, &mut entry, baseline, error);
        entry.status
    }

    /// `baseline` is the status the failure is judged against; it differs
    /// from `entry.status` while a probe holds the entry in `Testing`.
    fn apply_failure(
        &self,
        provider: ProviderKind,
        entry: &mut HealthEntry,
        baseline: HealthStatus,
        error: &ProviderError,
    ) {
        let next = match error.impact() {
            FailureImpact::Cancelled => return,
            FailureImpact::Rejected => {
                debug!(%provider, error = %error, "Input rejected; health unchanged");
                entry.last_error = Some(error.to_string());
                return;
            },
            FailureImpact::Authentication => {
                entry.consecutive_failures = entry.consecutive_failures.saturating_add(1);
                HealthStatus::Unavailable
            },
            FailureImpact::Recoverable => {
                entry.consecutive_failures = entry.consecutive_failures.saturating_add(1);
                if baseline == HealthStatus::Unavailable
                    || entry.consecutive_failures >= self.config.failure_threshold
                {
                    HealthStatus::Unavailable
                } else {
                    HealthStatus::Degraded
                }
            },
        };

        entry.last_error = Some(error.to_string());
        entry.last_failure = Some(Instant::now());
        self.transition(provider, entry, next);
    }

    fn transition(&self, provider: ProviderKind, entry: &mut HealthEntry, next: HealthStatus) {
        let previous = entry.status;
        if previous == next {
            return;
        }
        entry.status = next;

        match next {
            HealthStatus::Unavailable => warn!(
                %provider,
                failures = entry.consecutive_failures,
                last_error = entry.last_error.as_deref().unwrap_or_default(),
                "Provider unavailable"
            ),
            HealthStatus::Healthy if previous != HealthStatus::Testing => {
                info!(%provider, %previous, "Provider recovered");
            },
            _ => debug!(%provider, %previous, current = %next, "Health changed"),
        }

        self.events.emit(ProviderEvent::HealthChanged {
            provider,
            previous,
            current: next,
        });
    }

    /// Mark a provider as `Testing` for the duration of a probe
    ///
    /// Resolve the guard with [`TestGuard::succeeded`] or
    /// [`TestGuard::failed`]. Dropping it unresolved restores the previous
    /// status, which covers cancelled probes.
    pub fn begin_test(&self, provider: ProviderKind) -> TestGuard<'_> {
        let mut entry = self.entry(provider).lock();
        let previous = entry.status;
        self.transition(provider, &mut entry, HealthStatus::Testing);
        TestGuard {
            tracker: self,
            provider,
            previous,
            resolved: false,
        }
    }

    /// Whether an unavailable provider's cooldown has elapsed
    pub fn due_for_retry(&self, provider: ProviderKind) -> bool {
        let entry = self.entry(provider).lock();
        entry.status == HealthStatus::Unavailable
            && entry
                .last_failure
                .is_none_or(|at| at.elapsed() >= self.config.retry_cooldown())
    }

    /// All providers whose cooldown has elapsed
    pub fn due_for_retry_all(&self) -> Vec<ProviderKind> {
        ProviderKind::ALL
            .into_iter()
            .filter(|kind| self.due_for_retry(*kind))
            .collect()
    }

    /// Forget history, e.g. after the provider's secret was removed
    pub fn reset(&self, provider: ProviderKind) {
        let mut entry = self.entry(provider).lock();
        entry.consecutive_failures = 0;
        entry.last_error = None;
        entry.last_failure = None;
        self.transition(provider, &mut entry, HealthStatus::Healthy);
    }
}

/// In-flight connection test; see [`HealthTracker::begin_test`]
#[derive(Debug)]
#[must_use = "dropping the guard immediately ends the Testing state"]
pub struct TestGuard<'a> {
    tracker: &'a HealthTracker,
    provider: ProviderKind,
    previous: HealthStatus,
    resolved: bool,
}

impl TestGuard<'_> {
    /// Status before the test started
    pub const fn previous(&self) -> HealthStatus {
        self.previous
    }

    /// The probe succeeded
    pub fn succeeded(mut self) {
        self.resolved = true;
        self.tracker.record_success(self.provider);
    }

    /// The probe failed; the failure is applied on top of the prior status
    pub fn failed(mut self, error: &ProviderError) -> HealthStatus {
        self.resolved = true;
        let mut entry = self.tracker.entry(self.provider).lock();
        self.tracker
            .apply_failure(self.provider, &mut entry, self.previous, error);
        if entry.status == HealthStatus::Testing {
            // Rejected or cancelled outcomes leave the status alone.
            self.tracker
                .transition(self.provider, &mut entry, self.previous);
        }
        entry.status
    }
}

impl Drop for TestGuard<'_> {
    fn drop(&mut self) {
        if self.resolved {
            return;
        }
        let mut entry = self.tracker.entry(self.provider).lock();
        if entry.status == HealthStatus::Testing {
            self.tracker
                .transition(self.provider, &mut entry, self.previous);
        }
    }
}
