//! Change events published for UI layers
//!
//! The core never calls into a UI. It publishes discrete events on a
//! broadcast channel and any number of subscribers can observe them.

use domain::{HealthStatus, ProviderError, ProviderKind, ServiceKind};
use tokio::sync::broadcast;

/// Default number of buffered events per subscriber
const DEFAULT_EVENT_CAPACITY: usize = 64;

/// Something observable changed in the provider layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderEvent {
    /// A provider's health status transitioned
    HealthChanged {
        provider: ProviderKind,
        previous: HealthStatus,
        current: HealthStatus,
    },
    /// A provider accepted its configuration
    Configured { provider: ProviderKind },
    /// Configuration was rejected and rolled back
    ConfigurationFailed {
        provider: ProviderKind,
        error: ProviderError,
    },
    /// The stored secret was removed
    ConfigurationCleared { provider: ProviderKind },
    /// One attempt inside a `perform` call failed
    AttemptFailed {
        provider: ProviderKind,
        service: ServiceKind,
        error: ProviderError,
    },
}

impl ProviderEvent {
    /// Provider the event concerns
    #[must_use]
    pub const fn provider(&self) -> ProviderKind {
        match self {
            Self::HealthChanged { provider, .. }
            | Self::Configured { provider }
            | Self::ConfigurationFailed { provider, .. }
            | Self::ConfigurationCleared { provider }
            | Self::AttemptFailed { provider, .. } => *provider,
        }
    }
}

/// Cloneable publisher handle
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<ProviderEvent>,
}

impl EventBus {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Receive all events published from now on
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<ProviderEvent> {
        self.sender.subscribe()
    }

    /// Publish an event
    pub fn emit(&self, event: ProviderEvent) {
        // No subscribers is the normal headless case.
        let _ = self.sender.send(event);
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_CAPACITY)
    }
}
