//! Human-readable rendering of service results and events

use application::{ProviderEvent, ProviderHealth};
use domain::{HealthStatus, ProviderFailure};

const fn status_icon(status: HealthStatus) -> &'static str {
    match status {
        HealthStatus::Healthy => "✅",
        HealthStatus::Degraded => "⚠️ ",
        HealthStatus::Unavailable => "❌",
        HealthStatus::Testing => "🔄",
    }
}

/// One row of the `health` table
pub fn health_row(health: &ProviderHealth, configured: bool) -> String {
    let mut row = format!(
        "{} {:<11} {:<11} {:<13} failures={}",
        status_icon(health.status),
        health.provider.as_str(),
        health.status.to_string(),
        if configured { "configured" } else { "unconfigured" },
        health.consecutive_failures
    );
    if let Some(error) = &health.last_error {
        row.push_str(&format!("  last error: {error}"));
    }
    row
}

/// Failed attempts that preceded a successful fallback
pub fn fallback_note(failures: &[ProviderFailure]) -> String {
    let tried: Vec<String> = failures
        .iter()
        .map(|failure| format!("{} ({})", failure.provider, failure.error))
        .collect();
    format!("fell back after: {}", tried.join(", "))
}

pub fn describe_event(event: &ProviderEvent) -> String {
    match event {
        ProviderEvent::HealthChanged {
            provider,
            previous,
            current,
        } => format!("{} {provider}: {previous} -> {current}", status_icon(*current)),
        ProviderEvent::Configured { provider } => format!("🔐 {provider}: configured"),
        ProviderEvent::ConfigurationFailed { provider, error } => {
            format!("❌ {provider}: configuration rolled back ({error})")
        },
        ProviderEvent::ConfigurationCleared { provider } => format!("🧹 {provider}: secret removed"),
        ProviderEvent::AttemptFailed {
            provider,
            service,
            error,
        } => format!("⚠️  {provider}: {} attempt failed ({error})", service.as_str()),
    }
}
