//! Property-based tests for domain value objects
//!
//! These tests use proptest to verify invariants across many random inputs.

use domain::{
    AudioData, AudioFormat, HealthStatus, ProviderError, ProviderKind, RefinementMode,
    ServiceKind, ServicePreferences, capabilities,
};
use proptest::prelude::*;

fn provider() -> impl Strategy<Value = ProviderKind> {
    prop::sample::select(ProviderKind::ALL.to_vec())
}

fn service() -> impl Strategy<Value = ServiceKind> {
    prop::sample::select(ServiceKind::ALL.to_vec())
}

fn health() -> impl Strategy<Value = HealthStatus> {
    prop::sample::select(vec![
        HealthStatus::Healthy,
        HealthStatus::Degraded,
        HealthStatus::Unavailable,
        HealthStatus::Testing,
    ])
}

// ============================================================================
// ProviderKind / ServiceKind Property Tests
// ============================================================================

mod kind_tests {
    use super::*;

    proptest! {
        #[test]
        fn provider_display_parses_back(kind in provider()) {
            let parsed: ProviderKind = kind.to_string().parse().unwrap();
            prop_assert_eq!(parsed, kind);
        }

        #[test]
        fn provider_parse_ignores_case(kind in provider(), upper in any::<bool>()) {
            let text = if upper { kind.as_str().to_uppercase() } else { kind.as_str().to_string() };
            prop_assert_eq!(text.parse::<ProviderKind>().unwrap(), kind);
        }

        #[test]
        fn credential_key_is_unique_per_provider(a in provider(), b in provider()) {
            prop_assert_eq!(a == b, a.credential_key() == b.credential_key());
        }

        #[test]
        fn service_display_parses_back(kind in service()) {
            let parsed: ServiceKind = kind.as_str().parse().unwrap();
            prop_assert_eq!(parsed, kind);
        }
    }
}

// ============================================================================
// HealthStatus Property Tests
// ============================================================================

mod health_tests {
    use super::*;

    proptest! {
        #[test]
        fn healthy_ranks_before_everything_else(status in health()) {
            prop_assert!(HealthStatus::Healthy.rank() <= status.rank());
        }

        #[test]
        fn serialization_roundtrip(status in health()) {
            let json = serde_json::to_string(&status).unwrap();
            let parsed: HealthStatus = serde_json::from_str(&json).unwrap();
            prop_assert_eq!(parsed, status);
        }
    }
}

// ============================================================================
// Capability Registry Property Tests
// ============================================================================

mod capability_tests {
    use super::*;

    proptest! {
        #[test]
        fn text_within_limit_is_accepted(kind in provider(), len in 0usize..4_096) {
            let caps = capabilities(kind);
            let text = "a".repeat(len);
            prop_assert!(caps.check_text(&text).is_ok());
        }

        #[test]
        fn text_over_limit_reports_both_lengths(kind in provider(), extra in 1usize..64) {
            let caps = capabilities(kind);
            if let Some(max) = caps.max_text_length {
                let text = "é".repeat(max + extra);
                prop_assert_eq!(
                    caps.check_text(&text),
                    Err(ProviderError::TextTooLong { length: max + extra, max })
                );
            }
        }

        #[test]
        fn vocabulary_models_pass_their_own_check(kind in provider(), service in service()) {
            let caps = capabilities(kind);
            for model in caps.vocabulary.models_for(service) {
                prop_assert!(caps.check_model(service, model).is_ok());
            }
        }

        #[test]
        fn unknown_models_are_rejected(kind in provider(), service in service(), suffix in "[a-z]{4,12}") {
            let model = format!("not-a-model-{suffix}");
            prop_assert!(matches!(
                capabilities(kind).check_model(service, &model),
                Err(ProviderError::ModelNotSupported(_))
            ));
        }

        #[test]
        fn listed_formats_are_accepted(kind in provider(), bytes in prop::collection::vec(any::<u8>(), 1..64)) {
            let caps = capabilities(kind);
            for format in caps.supported_audio_formats {
                let audio = AudioData::new(bytes.clone(), *format);
                prop_assert!(caps.check_audio(&audio).is_ok());
            }
        }

        #[test]
        fn audio_over_duration_limit_is_rejected(kind in provider(), extra_ms in 1u64..60_000) {
            let caps = capabilities(kind);
            let (Some(max), Some(format)) = (caps.max_audio_duration, caps.supported_audio_formats.first()) else {
                return Ok(());
            };
            let max_ms = u64::try_from(max.as_millis()).unwrap();
            let audio = AudioData::new(vec![0; 8], *format).with_duration(max_ms + extra_ms);
            let rejected = matches!(caps.check_audio(&audio), Err(ProviderError::AudioTooLong { .. }));
            prop_assert!(rejected);
        }

        #[test]
        fn absent_language_is_always_accepted(kind in provider()) {
            prop_assert!(capabilities(kind).accepts_language(None));
        }
    }
}

// ============================================================================
// RefinementMode Property Tests
// ============================================================================

mod refinement_tests {
    use super::*;

    proptest! {
        #[test]
        fn translate_mode_roundtrips(lang in "[a-z]{2,3}") {
            let mode: RefinementMode = format!("translate:{lang}").parse().unwrap();
            prop_assert_eq!(mode.to_string(), format!("translate:{lang}"));
        }

        #[test]
        fn serialization_roundtrip(lang in "[a-z]{2}", pick in 0usize..6) {
            let mode = match pick {
                0 => RefinementMode::Clean,
                1 => RefinementMode::Formal,
                2 => RefinementMode::Casual,
                3 => RefinementMode::Summarize,
                4 => RefinementMode::Bullets,
                _ => RefinementMode::Translate(lang),
            };
            let json = serde_json::to_string(&mode).unwrap();
            let parsed: RefinementMode = serde_json::from_str(&json).unwrap();
            prop_assert_eq!(parsed, mode);
        }
    }
}

// ============================================================================
// ServicePreferences Property Tests
// ============================================================================

mod preference_tests {
    use super::*;

    proptest! {
        #[test]
        fn preferring_a_supporting_provider_validates(kind in provider(), service in service()) {
            let preferences = ServicePreferences::default().with_preferred(service, kind);
            let supported = capabilities(kind).supports(service);
            prop_assert_eq!(preferences.validate().is_ok(), supported);
        }

        #[test]
        fn fallback_flag_is_preserved(enabled in any::<bool>()) {
            let preferences = ServicePreferences::default().with_fallback(enabled);
            prop_assert_eq!(preferences.use_fallback_hierarchy, enabled);
        }
    }
}

#[test]
fn wav_is_accepted_locally() {
    let audio = AudioData::new(vec![0; 4], AudioFormat::Wav);
    assert!(capabilities(ProviderKind::Local).check_audio(&audio).is_ok());
}
