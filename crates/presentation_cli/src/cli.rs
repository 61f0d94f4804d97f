//! Command-line surface

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use domain::{ProviderKind, RefinementMode, ServiceKind, ServicePreferences};

/// VoxBridge CLI
#[derive(Debug, Parser)]
#[command(name = "voxbridge")]
#[command(author, version, about = "Transcription, refinement and speech across AI providers", long_about = None)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Configuration file (defaults to ./voxbridge.toml when present)
    #[arg(short, long, global = true, env = "VOXBRIDGE_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Store and validate a provider secret
    ///
    /// Without --secret the secret is read from stdin.
    /// Example: voxbridge configure openai < key.txt
    Configure {
        provider: ProviderKind,

        /// Secret to store (prefer stdin or the environment over the command line)
        #[arg(long, env = "VOXBRIDGE_SECRET", hide_env_values = true)]
        secret: Option<String>,
    },

    /// Delete a provider's stored secret
    Remove { provider: ProviderKind },

    /// Probe a provider and record the outcome in its health
    Test { provider: ProviderKind },

    /// Transcribe an audio file
    Transcribe {
        /// Audio file; the format is taken from the extension
        file: PathBuf,

        /// ISO 639-1 language hint
        #[arg(short, long)]
        language: Option<String>,

        #[command(flatten)]
        routing: RoutingArgs,
    },

    /// Rewrite text; pass "-" to read it from stdin
    Refine {
        text: String,

        /// clean, formal, casual, summarize, bullets or translate:<lang>
        #[arg(long, default_value = "clean")]
        mode: RefinementMode,

        #[command(flatten)]
        routing: RoutingArgs,
    },

    /// Synthesize speech into an audio file; pass "-" to read text from stdin
    Speak {
        text: String,

        /// Where to write the audio
        #[arg(short, long)]
        output: PathBuf,

        /// Voice identifier of the chosen provider
        #[arg(long)]
        voice: Option<String>,

        #[command(flatten)]
        routing: RoutingArgs,
    },

    /// Show configuration and health of every provider
    Health {
        /// Probe configured providers before reporting
        #[arg(long)]
        probe: bool,
    },

    /// Print provider events while re-probing unavailable providers
    Watch {
        /// Seconds between recovery probes (defaults to orchestrator.recovery_interval_secs)
        #[arg(long)]
        interval_secs: Option<u64>,
    },
}

/// Per-call overrides of the configured preferences
#[derive(Debug, Clone, Default, Args)]
pub struct RoutingArgs {
    /// Preferred provider for this call
    #[arg(short, long)]
    pub provider: Option<ProviderKind>,

    /// Model of the preferred provider
    #[arg(short, long)]
    pub model: Option<String>,

    /// Fail instead of trying other providers
    #[arg(long)]
    pub no_fallback: bool,
}

impl RoutingArgs {
    /// Configured preferences with this call's overrides applied
    pub fn apply(
        &self,
        base: &ServicePreferences,
        service: ServiceKind,
        voice: Option<&str>,
    ) -> ServicePreferences {
        let mut preferences = base.clone();
        if let Some(provider) = self.provider {
            preferences = preferences.with_preferred(service, provider);
        }
        if self.no_fallback {
            preferences = preferences.with_fallback(false);
        }
        if self.model.is_none() && voice.is_none() {
            return preferences;
        }

        let provider = preferences.preferred(service);
        let mut selection = preferences.selection(provider);
        if let Some(model) = &self.model {
            let slot = match service {
                ServiceKind::Transcription => &mut selection.transcription_model,
                ServiceKind::Refinement => &mut selection.refinement_model,
                ServiceKind::TextToSpeech => &mut selection.speech_model,
            };
            *slot = Some(model.clone());
        }
        if let Some(voice) = voice {
            selection.voice = Some(voice.to_string());
        }
        preferences.with_selection(provider, selection)
    }
}

/// Log filter for a `-v` count, `None` keeps the configured filter
pub const fn log_filter_from_verbosity(verbose: u8) -> Option<&'static str> {
    match verbose {
        0 => None,
        1 => Some("info"),
        2 => Some("debug"),
        _ => Some("trace"),
    }
}
