//! Sub-command handlers

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, bail};
use application::{ProviderService, ServiceOutput, ServiceRequest, ServiceResponse};
use domain::{AudioData, AudioFormat, ProviderKind, ServiceKind, ServicePreferences};
use infrastructure::AppConfig;
use secrecy::SecretString;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::cli::{Commands, RoutingArgs};
use crate::output;

pub async fn run(
    command: Commands,
    config: &AppConfig,
    service: &Arc<ProviderService>,
) -> anyhow::Result<()> {
    match command {
        Commands::Configure { provider, secret } => configure(service, provider, secret).await,
        Commands::Remove { provider } => {
            service.remove_provider(provider).await?;
            println!("🧹 {provider}: secret removed");
            Ok(())
        },
        Commands::Test { provider } => test(service, provider).await,
        Commands::Transcribe {
            file,
            language,
            routing,
        } => {
            let audio = read_audio(&file).await?;
            let request = ServiceRequest::Transcription { audio, language };
            let preferences = routing.apply(&config.preferences, ServiceKind::Transcription, None);
            let response = perform(service, &request, &preferences).await?;
            print_text(&response);
            Ok(())
        },
        Commands::Refine {
            text,
            mode,
            routing,
        } => {
            let text = read_text(text).await?;
            let request = ServiceRequest::refinement(text, mode);
            let preferences = routing.apply(&config.preferences, ServiceKind::Refinement, None);
            let response = perform(service, &request, &preferences).await?;
            print_text(&response);
            Ok(())
        },
        Commands::Speak {
            text,
            output,
            voice,
            routing,
        } => speak(service, config, text, &output, voice.as_deref(), &routing).await,
        Commands::Health { probe } => {
            health(service, probe).await;
            Ok(())
        },
        Commands::Watch { interval_secs } => {
            let interval = interval_secs
                .map_or_else(|| config.orchestrator.recovery_interval(), Duration::from_secs);
            watch(service, interval).await
        },
    }
}

async fn configure(
    service: &ProviderService,
    provider: ProviderKind,
    secret: Option<String>,
) -> anyhow::Result<()> {
    let secret = match secret {
        Some(secret) => Some(secret),
        None if provider.requires_secret() => Some(read_secret(provider).await?),
        None => None,
    };

    service
        .configure_provider(provider, secret.map(SecretString::from))
        .await
        .with_context(|| format!("configuring {provider}"))?;
    println!("🔐 {provider}: configured and reachable");
    Ok(())
}

async fn test(service: &ProviderService, provider: ProviderKind) -> anyhow::Result<()> {
    if !service.is_provider_configured(provider) {
        bail!("{provider} is not configured; run `voxbridge configure {provider}` first");
    }
    let reachable = service.test_provider(provider).await?;
    let status = service.current_health(provider);
    if reachable {
        println!("✅ {provider}: reachable ({status})");
        Ok(())
    } else {
        bail!("{provider} answered but is not usable ({status})")
    }
}

async fn speak(
    service: &ProviderService,
    config: &AppConfig,
    text: String,
    output: &Path,
    voice: Option<&str>,
    routing: &RoutingArgs,
) -> anyhow::Result<()> {
    let text = read_text(text).await?;
    let request = ServiceRequest::speech(text);
    let preferences = routing.apply(&config.preferences, ServiceKind::TextToSpeech, voice);
    let response = perform(service, &request, &preferences).await?;

    let ServiceOutput::Speech(audio) = response.output else {
        bail!("{} returned no audio", response.provider);
    };
    tokio::fs::write(output, audio.bytes())
        .await
        .with_context(|| format!("writing {}", output.display()))?;
    println!(
        "🔊 {} bytes of {} from {} written to {}",
        audio.len(),
        audio.format().extension(),
        response.provider,
        output.display()
    );
    Ok(())
}

async fn health(service: &ProviderService, probe: bool) {
    if probe {
        for provider in ProviderKind::ALL {
            if !service.is_provider_configured(provider) {
                continue;
            }
            if let Err(e) = service.test_provider(provider).await {
                debug!(%provider, error = %e, "Probe failed");
            }
        }
    }

    for health in service.health_snapshot() {
        let configured = service.is_provider_configured(health.provider);
        println!("{}", output::health_row(&health, configured));
    }
}

async fn watch(service: &Arc<ProviderService>, interval: Duration) -> anyhow::Result<()> {
    let mut events = service.subscribe();
    let recovery = service.spawn_recovery_task(interval);
    println!(
        "👀 Watching provider events, re-probing every {}s (Ctrl-C to stop)",
        interval.as_secs()
    );

    let result = loop {
        tokio::select! {
            signal = tokio::signal::ctrl_c() => break signal.context("waiting for Ctrl-C"),
            event = events.recv() => match event {
                Ok(event) => println!("{}", output::describe_event(&event)),
                Err(RecvError::Lagged(skipped)) => warn!(skipped, "Event subscriber lagged"),
                Err(RecvError::Closed) => break Ok(()),
            },
        }
    };

    recovery.abort();
    result
}

/// Run a request that Ctrl-C cancels
async fn perform(
    service: &ProviderService,
    request: &ServiceRequest,
    preferences: &ServicePreferences,
) -> anyhow::Result<ServiceResponse> {
    preferences
        .validate()
        .context("invalid provider selection")?;

    let cancel = CancellationToken::new();
    let interrupt = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        })
    };

    let result = service
        .perform_with_cancellation(request, preferences, &cancel)
        .await;
    interrupt.abort();

    let response = result?;
    if response.used_fallback() {
        eprintln!("↪️  {}", output::fallback_note(&response.failures));
    }
    Ok(response)
}

fn print_text(response: &ServiceResponse) {
    match response.output.text() {
        Some(text) => println!("{text}"),
        None => warn!(provider = %response.provider, "Response carried no text"),
    }
}

async fn read_audio(path: &Path) -> anyhow::Result<AudioData> {
    let format = path
        .extension()
        .and_then(|ext| ext.to_str())
        .and_then(AudioFormat::from_extension)
        .with_context(|| format!("unrecognized audio format: {}", path.display()))?;
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("reading {}", path.display()))?;
    Ok(AudioData::new(bytes, format))
}

/// The argument itself, or all of stdin for "-"
async fn read_text(arg: String) -> anyhow::Result<String> {
    if arg != "-" {
        return Ok(arg);
    }
    let mut text = String::new();
    tokio::io::stdin()
        .read_to_string(&mut text)
        .await
        .context("reading text from stdin")?;
    Ok(text)
}

async fn read_secret(provider: ProviderKind) -> anyhow::Result<String> {
    eprintln!("Secret for {provider}:");
    let mut line = String::new();
    BufReader::new(tokio::io::stdin())
        .read_line(&mut line)
        .await
        .context("reading secret from stdin")?;
    Ok(line.trim().to_string())
}
