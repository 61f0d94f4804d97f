//! Scripted adapter shared by service tests

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use domain::{AudioData, AudioFormat, ProviderError, ProviderKind, RefinementMode, Transcription};
use parking_lot::Mutex;
use secrecy::SecretString;

use crate::ports::ProviderAdapter;
use crate::request::CallOptions;

/// What every service call on the adapter does
#[derive(Debug, Clone)]
pub enum Behavior {
    Succeed,
    Fail(ProviderError),
    /// Never completes; used for timeout and cancellation tests
    Hang,
    /// Sleep, then succeed
    Delay(Duration),
}

#[derive(Debug)]
pub struct ScriptedAdapter {
    kind: ProviderKind,
    configured: AtomicBool,
    behavior: Mutex<Behavior>,
    probe: Mutex<Result<bool, ProviderError>>,
    calls: AtomicUsize,
    probes: AtomicUsize,
    last_options: Mutex<Option<CallOptions>>,
}

impl ScriptedAdapter {
    pub fn new(kind: ProviderKind, behavior: Behavior) -> Arc<Self> {
        Arc::new(Self {
            kind,
            configured: AtomicBool::new(true),
            behavior: Mutex::new(behavior),
            probe: Mutex::new(Ok(true)),
            calls: AtomicUsize::new(0),
            probes: AtomicUsize::new(0),
            last_options: Mutex::new(None),
        })
    }

    pub fn unconfigured(kind: ProviderKind, behavior: Behavior) -> Arc<Self> {
        let adapter = Self::new(kind, behavior);
        adapter.configured.store(false, Ordering::SeqCst);
        adapter
    }

    pub fn set_behavior(&self, behavior: Behavior) {
        *self.behavior.lock() = behavior;
    }

    pub fn set_probe(&self, probe: Result<bool, ProviderError>) {
        *self.probe.lock() = probe;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn probes(&self) -> usize {
        self.probes.load(Ordering::SeqCst)
    }

    pub fn last_options(&self) -> Option<CallOptions> {
        self.last_options.lock().clone()
    }

    async fn run(&self, options: &CallOptions) -> Result<(), ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_options.lock() = Some(options.clone());
        let behavior = self.behavior.lock().clone();
        match behavior {
            Behavior::Succeed => Ok(()),
            Behavior::Fail(err) => Err(err),
            Behavior::Hang => std::future::pending().await,
            Behavior::Delay(delay) => {
                tokio::time::sleep(delay).await;
                Ok(())
            },
        }
    }
}

#[async_trait]
impl ProviderAdapter for ScriptedAdapter {
    fn kind(&self) -> ProviderKind {
        self.kind
    }

    fn is_configured(&self) -> bool {
        self.configured.load(Ordering::SeqCst)
    }

    async fn configure(&self, secret: Option<SecretString>) -> Result<(), ProviderError> {
        if self.kind.requires_secret() && secret.is_none() {
            return Err(ProviderError::SecretMissing);
        }
        match self.test_connection().await {
            Ok(true) => {
                self.configured.store(true, Ordering::SeqCst);
                Ok(())
            },
            Ok(false) => {
                self.configured.store(false, Ordering::SeqCst);
                Err(ProviderError::SecretInvalid("probe refused".to_string()))
            },
            Err(err) => {
                self.configured.store(false, Ordering::SeqCst);
                Err(err)
            },
        }
    }

    async fn restore(&self) -> Result<bool, ProviderError> {
        Ok(self.is_configured())
    }

    async fn clear(&self) -> Result<(), ProviderError> {
        self.configured.store(false, Ordering::SeqCst);
        Ok(())
    }

    async fn test_connection(&self) -> Result<bool, ProviderError> {
        self.probes.fetch_add(1, Ordering::SeqCst);
        self.probe.lock().clone()
    }

    async fn transcribe(
        &self,
        _audio: &AudioData,
        _language: Option<&str>,
        options: &CallOptions,
    ) -> Result<Transcription, ProviderError> {
        self.run(options).await?;
        Ok(Transcription::new(format!("{} transcript", self.kind)))
    }

    async fn refine(
        &self,
        text: &str,
        _mode: &RefinementMode,
        options: &CallOptions,
    ) -> Result<String, ProviderError> {
        self.run(options).await?;
        Ok(format!("{}: {text}", self.kind))
    }

    async fn synthesize_speech(
        &self,
        text: &str,
        options: &CallOptions,
    ) -> Result<AudioData, ProviderError> {
        self.run(options).await?;
        Ok(AudioData::new(text.as_bytes().to_vec(), AudioFormat::Wav))
    }
}

pub fn as_adapters(adapters: &[&Arc<ScriptedAdapter>]) -> Vec<Arc<dyn ProviderAdapter>> {
    adapters
        .iter()
        .map(|a| Arc::clone(a) as Arc<dyn ProviderAdapter>)
        .collect()
}
