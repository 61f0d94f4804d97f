//! Per-adapter credential holder
//!
//! A [`CredentialSlot`] owns the in-memory copy of one provider's secret and
//! drives the configure flow against the [`CredentialStorePort`]:
//!
//! ```text
//!   Empty ──configure──▶ Pending ──probe ok──▶ Active
//!     ▲                     │
//!     └──── probe fails / cancelled (secret deleted from the store)
//! ```
//!
//! Only `Active` counts as configured. Service calls read the active secret;
//! probes may also use a pending one.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use application::CredentialStorePort;
use domain::{ProviderError, ProviderKind};
use parking_lot::RwLock;
use secrecy::{ExposeSecret, SecretString};
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, info, warn};

enum SlotState {
    Empty,
    Pending(SecretString),
    Active(SecretString),
}

/// Holder of one provider's secret
pub struct CredentialSlot {
    provider: ProviderKind,
    store: Arc<dyn CredentialStorePort>,
    state: RwLock<SlotState>,
    // serializes configure/restore/clear so their store writes cannot interleave;
    // an abandoned configure keeps it until its background delete is done
    op_lock: Arc<Mutex<()>>,
}

impl fmt::Debug for CredentialSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match &*self.state.read() {
            SlotState::Empty => "empty",
            SlotState::Pending(_) => "pending",
            SlotState::Active(_) => "active",
        };
        f.debug_struct("CredentialSlot")
            .field("provider", &self.provider)
            .field("state", &state)
            .finish_non_exhaustive()
    }
}

impl CredentialSlot {
    #[must_use]
    pub fn new(provider: ProviderKind, store: Arc<dyn CredentialStorePort>) -> Self {
        Self {
            provider,
            store,
            state: RwLock::new(SlotState::Empty),
            op_lock: Arc::new(Mutex::new(())),
        }
    }

    #[must_use]
    pub const fn provider(&self) -> ProviderKind {
        self.provider
    }

    /// Whether a validated secret is held
    #[must_use]
    pub fn is_active(&self) -> bool {
        matches!(*self.state.read(), SlotState::Active(_))
    }

    /// Secret for service calls
    ///
    /// # Errors
    ///
    /// `SecretMissing` unless the slot is active.
    pub fn active(&self) -> Result<SecretString, ProviderError> {
        match &*self.state.read() {
            SlotState::Active(secret) => Ok(secret.clone()),
            SlotState::Empty | SlotState::Pending(_) => Err(ProviderError::SecretMissing),
        }
    }

    /// Secret for probes: the pending one during configuration, else the active one
    ///
    /// # Errors
    ///
    /// `SecretMissing` when the slot is empty.
    pub fn current(&self) -> Result<SecretString, ProviderError> {
        match &*self.state.read() {
            SlotState::Pending(secret) | SlotState::Active(secret) => Ok(secret.clone()),
            SlotState::Empty => Err(ProviderError::SecretMissing),
        }
    }

    /// Persist a secret, hold it as pending, and promote it once `probe` accepts it
    ///
    /// A blank secret counts as missing. On any failure, or if the returned
    /// future is dropped before the probe finishes, the secret is deleted
    /// from the store and the slot ends up empty.
    ///
    /// # Errors
    ///
    /// `SecretMissing`, a store failure, `SecretInvalid` when the probe
    /// answers `false`, or the probe's own error.
    pub async fn configure<F, Fut>(
        &self,
        secret: Option<SecretString>,
        probe: F,
    ) -> Result<(), ProviderError>
    where
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = Result<bool, ProviderError>> + Send,
    {
        let secret = secret
            .filter(|s| !s.expose_secret().trim().is_empty())
            .ok_or(ProviderError::SecretMissing)?;

        let op = Arc::clone(&self.op_lock).lock_owned().await;
        let mut rollback = Rollback::arm(self, op);

        if let Err(err) = self.store.store(self.provider, &secret).await {
            warn!(provider = %self.provider, error = %err, "Failed to persist secret");
            rollback.run().await;
            return Err(err.into());
        }
        *self.state.write() = SlotState::Pending(secret);

        match probe().await {
            Ok(true) => {
                let mut state = self.state.write();
                if let SlotState::Pending(secret) =
                    std::mem::replace(&mut *state, SlotState::Empty)
                {
                    *state = SlotState::Active(secret);
                }
                drop(state);
                rollback.disarm();
                info!(provider = %self.provider, "Credential validated");
                Ok(())
            },
            Ok(false) => {
                rollback.run().await;
                Err(ProviderError::SecretInvalid(format!(
                    "{} refused the secret",
                    self.provider
                )))
            },
            Err(err) => {
                rollback.run().await;
                Err(err)
            },
        }
    }

    /// Load a previously stored secret as active, without probing
    ///
    /// # Errors
    ///
    /// Store read failures.
    pub async fn restore(&self) -> Result<bool, ProviderError> {
        let _op = self.op_lock.lock().await;
        match self.store.retrieve(self.provider).await? {
            Some(secret) if !secret.expose_secret().trim().is_empty() => {
                *self.state.write() = SlotState::Active(secret);
                debug!(provider = %self.provider, "Restored stored credential");
                Ok(true)
            },
            _ => Ok(self.is_active()),
        }
    }

    /// Drop the held secret and delete the stored one
    ///
    /// # Errors
    ///
    /// Store delete failures; the in-memory copy is dropped regardless.
    pub async fn clear(&self) -> Result<(), ProviderError> {
        let _op = self.op_lock.lock().await;
        *self.state.write() = SlotState::Empty;
        self.store.delete(self.provider).await?;
        info!(provider = %self.provider, "Credential cleared");
        Ok(())
    }
}

/// Undo for a configure attempt
///
/// `run` undoes synchronously with the caller; if the attempt is dropped
/// mid-flight the `Drop` impl empties the slot and deletes the stored secret
/// on a background task. The slot's operation lock travels with that task,
/// so a later configure cannot store its secret before the delete runs.
struct Rollback<'a> {
    slot: &'a CredentialSlot,
    op: Option<OwnedMutexGuard<()>>,
    armed: bool,
}

impl<'a> Rollback<'a> {
    const fn arm(slot: &'a CredentialSlot, op: OwnedMutexGuard<()>) -> Self {
        Self {
            slot,
            op: Some(op),
            armed: true,
        }
    }

    const fn disarm(&mut self) {
        self.armed = false;
    }

    async fn run(&mut self) {
        self.armed = false;
        *self.slot.state.write() = SlotState::Empty;
        if let Err(err) = self.slot.store.delete(self.slot.provider).await {
            warn!(provider = %self.slot.provider, error = %err, "Rollback could not delete secret");
        }
        debug!(provider = %self.slot.provider, "Configuration rolled back");
    }
}

impl Drop for Rollback<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        *self.slot.state.write() = SlotState::Empty;

        let store = Arc::clone(&self.slot.store);
        let provider = self.slot.provider;
        let op = self.op.take();
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    if let Err(err) = store.delete(provider).await {
                        warn!(provider = %provider, error = %err, "Rollback could not delete secret");
                    }
                    drop(op);
                });
            },
            Err(_) => warn!(provider = %provider, "No runtime to delete abandoned secret"),
        }
    }
}
