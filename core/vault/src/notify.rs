//! Notification channel interface.
//!
//! The core emits events through an injected channel rather than any
//! process-global queue; the hosting process owns the transport and its
//! lifecycle. Delivery is fire-and-forget and at-most-once: the core logs
//! and discards failures, and never retries.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::warn;

use quorumvault_common::{Result, UserId, VaultId};

/// Events delivered to interested members.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum VaultEvent {
    /// The target was added to a vault.
    Invitation { vault_id: VaultId, vault_name: String },
    /// The target has not yet set their PIN for this vault.
    PinSetupRequired { vault_id: VaultId },
    /// Progressive unlock progress changed.
    UnlockProgress {
        vault_id: VaultId,
        entered: usize,
        total: usize,
    },
    /// The vault was unlocked.
    VaultUnlocked { vault_id: VaultId },
}

/// Outward-facing event emission contract.
///
/// Implementations own their transport (polling endpoint, push channel,
/// ...); the core makes no delivery or acknowledgment assumptions.
#[async_trait]
pub trait NotificationChannel: Send + Sync {
    /// Deliver one event to one member, best effort.
    async fn notify(&self, target: &UserId, event: VaultEvent) -> Result<()>;
}

/// Channel that drops every event, for hosts without a transport.
pub struct NullChannel;

#[async_trait]
impl NotificationChannel for NullChannel {
    async fn notify(&self, _target: &UserId, _event: VaultEvent) -> Result<()> {
        Ok(())
    }
}

/// Fan an event out to several members, swallowing per-member failures.
pub(crate) async fn notify_all(
    channel: &Arc<dyn NotificationChannel>,
    targets: &[UserId],
    event: &VaultEvent,
) {
    for target in targets {
        if let Err(e) = channel.notify(target, event.clone()).await {
            warn!(user = %target, error = %e, "Notification dropped");
        }
    }
}

/// Channel that records every delivery, for assertions in tests.
#[cfg(test)]
pub(crate) struct RecordingChannel {
    pub events: std::sync::Mutex<Vec<(UserId, VaultEvent)>>,
}

#[cfg(test)]
impl RecordingChannel {
    pub fn new() -> Self {
        Self {
            events: std::sync::Mutex::new(Vec::new()),
        }
    }
}

#[cfg(test)]
#[async_trait]
impl NotificationChannel for RecordingChannel {
    async fn notify(&self, target: &UserId, event: VaultEvent) -> Result<()> {
        self.events.lock().unwrap().push((target.clone(), event));
        Ok(())
    }
}
