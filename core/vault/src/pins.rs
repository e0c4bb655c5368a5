//! Per-member PIN lifecycle and verification.
//!
//! Hashing happens here, explicitly, before a record reaches the store;
//! nothing re-hashes on save behind the caller's back. Verification fails
//! closed: no record, unset record or unparseable hash all read as "wrong
//! PIN", never as an error.

use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info};

use crate::access::{ensure_active, ensure_member};
use crate::audit::AuditLogger;
use crate::policy::UnlockPolicy;
use quorumvault_common::{Error, Result, UserId, VaultId};
use quorumvault_crypto::{hash_pin, verify_pin};
use quorumvault_storage::{AuditAction, PinRecord, VaultStore};

/// Per-member PIN state as reported to callers. Never carries hash material.
#[derive(Debug, Clone, serde::Serialize)]
pub struct MemberPinStatus {
    pub user_id: UserId,
    pub pin_set: bool,
}

/// Answer to a pin-status query.
#[derive(Debug, Clone, serde::Serialize)]
pub struct PinStatusReport {
    /// One entry per current member, in membership order.
    pub members: Vec<MemberPinStatus>,
    /// Whether the caller themselves has a PIN set.
    pub current_user_has_pin: bool,
}

/// Lifecycle and verification of per-member vault PINs.
pub struct PinVerifier {
    store: Arc<dyn VaultStore>,
    audit: AuditLogger,
    policy: UnlockPolicy,
}

impl PinVerifier {
    /// Create a verifier over the given store.
    pub fn new(store: Arc<dyn VaultStore>, audit: AuditLogger, policy: UnlockPolicy) -> Self {
        Self {
            store,
            audit,
            policy,
        }
    }

    /// Set or change a member's PIN.
    ///
    /// # Preconditions
    /// - `acting` is the vault admin or the target member themselves
    /// - `target` is a current member
    /// - `raw_pin` meets the policy's minimum length
    ///
    /// # Postconditions
    /// - A freshly salted hash is stored; re-setting the same PIN re-hashes
    ///   but is a no-op in effect
    ///
    /// # Errors
    /// - `Validation` for a short PIN
    /// - `Unauthorized` when `acting` is neither admin nor target
    /// - `NotFound` when the vault is missing or `target` is not a member
    pub async fn set_pin(
        &self,
        vault_id: &VaultId,
        target: &UserId,
        raw_pin: &str,
        acting: &UserId,
    ) -> Result<()> {
        if raw_pin.chars().count() < self.policy.min_pin_length {
            return Err(Error::Validation(format!(
                "PIN must be at least {} characters",
                self.policy.min_pin_length
            )));
        }

        let vault = self.store.vault(vault_id).await?;
        ensure_active(&vault)?;

        if acting != target && !vault.is_admin(acting) {
            return Err(Error::Unauthorized(format!(
                "{} may not set the PIN of {}",
                acting, target
            )));
        }
        if !vault.is_member(target) {
            return Err(Error::NotFound(format!(
                "{} is not a member of vault {}",
                target, vault_id
            )));
        }

        let now = Utc::now();
        let mut record = match self.store.pin(vault_id, target).await? {
            Some(record) => record,
            None => PinRecord::unset(vault_id.clone(), target.clone(), now),
        };
        let was_set = record.is_set();

        record.pin_hash = Some(hash_pin(raw_pin)?);
        record.modified_at = now;
        self.store.upsert_pin(record).await?;

        let action = if was_set {
            AuditAction::PinChange
        } else {
            AuditAction::PinSet
        };
        self.audit
            .record(vault_id, acting, action, format!("PIN for {}", target))
            .await;

        info!(vault_id = %vault_id, member = %target, changed = was_set, "PIN stored");
        Ok(())
    }

    /// Verify a candidate PIN for a member.
    ///
    /// Fails closed: returns false when the vault or record is missing, no
    /// PIN has been set, or the hash does not match. Never errors.
    pub async fn verify_pin(&self, vault_id: &VaultId, user_id: &UserId, candidate: &str) -> bool {
        let record = match self.store.pin(vault_id, user_id).await {
            Ok(Some(record)) => record,
            _ => return false,
        };

        match record.pin_hash.as_deref() {
            Some(hash) if record.is_set() => verify_pin(candidate, hash),
            _ => false,
        }
    }

    /// Remove a member's PIN, returning the record to the unset state.
    ///
    /// Same authorization rule as [`PinVerifier::set_pin`].
    pub async fn remove_pin(
        &self,
        vault_id: &VaultId,
        target: &UserId,
        acting: &UserId,
    ) -> Result<()> {
        let vault = self.store.vault(vault_id).await?;
        ensure_active(&vault)?;

        if acting != target && !vault.is_admin(acting) {
            return Err(Error::Unauthorized(format!(
                "{} may not remove the PIN of {}",
                acting, target
            )));
        }
        if !vault.is_member(target) {
            return Err(Error::NotFound(format!(
                "{} is not a member of vault {}",
                target, vault_id
            )));
        }

        let now = Utc::now();
        let mut record = match self.store.pin(vault_id, target).await? {
            Some(record) => record,
            None => PinRecord::unset(vault_id.clone(), target.clone(), now),
        };
        record.pin_hash = None;
        record.modified_at = now;
        self.store.upsert_pin(record).await?;

        self.audit
            .record(
                vault_id,
                acting,
                AuditAction::PinChange,
                format!("PIN removed for {}", target),
            )
            .await;

        debug!(vault_id = %vault_id, member = %target, "PIN removed");
        Ok(())
    }

    /// Which members have a PIN set, viewable by any member.
    pub async fn pin_status(
        &self,
        vault_id: &VaultId,
        acting: &UserId,
    ) -> Result<PinStatusReport> {
        let vault = self.store.vault(vault_id).await?;
        ensure_member(&vault, acting)?;

        let pins = self.store.pins_for_vault(vault_id).await?;
        let members: Vec<MemberPinStatus> = vault
            .member_ids
            .iter()
            .map(|member| MemberPinStatus {
                user_id: member.clone(),
                pin_set: pins
                    .iter()
                    .any(|p| p.user_id == *member && p.is_set()),
            })
            .collect();

        let current_user_has_pin = members
            .iter()
            .any(|m| m.user_id == *acting && m.pin_set);

        Ok(PinStatusReport {
            members,
            current_user_has_pin,
        })
    }
}
