//! Quorum unlock coordination.
//!
//! A vault unlocks only when every current member has proven their PIN,
//! either in one batch call or member-by-member (progressive). Progressive
//! quorum is a sliding window: a submission only counts while it is younger
//! than the configured window, recomputed fresh from the history log on
//! every submission — there is no cached counter to drift.
//!
//! The Locked→Unlocked transition itself is delegated to
//! [`VaultStore::try_open`], whose single-writer discipline guarantees at
//! most one transition (and one `VaultUnlock` entry) per quorum event no
//! matter how many submissions race across the threshold.
//!
//! Expiry is lazy everywhere: the unlock window and the quorum window are
//! predicates over stored timestamps, evaluated at read time. Nothing ticks.

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

use crate::access::{ensure_active, ensure_member};
use crate::audit::AuditLogger;
use crate::notify::{notify_all, NotificationChannel, VaultEvent};
use crate::pins::{MemberPinStatus, PinVerifier};
use crate::policy::UnlockPolicy;
use quorumvault_common::{Error, Result, UserId, VaultId};
use quorumvault_storage::{AuditAction, HistoryEntry, VaultRecord, VaultStore};

/// One member's standing in the current quorum window.
#[derive(Debug, Clone, serde::Serialize)]
pub struct MemberProgress {
    pub user_id: UserId,
    /// Whether this member has a PIN submission inside the window.
    pub pin_entered: bool,
    /// Timestamp of their most recent in-window submission.
    pub entered_at: Option<DateTime<Utc>>,
}

/// Result of a progressive PIN submission.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ProgressiveOutcome {
    pub unlocked: bool,
    pub member_progress: Vec<MemberProgress>,
}

/// Result of a batch verification attempt.
#[derive(Debug, Clone, serde::Serialize)]
pub struct BatchOutcome {
    pub unlocked: bool,
    /// Members whose candidate PIN was wrong or not supplied.
    pub invalid_members: Vec<UserId>,
    /// Members who have never set a PIN.
    pub missing_members: Vec<UserId>,
}

/// Point-in-time view of a vault's unlock state.
#[derive(Debug, Clone, serde::Serialize)]
pub struct VaultStatus {
    pub is_unlocked: bool,
    /// Seconds left in the unlock window, zero when locked.
    pub remaining_unlock_secs: u64,
    pub member_pin_status: Vec<MemberPinStatus>,
}

/// Members' in-window submissions, derived fresh from the history log.
///
/// A member counts iff they have a `PinEnter` entry younger than `window`
/// relative to `now`. An early submitter whose entry has aged out no longer
/// counts and must resubmit.
pub fn quorum_progress(
    vault: &VaultRecord,
    history: &[HistoryEntry],
    window: Duration,
    now: DateTime<Utc>,
) -> Vec<MemberProgress> {
    let cutoff = now - window;

    vault
        .member_ids
        .iter()
        .map(|member| {
            let entered_at = history
                .iter()
                .filter(|e| {
                    e.action == AuditAction::PinEnter
                        && e.user_id == *member
                        && e.timestamp > cutoff
                })
                .map(|e| e.timestamp)
                .max();
            MemberProgress {
                user_id: member.clone(),
                pin_entered: entered_at.is_some(),
                entered_at,
            }
        })
        .collect()
}

/// Quorum holds when every current member has an in-window submission.
pub fn quorum_satisfied(progress: &[MemberProgress]) -> bool {
    !progress.is_empty() && progress.iter().all(|p| p.pin_entered)
}

/// Coordinates batch and progressive unlock over the store, PIN verifier,
/// audit log and notification channel.
pub struct UnlockCoordinator {
    store: Arc<dyn VaultStore>,
    audit: AuditLogger,
    notifier: Arc<dyn NotificationChannel>,
    policy: UnlockPolicy,
    pins: PinVerifier,
}

impl UnlockCoordinator {
    /// Create a coordinator over the given store and channel.
    pub fn new(
        store: Arc<dyn VaultStore>,
        audit: AuditLogger,
        notifier: Arc<dyn NotificationChannel>,
        policy: UnlockPolicy,
    ) -> Self {
        let pins = PinVerifier::new(store.clone(), audit.clone(), policy.clone());
        Self {
            store,
            audit,
            notifier,
            policy,
            pins,
        }
    }

    /// Verify one candidate PIN per member in a single call.
    ///
    /// All-or-nothing: any wrong or missing PIN rejects the attempt with
    /// `opened_at` untouched and exactly one failure entry listing the
    /// affected members by id. Success performs the unlock transition at
    /// most once and appends exactly one `VaultUnlock` entry.
    ///
    /// # Errors
    /// - `NotFound` / `Unauthorized` for an unknown vault or non-member
    ///   caller; PIN failures report through the outcome, not an error
    pub async fn batch_verify(
        &self,
        vault_id: &VaultId,
        acting: &UserId,
        candidates: &HashMap<UserId, String>,
    ) -> Result<BatchOutcome> {
        let vault = self.store.vault(vault_id).await?;
        ensure_active(&vault)?;
        ensure_member(&vault, acting)?;

        let now = Utc::now();
        if vault.is_unlocked(now) {
            return Ok(BatchOutcome {
                unlocked: true,
                invalid_members: Vec::new(),
                missing_members: Vec::new(),
            });
        }

        // Fail fast before any verification when a member has no PIN.
        let pins = self.store.pins_for_vault(vault_id).await?;
        let missing: Vec<UserId> = vault
            .member_ids
            .iter()
            .filter(|m| !pins.iter().any(|p| p.user_id == **m && p.is_set()))
            .cloned()
            .collect();
        if !missing.is_empty() {
            self.audit
                .record_at(
                    now,
                    vault_id,
                    acting,
                    AuditAction::VaultAccess,
                    format!("Batch unlock rejected; no PIN set for: {}", join_ids(&missing)),
                )
                .await;
            return Ok(BatchOutcome {
                unlocked: false,
                invalid_members: Vec::new(),
                missing_members: missing,
            });
        }

        // Verify each member independently; collect failures by id only.
        let mut invalid: Vec<UserId> = Vec::new();
        for member in &vault.member_ids {
            let verified = match candidates.get(member) {
                Some(candidate) => self.pins.verify_pin(vault_id, member, candidate).await,
                None => false,
            };
            if !verified {
                invalid.push(member.clone());
            }
        }
        if !invalid.is_empty() {
            self.audit
                .record_at(
                    now,
                    vault_id,
                    acting,
                    AuditAction::VaultAccess,
                    format!("Batch unlock rejected; invalid PIN for: {}", join_ids(&invalid)),
                )
                .await;
            return Ok(BatchOutcome {
                unlocked: false,
                invalid_members: invalid,
                missing_members: Vec::new(),
            });
        }

        if self.store.try_open(vault_id, now).await? {
            self.audit
                .record_at(
                    now,
                    vault_id,
                    acting,
                    AuditAction::VaultUnlock,
                    "Vault unlocked (batch)",
                )
                .await;
            notify_all(
                &self.notifier,
                &vault.member_ids,
                &VaultEvent::VaultUnlocked {
                    vault_id: vault_id.clone(),
                },
            )
            .await;
            info!(vault_id = %vault_id, "Vault unlocked by batch verification");
        }

        Ok(BatchOutcome {
            unlocked: true,
            invalid_members: Vec::new(),
            missing_members: Vec::new(),
        })
    }

    /// Submit the caller's own PIN toward the sliding-window quorum.
    ///
    /// A valid submission appends one `PinEnter` entry and recomputes quorum
    /// from the log. When quorum holds, the same at-most-once transition as
    /// the batch path runs. Submitting on an already unlocked vault is a
    /// no-op that neither extends the window nor re-logs.
    ///
    /// # Errors
    /// - `MissingPin` when the caller has never set a PIN
    /// - `InvalidPin` when the candidate does not verify; state unchanged
    pub async fn progressive_submit(
        &self,
        vault_id: &VaultId,
        acting: &UserId,
        pin: &str,
    ) -> Result<ProgressiveOutcome> {
        let vault = self.store.vault(vault_id).await?;
        ensure_active(&vault)?;
        ensure_member(&vault, acting)?;

        let now = Utc::now();
        let window = self.policy.quorum_window();

        if vault.is_unlocked(now) {
            let history = self.store.history_for_vault(vault_id).await?;
            return Ok(ProgressiveOutcome {
                unlocked: true,
                member_progress: quorum_progress(&vault, &history, window, now),
            });
        }

        let record = self
            .store
            .pin(vault_id, acting)
            .await?
            .filter(|r| r.is_set())
            .ok_or_else(|| Error::MissingPin(vec![acting.clone()]))?;

        let verified = match record.pin_hash.as_deref() {
            Some(hash) => quorumvault_crypto::verify_pin(pin, hash),
            None => false,
        };
        if !verified {
            return Err(Error::InvalidPin(vec![acting.clone()]));
        }

        // The PinEnter entry is this operation's primary state change, not
        // auxiliary audit: quorum is computed from it. It goes through the
        // store directly so a failed append surfaces to the caller.
        self.store
            .append_history(HistoryEntry {
                vault_id: vault_id.clone(),
                user_id: acting.clone(),
                action: AuditAction::PinEnter,
                details: "PIN verified".to_string(),
                timestamp: now,
            })
            .await?;

        let history = self.store.history_for_vault(vault_id).await?;
        let progress = quorum_progress(&vault, &history, window, now);
        let mut unlocked = false;

        if quorum_satisfied(&progress) {
            unlocked = true;
            if self.store.try_open(vault_id, now).await? {
                self.audit
                    .record_at(
                        now,
                        vault_id,
                        acting,
                        AuditAction::VaultUnlock,
                        "Vault unlocked (quorum reached)",
                    )
                    .await;
                notify_all(
                    &self.notifier,
                    &vault.member_ids,
                    &VaultEvent::VaultUnlocked {
                        vault_id: vault_id.clone(),
                    },
                )
                .await;
                info!(vault_id = %vault_id, "Vault unlocked by quorum");
            }
        }

        let entered = progress.iter().filter(|p| p.pin_entered).count();
        notify_all(
            &self.notifier,
            &vault.member_ids,
            &VaultEvent::UnlockProgress {
                vault_id: vault_id.clone(),
                entered,
                total: progress.len(),
            },
        )
        .await;

        debug!(
            vault_id = %vault_id,
            member = %acting,
            entered,
            total = progress.len(),
            unlocked,
            "Progressive submission"
        );

        Ok(ProgressiveOutcome {
            unlocked,
            member_progress: progress,
        })
    }

    /// Point-in-time unlock state, member only. Pure read; expiry is
    /// recomputed here rather than flipped by any background job.
    pub async fn vault_status(&self, vault_id: &VaultId, acting: &UserId) -> Result<VaultStatus> {
        let vault = self.store.vault(vault_id).await?;
        ensure_member(&vault, acting)?;

        let now = Utc::now();
        let pins = self.store.pins_for_vault(vault_id).await?;
        let member_pin_status = vault
            .member_ids
            .iter()
            .map(|member| MemberPinStatus {
                user_id: member.clone(),
                pin_set: pins.iter().any(|p| p.user_id == *member && p.is_set()),
            })
            .collect();

        Ok(VaultStatus {
            is_unlocked: vault.is_unlocked(now),
            remaining_unlock_secs: vault.remaining_unlock_time(now).num_seconds().max(0) as u64,
            member_pin_status,
        })
    }

    /// Explicitly clear `opened_at`, returning the vault to Locked before
    /// the window lapses on its own.
    pub async fn lock(&self, vault_id: &VaultId, acting: &UserId) -> Result<()> {
        let vault = self.store.vault(vault_id).await?;
        ensure_active(&vault)?;
        ensure_member(&vault, acting)?;

        self.store.clear_opened(vault_id).await?;
        self.audit
            .record(vault_id, acting, AuditAction::VaultLock, "Vault locked")
            .await;

        info!(vault_id = %vault_id, member = %acting, "Vault locked");
        Ok(())
    }
}

fn join_ids(ids: &[UserId]) -> String {
    ids.iter()
        .map(|id| id.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}
