//! Vault lifecycle and membership management.

use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

use crate::access::{ensure_active, ensure_admin, ensure_member};
use crate::audit::AuditLogger;
use crate::notify::{notify_all, NotificationChannel, VaultEvent};
use crate::policy::UnlockPolicy;
use quorumvault_common::{Error, Result, UserId, VaultId};
use quorumvault_storage::{AuditAction, PinRecord, VaultRecord, VaultStore};

/// Input for vault creation.
#[derive(Debug, Clone)]
pub struct NewVault {
    pub name: String,
    pub description: String,
    pub admin_id: UserId,
    pub member_ids: Vec<UserId>,
    pub unlock_duration_minutes: u32,
    /// Optional starting PINs, keyed by member. Members absent from the map
    /// start with no PIN set.
    pub initial_pins: HashMap<UserId, String>,
}

/// Partial update for an existing vault. `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct VaultUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub unlock_duration_minutes: Option<u32>,
    /// Full replacement member list; differences against the current
    /// membership drive PIN record creation and deletion.
    pub member_ids: Option<Vec<UserId>>,
}

/// Creates and manages vaults and their membership.
pub struct VaultManager {
    store: Arc<dyn VaultStore>,
    audit: AuditLogger,
    notifier: Arc<dyn NotificationChannel>,
    policy: UnlockPolicy,
}

impl VaultManager {
    /// Create a manager over the given store and notification channel.
    pub fn new(
        store: Arc<dyn VaultStore>,
        audit: AuditLogger,
        notifier: Arc<dyn NotificationChannel>,
        policy: UnlockPolicy,
    ) -> Self {
        Self {
            store,
            audit,
            notifier,
            policy,
        }
    }

    /// Deduplicate while preserving order, making sure the admin is present.
    fn normalize_members(admin: &UserId, members: &[UserId]) -> Vec<UserId> {
        let mut out: Vec<UserId> = Vec::with_capacity(members.len() + 1);
        if !members.contains(admin) {
            out.push(admin.clone());
        }
        for member in members {
            if !out.contains(member) {
                out.push(member.clone());
            }
        }
        out
    }

    /// Create a new vault.
    ///
    /// # Preconditions
    /// - `member_ids` is non-empty
    /// - `unlock_duration_minutes` is at least 1
    /// - Any initial PIN belongs to a listed member and meets the length
    ///   policy
    ///
    /// # Postconditions
    /// - The admin is a member even if the caller omitted them
    /// - Every member has exactly one PIN record, seeded from `initial_pins`
    /// - One `VaultCreate` history entry is appended
    /// - Every member is invited; members without a PIN are asked to set one
    ///
    /// # Errors
    /// - `Validation` for an empty member list, a zero duration, or a bad
    ///   initial PIN
    pub async fn create_vault(&self, new: NewVault) -> Result<VaultRecord> {
        if new.member_ids.is_empty() {
            return Err(Error::Validation("Member list cannot be empty".to_string()));
        }
        if new.unlock_duration_minutes < 1 {
            return Err(Error::Validation(
                "Unlock duration must be at least 1 minute".to_string(),
            ));
        }

        let member_ids = Self::normalize_members(&new.admin_id, &new.member_ids);

        for (user, pin) in &new.initial_pins {
            if !member_ids.contains(user) {
                return Err(Error::Validation(format!(
                    "Initial PIN supplied for non-member {}",
                    user
                )));
            }
            if pin.chars().count() < self.policy.min_pin_length {
                return Err(Error::Validation(format!(
                    "Initial PIN for {} must be at least {} characters",
                    user, self.policy.min_pin_length
                )));
            }
        }

        let now = Utc::now();
        let vault = VaultRecord {
            id: VaultId::generate(),
            name: new.name,
            description: new.description,
            admin_id: new.admin_id.clone(),
            member_ids: member_ids.clone(),
            opened_at: None,
            unlock_duration_minutes: new.unlock_duration_minutes,
            is_active: true,
            created_at: now,
            modified_at: now,
        };
        self.store.insert_vault(vault.clone()).await?;

        for member in &member_ids {
            let mut record = PinRecord::unset(vault.id.clone(), member.clone(), now);
            if let Some(pin) = new.initial_pins.get(member) {
                record.pin_hash = Some(quorumvault_crypto::hash_pin(pin)?);
            }
            self.store.upsert_pin(record).await?;
        }

        self.audit
            .record(
                &vault.id,
                &new.admin_id,
                AuditAction::VaultCreate,
                format!("Vault '{}' created", vault.name),
            )
            .await;

        notify_all(
            &self.notifier,
            &member_ids,
            &VaultEvent::Invitation {
                vault_id: vault.id.clone(),
                vault_name: vault.name.clone(),
            },
        )
        .await;

        let needs_pin: Vec<UserId> = member_ids
            .iter()
            .filter(|m| !new.initial_pins.contains_key(*m))
            .cloned()
            .collect();
        notify_all(
            &self.notifier,
            &needs_pin,
            &VaultEvent::PinSetupRequired {
                vault_id: vault.id.clone(),
            },
        )
        .await;

        info!(vault_id = %vault.id, members = member_ids.len(), "Vault created");
        Ok(vault)
    }

    /// Update vault settings and membership, admin only.
    ///
    /// Membership changes are computed as a set difference: joining members
    /// get an unset PIN record and an invitation, leaving members lose their
    /// PIN record. The admin is never removable through this path.
    pub async fn update_vault(
        &self,
        vault_id: &VaultId,
        acting: &UserId,
        update: VaultUpdate,
    ) -> Result<VaultRecord> {
        let mut vault = self.store.vault(vault_id).await?;
        ensure_active(&vault)?;
        ensure_admin(&vault, acting)?;

        if let Some(duration) = update.unlock_duration_minutes {
            if duration < 1 {
                return Err(Error::Validation(
                    "Unlock duration must be at least 1 minute".to_string(),
                ));
            }
        }

        let now = Utc::now();
        let mut settings_changed = false;

        if let Some(name) = update.name {
            vault.name = name;
            settings_changed = true;
        }
        if let Some(description) = update.description {
            vault.description = description;
            settings_changed = true;
        }
        if let Some(duration) = update.unlock_duration_minutes {
            vault.unlock_duration_minutes = duration;
            settings_changed = true;
        }

        let mut added: Vec<UserId> = Vec::new();
        let mut removed: Vec<UserId> = Vec::new();

        if let Some(new_members) = update.member_ids {
            let new_members = Self::normalize_members(&vault.admin_id, &new_members);

            added = new_members
                .iter()
                .filter(|m| !vault.member_ids.contains(m))
                .cloned()
                .collect();
            removed = vault
                .member_ids
                .iter()
                .filter(|m| !new_members.contains(m))
                .cloned()
                .collect();

            for member in &added {
                self.store
                    .upsert_pin(PinRecord::unset(vault.id.clone(), member.clone(), now))
                    .await?;
            }
            for member in &removed {
                self.store.delete_pin(&vault.id, member).await?;
            }

            vault.member_ids = new_members;
        }

        vault.modified_at = now;
        self.store.update_vault(vault.clone()).await?;

        if settings_changed {
            self.audit
                .record(
                    vault_id,
                    acting,
                    AuditAction::VaultAccess,
                    "Vault settings updated",
                )
                .await;
        }
        if !added.is_empty() {
            self.audit
                .record(
                    vault_id,
                    acting,
                    AuditAction::MemberAdd,
                    format!("Added: {}", join_ids(&added)),
                )
                .await;
        }
        if !removed.is_empty() {
            self.audit
                .record(
                    vault_id,
                    acting,
                    AuditAction::MemberRemove,
                    format!("Removed: {}", join_ids(&removed)),
                )
                .await;
        }

        if !added.is_empty() {
            notify_all(
                &self.notifier,
                &added,
                &VaultEvent::Invitation {
                    vault_id: vault.id.clone(),
                    vault_name: vault.name.clone(),
                },
            )
            .await;
            notify_all(
                &self.notifier,
                &added,
                &VaultEvent::PinSetupRequired {
                    vault_id: vault.id.clone(),
                },
            )
            .await;
        }

        debug!(
            vault_id = %vault.id,
            added = added.len(),
            removed = removed.len(),
            "Vault updated"
        );
        Ok(vault)
    }

    /// Soft-delete a vault, admin only.
    ///
    /// History entries and file records are preserved; only `is_active`
    /// flips. There is no hard delete.
    pub async fn deactivate(&self, vault_id: &VaultId, acting: &UserId) -> Result<()> {
        let mut vault = self.store.vault(vault_id).await?;
        ensure_active(&vault)?;
        ensure_admin(&vault, acting)?;

        vault.is_active = false;
        vault.modified_at = Utc::now();
        self.store.update_vault(vault).await?;

        self.audit
            .record(vault_id, acting, AuditAction::VaultLock, "Vault deactivated")
            .await;

        info!(vault_id = %vault_id, "Vault deactivated");
        Ok(())
    }

    /// Fetch a vault, member only. Readable after deactivation; history and
    /// metadata outlive the vault's active life.
    pub async fn get_vault(&self, vault_id: &VaultId, acting: &UserId) -> Result<VaultRecord> {
        let vault = self.store.vault(vault_id).await?;
        ensure_member(&vault, acting)?;

        self.audit
            .record(vault_id, acting, AuditAction::VaultAccess, "Vault viewed")
            .await;

        Ok(vault)
    }

    /// All vaults where the caller is a member.
    pub async fn vaults_for_user(&self, acting: &UserId) -> Result<Vec<VaultRecord>> {
        self.store.vaults_for_user(acting).await
    }
}

fn join_ids(ids: &[UserId]) -> String {
    ids.iter()
        .map(|id| id.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}
