//! Persisted record shapes.
//!
//! These are the entity types the document store holds. The unlock state of
//! a vault is derived from `opened_at` and the configured duration at read
//! time; nothing in here is ticked by a timer.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use quorumvault_common::{FileId, UserId, VaultId};
use quorumvault_crypto::Envelope;

/// Closed set of auditable actions.
///
/// Consumers match exhaustively; adding a variant is a deliberate schema
/// change, not a free-form string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuditAction {
    VaultCreate,
    VaultAccess,
    VaultUnlock,
    VaultLock,
    FileView,
    FileUpload,
    FileEdit,
    FileDelete,
    MemberAdd,
    MemberRemove,
    PinSet,
    PinChange,
    PinEnter,
}

/// A multi-member vault of encrypted files.
///
/// `member_ids` is an ordered set: unique entries, always containing
/// `admin_id`. Vaults are never hard-deleted; `is_active` is the soft-delete
/// flag and history outlives deactivation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VaultRecord {
    pub id: VaultId,
    pub name: String,
    pub description: String,
    pub admin_id: UserId,
    pub member_ids: Vec<UserId>,
    /// Set when the vault was last unlocked; `None` means locked.
    pub opened_at: Option<DateTime<Utc>>,
    /// Length of the unlock window in minutes, at least 1.
    pub unlock_duration_minutes: u32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

impl VaultRecord {
    /// Whether `user` is a current member.
    pub fn is_member(&self, user: &UserId) -> bool {
        self.member_ids.contains(user)
    }

    /// Whether `user` is the vault admin.
    pub fn is_admin(&self, user: &UserId) -> bool {
        self.admin_id == *user
    }

    /// The configured unlock window.
    pub fn unlock_duration(&self) -> Duration {
        Duration::minutes(i64::from(self.unlock_duration_minutes))
    }

    /// Derived unlock predicate: `opened_at` is set and `now` falls inside
    /// the window. There is no stored "unlocked" flag to get stale.
    pub fn is_unlocked(&self, now: DateTime<Utc>) -> bool {
        match self.opened_at {
            Some(opened_at) => now < opened_at + self.unlock_duration(),
            None => false,
        }
    }

    /// Time left in the unlock window, clamped to zero.
    pub fn remaining_unlock_time(&self, now: DateTime<Utc>) -> Duration {
        match self.opened_at {
            Some(opened_at) => {
                let deadline = opened_at + self.unlock_duration();
                (deadline - now).max(Duration::zero())
            }
            None => Duration::zero(),
        }
    }
}

/// Per-member PIN state for one vault.
///
/// The hash is a PHC-format Argon2id string, produced explicitly at the
/// setter; records are written with hashing already done.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PinRecord {
    pub vault_id: VaultId,
    pub user_id: UserId,
    /// Absent until the member (or admin) sets a PIN.
    pub pin_hash: Option<String>,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

impl PinRecord {
    /// A member joining a vault starts with no PIN set.
    pub fn unset(vault_id: VaultId, user_id: UserId, now: DateTime<Utc>) -> Self {
        Self {
            vault_id,
            user_id,
            pin_hash: None,
            created_at: now,
            modified_at: now,
        }
    }

    /// Derived: true iff a hash is present and non-empty.
    pub fn is_set(&self) -> bool {
        self.pin_hash.as_deref().is_some_and(|h| !h.is_empty())
    }
}

/// An encrypted file stored in a vault.
///
/// The envelope keeps salt, nonce and ciphertext together; the plaintext
/// never touches the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileRecord {
    pub id: FileId,
    pub vault_id: VaultId,
    pub uploaded_by: UserId,
    pub file_name: String,
    pub original_name: String,
    pub mime_type: String,
    /// Plaintext size in bytes, recorded at upload.
    pub file_size: u64,
    pub envelope: Envelope,
    pub tags: Vec<String>,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

/// One append-only audit log entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub vault_id: VaultId,
    pub user_id: UserId,
    pub action: AuditAction,
    pub details: String,
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vault(opened_at: Option<DateTime<Utc>>, duration_minutes: u32) -> VaultRecord {
        let now = Utc::now();
        VaultRecord {
            id: VaultId::new("v1").unwrap(),
            name: "Test".to_string(),
            description: String::new(),
            admin_id: UserId::new("admin").unwrap(),
            member_ids: vec![UserId::new("admin").unwrap(), UserId::new("bob").unwrap()],
            opened_at,
            unlock_duration_minutes: duration_minutes,
            is_active: true,
            created_at: now,
            modified_at: now,
        }
    }

    #[test]
    fn test_locked_when_never_opened() {
        let v = vault(None, 10);
        assert!(!v.is_unlocked(Utc::now()));
        assert_eq!(v.remaining_unlock_time(Utc::now()), Duration::zero());
    }

    #[test]
    fn test_unlocked_inside_window() {
        let opened = Utc::now();
        let v = vault(Some(opened), 10);

        assert!(v.is_unlocked(opened + Duration::minutes(9)));
        assert!(!v.is_unlocked(opened + Duration::minutes(10)));
        assert!(!v.is_unlocked(opened + Duration::minutes(11)));
    }

    #[test]
    fn test_remaining_time_decreases_to_zero() {
        let opened = Utc::now();
        let v = vault(Some(opened), 10);

        let at_start = v.remaining_unlock_time(opened);
        let midway = v.remaining_unlock_time(opened + Duration::minutes(4));
        let at_deadline = v.remaining_unlock_time(opened + Duration::minutes(10));
        let after = v.remaining_unlock_time(opened + Duration::minutes(11));

        assert_eq!(at_start, Duration::minutes(10));
        assert!(midway < at_start);
        assert_eq!(at_deadline, Duration::zero());
        assert_eq!(after, Duration::zero());
    }

    #[test]
    fn test_pin_record_is_set() {
        let now = Utc::now();
        let mut pin = PinRecord::unset(
            VaultId::new("v1").unwrap(),
            UserId::new("bob").unwrap(),
            now,
        );
        assert!(!pin.is_set());

        pin.pin_hash = Some(String::new());
        assert!(!pin.is_set());

        pin.pin_hash = Some("$argon2id$...".to_string());
        assert!(pin.is_set());
    }

    #[test]
    fn test_audit_action_serde_roundtrip() {
        let json = serde_json::to_string(&AuditAction::PinEnter).unwrap();
        let back: AuditAction = serde_json::from_str(&json).unwrap();
        assert_eq!(back, AuditAction::PinEnter);
    }
}
