//! Vault store trait definition.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::records::{FileRecord, HistoryEntry, PinRecord, VaultRecord};
use quorumvault_common::{FileId, Result, UserId, VaultId};

/// Document-store boundary for vault, PIN, file and history records.
///
/// Implementations persist whole records; operations are short synchronous
/// units of work with no long-lived transactions. The one concurrency-
/// sensitive operation is [`VaultStore::try_open`], which must decide the
/// unlock transition atomically.
#[async_trait]
pub trait VaultStore: Send + Sync {
    /// Insert a new vault.
    ///
    /// # Errors
    /// - Vault id already present
    async fn insert_vault(&self, vault: VaultRecord) -> Result<()>;

    /// Fetch a vault by id.
    ///
    /// # Errors
    /// - Vault not found
    async fn vault(&self, id: &VaultId) -> Result<VaultRecord>;

    /// Replace an existing vault record.
    ///
    /// # Errors
    /// - Vault not found
    async fn update_vault(&self, vault: VaultRecord) -> Result<()>;

    /// List vaults where `user` is a current member. Ordering is not
    /// guaranteed.
    async fn vaults_for_user(&self, user: &UserId) -> Result<Vec<VaultRecord>>;

    /// Conditionally perform the Locked→Unlocked transition.
    ///
    /// Sets `opened_at = opened_at_ts` only if the vault is not currently
    /// unlocked at that instant (never opened, or the previous window has
    /// expired). Decided under a single writer so concurrent unlock attempts
    /// cannot both transition.
    ///
    /// # Returns
    /// `true` iff this call performed the transition.
    ///
    /// # Errors
    /// - Vault not found
    async fn try_open(&self, id: &VaultId, opened_at_ts: DateTime<Utc>) -> Result<bool>;

    /// Clear `opened_at`, returning the vault to Locked.
    ///
    /// # Errors
    /// - Vault not found
    async fn clear_opened(&self, id: &VaultId) -> Result<()>;

    /// Insert or replace the PIN record for `(vault_id, user_id)`.
    async fn upsert_pin(&self, pin: PinRecord) -> Result<()>;

    /// Fetch the PIN record for a member, `None` when the pair is unknown.
    async fn pin(&self, vault_id: &VaultId, user_id: &UserId) -> Result<Option<PinRecord>>;

    /// Delete the PIN record for a member. Deleting an absent record is not
    /// an error.
    async fn delete_pin(&self, vault_id: &VaultId, user_id: &UserId) -> Result<()>;

    /// All PIN records for a vault.
    async fn pins_for_vault(&self, vault_id: &VaultId) -> Result<Vec<PinRecord>>;

    /// Insert a new file record.
    ///
    /// # Errors
    /// - File id already present in this vault
    async fn insert_file(&self, file: FileRecord) -> Result<()>;

    /// Fetch a file record.
    ///
    /// # Errors
    /// - File not found in this vault
    async fn file(&self, vault_id: &VaultId, id: &FileId) -> Result<FileRecord>;

    /// Replace an existing file record.
    ///
    /// # Errors
    /// - File not found
    async fn update_file(&self, file: FileRecord) -> Result<()>;

    /// Delete a file record.
    ///
    /// # Errors
    /// - File not found
    async fn delete_file(&self, vault_id: &VaultId, id: &FileId) -> Result<()>;

    /// All file records for a vault.
    async fn files_for_vault(&self, vault_id: &VaultId) -> Result<Vec<FileRecord>>;

    /// Append one history entry. Entries are never mutated or removed.
    async fn append_history(&self, entry: HistoryEntry) -> Result<()>;

    /// All history entries for a vault in timestamp order.
    async fn history_for_vault(&self, vault_id: &VaultId) -> Result<Vec<HistoryEntry>>;
}
