//! Append-only audit logging.
//!
//! Audit is best-effort by design: a failed append is logged and swallowed,
//! never allowed to abort or roll back the operation being audited. The one
//! exception lives in the unlock coordinator, where a `PinEnter` append is
//! the primary state change and goes through the store directly.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::warn;

use crate::access::ensure_member;
use quorumvault_common::{Result, UserId, VaultId};
use quorumvault_storage::{AuditAction, HistoryEntry, VaultRecord, VaultStore};

/// Best-effort writer for the vault history log.
#[derive(Clone)]
pub struct AuditLogger {
    store: Arc<dyn VaultStore>,
}

impl AuditLogger {
    /// Create a logger over the given store.
    pub fn new(store: Arc<dyn VaultStore>) -> Self {
        Self { store }
    }

    /// Append one entry stamped with the current time.
    pub async fn record(
        &self,
        vault_id: &VaultId,
        user_id: &UserId,
        action: AuditAction,
        details: impl Into<String>,
    ) {
        self.record_at(Utc::now(), vault_id, user_id, action, details)
            .await;
    }

    /// Append one entry with an explicit timestamp.
    ///
    /// Failures are reported via `warn!` and swallowed.
    pub async fn record_at(
        &self,
        timestamp: DateTime<Utc>,
        vault_id: &VaultId,
        user_id: &UserId,
        action: AuditAction,
        details: impl Into<String>,
    ) {
        let entry = HistoryEntry {
            vault_id: vault_id.clone(),
            user_id: user_id.clone(),
            action,
            details: details.into(),
            timestamp,
        };

        if let Err(e) = self.store.append_history(entry).await {
            warn!(vault_id = %vault_id, ?action, error = %e, "Audit append failed");
        }
    }

    /// Ordered history of a vault, readable by its members.
    pub async fn history(
        &self,
        vault: &VaultRecord,
        acting: &UserId,
    ) -> Result<Vec<HistoryEntry>> {
        ensure_member(vault, acting)?;
        self.store.history_for_vault(&vault.id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Duration;
    use quorumvault_common::{Error, FileId};
    use quorumvault_storage::{FileRecord, MemoryStore, PinRecord};

    fn vault_record() -> VaultRecord {
        let now = Utc::now();
        VaultRecord {
            id: VaultId::new("v1").unwrap(),
            name: "Test".to_string(),
            description: String::new(),
            admin_id: UserId::new("admin").unwrap(),
            member_ids: vec![UserId::new("admin").unwrap()],
            opened_at: None,
            unlock_duration_minutes: 10,
            is_active: true,
            created_at: now,
            modified_at: now,
        }
    }

    #[tokio::test]
    async fn test_record_appends_entry() {
        let store = Arc::new(MemoryStore::new());
        let logger = AuditLogger::new(store.clone());
        let vault = vault_record();
        store.insert_vault(vault.clone()).await.unwrap();

        logger
            .record(&vault.id, &vault.admin_id, AuditAction::VaultCreate, "created")
            .await;

        let entries = store.history_for_vault(&vault.id).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].action, AuditAction::VaultCreate);
    }

    #[tokio::test]
    async fn test_member_reads_ordered_history() {
        let store = Arc::new(MemoryStore::new());
        let logger = AuditLogger::new(store.clone());
        let vault = vault_record();
        store.insert_vault(vault.clone()).await.unwrap();

        logger
            .record(&vault.id, &vault.admin_id, AuditAction::VaultCreate, "created")
            .await;
        logger
            .record(&vault.id, &vault.admin_id, AuditAction::PinSet, "PIN for admin")
            .await;

        let entries = logger.history(&vault, &vault.admin_id).await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].action, AuditAction::VaultCreate);
        assert_eq!(entries[1].action, AuditAction::PinSet);
    }

    #[tokio::test]
    async fn test_history_requires_membership() {
        let store = Arc::new(MemoryStore::new());
        let logger = AuditLogger::new(store.clone());
        let vault = vault_record();

        let outsider = UserId::new("mallory").unwrap();
        let result = logger.history(&vault, &outsider).await;
        assert!(matches!(result, Err(Error::Unauthorized(_))));
    }

    #[tokio::test]
    async fn test_record_at_preserves_timestamp() {
        let store = Arc::new(MemoryStore::new());
        let logger = AuditLogger::new(store.clone());
        let vault = vault_record();
        let ts = Utc::now() - Duration::minutes(3);

        logger
            .record_at(ts, &vault.id, &vault.admin_id, AuditAction::PinEnter, "")
            .await;

        let entries = store.history_for_vault(&vault.id).await.unwrap();
        assert_eq!(entries[0].timestamp, ts);
    }

    /// Store whose history append always fails.
    struct FailingStore(MemoryStore);

    #[async_trait]
    impl VaultStore for FailingStore {
        async fn insert_vault(&self, vault: VaultRecord) -> quorumvault_common::Result<()> {
            self.0.insert_vault(vault).await
        }
        async fn vault(&self, id: &VaultId) -> quorumvault_common::Result<VaultRecord> {
            self.0.vault(id).await
        }
        async fn update_vault(&self, vault: VaultRecord) -> quorumvault_common::Result<()> {
            self.0.update_vault(vault).await
        }
        async fn vaults_for_user(
            &self,
            user: &UserId,
        ) -> quorumvault_common::Result<Vec<VaultRecord>> {
            self.0.vaults_for_user(user).await
        }
        async fn try_open(
            &self,
            id: &VaultId,
            ts: DateTime<Utc>,
        ) -> quorumvault_common::Result<bool> {
            self.0.try_open(id, ts).await
        }
        async fn clear_opened(&self, id: &VaultId) -> quorumvault_common::Result<()> {
            self.0.clear_opened(id).await
        }
        async fn upsert_pin(&self, pin: PinRecord) -> quorumvault_common::Result<()> {
            self.0.upsert_pin(pin).await
        }
        async fn pin(
            &self,
            vault_id: &VaultId,
            user_id: &UserId,
        ) -> quorumvault_common::Result<Option<PinRecord>> {
            self.0.pin(vault_id, user_id).await
        }
        async fn delete_pin(
            &self,
            vault_id: &VaultId,
            user_id: &UserId,
        ) -> quorumvault_common::Result<()> {
            self.0.delete_pin(vault_id, user_id).await
        }
        async fn pins_for_vault(
            &self,
            vault_id: &VaultId,
        ) -> quorumvault_common::Result<Vec<PinRecord>> {
            self.0.pins_for_vault(vault_id).await
        }
        async fn insert_file(&self, file: FileRecord) -> quorumvault_common::Result<()> {
            self.0.insert_file(file).await
        }
        async fn file(
            &self,
            vault_id: &VaultId,
            id: &FileId,
        ) -> quorumvault_common::Result<FileRecord> {
            self.0.file(vault_id, id).await
        }
        async fn update_file(&self, file: FileRecord) -> quorumvault_common::Result<()> {
            self.0.update_file(file).await
        }
        async fn delete_file(
            &self,
            vault_id: &VaultId,
            id: &FileId,
        ) -> quorumvault_common::Result<()> {
            self.0.delete_file(vault_id, id).await
        }
        async fn files_for_vault(
            &self,
            vault_id: &VaultId,
        ) -> quorumvault_common::Result<Vec<FileRecord>> {
            self.0.files_for_vault(vault_id).await
        }
        async fn append_history(&self, _entry: HistoryEntry) -> quorumvault_common::Result<()> {
            Err(Error::Storage("history is on fire".to_string()))
        }
        async fn history_for_vault(
            &self,
            vault_id: &VaultId,
        ) -> quorumvault_common::Result<Vec<HistoryEntry>> {
            self.0.history_for_vault(vault_id).await
        }
    }

    #[tokio::test]
    async fn test_append_failure_is_swallowed() {
        let store = Arc::new(FailingStore(MemoryStore::new()));
        let logger = AuditLogger::new(store.clone());
        let vault = vault_record();

        // Must not panic or error; the failure is logged and dropped.
        logger
            .record(&vault.id, &vault.admin_id, AuditAction::VaultCreate, "created")
            .await;
    }
}
