//! In-memory vault store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::RwLock;

use crate::records::{FileRecord, HistoryEntry, PinRecord, VaultRecord};
use crate::store::VaultStore;
use quorumvault_common::{Error, FileId, Result, UserId, VaultId};

/// In-memory vault store.
///
/// Useful for testing and development. All data is stored in memory and
/// lost on drop. The unlock transition is decided under the vault map's
/// write lock, which gives the required single-writer discipline.
pub struct MemoryStore {
    vaults: RwLock<HashMap<VaultId, VaultRecord>>,
    pins: RwLock<HashMap<(VaultId, UserId), PinRecord>>,
    files: RwLock<HashMap<(VaultId, FileId), FileRecord>>,
    history: RwLock<Vec<HistoryEntry>>,
}

impl MemoryStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self {
            vaults: RwLock::new(HashMap::new()),
            pins: RwLock::new(HashMap::new()),
            files: RwLock::new(HashMap::new()),
            history: RwLock::new(Vec::new()),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VaultStore for MemoryStore {
    async fn insert_vault(&self, vault: VaultRecord) -> Result<()> {
        let mut vaults = self.vaults.write().unwrap();
        if vaults.contains_key(&vault.id) {
            return Err(Error::Storage(format!(
                "Vault already exists: {}",
                vault.id
            )));
        }
        vaults.insert(vault.id.clone(), vault);
        Ok(())
    }

    async fn vault(&self, id: &VaultId) -> Result<VaultRecord> {
        self.vaults
            .read()
            .unwrap()
            .get(id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("Vault not found: {}", id)))
    }

    async fn update_vault(&self, vault: VaultRecord) -> Result<()> {
        let mut vaults = self.vaults.write().unwrap();
        if !vaults.contains_key(&vault.id) {
            return Err(Error::NotFound(format!("Vault not found: {}", vault.id)));
        }
        vaults.insert(vault.id.clone(), vault);
        Ok(())
    }

    async fn vaults_for_user(&self, user: &UserId) -> Result<Vec<VaultRecord>> {
        Ok(self
            .vaults
            .read()
            .unwrap()
            .values()
            .filter(|v| v.is_member(user))
            .cloned()
            .collect())
    }

    async fn try_open(&self, id: &VaultId, opened_at_ts: DateTime<Utc>) -> Result<bool> {
        let mut vaults = self.vaults.write().unwrap();
        let vault = vaults
            .get_mut(id)
            .ok_or_else(|| Error::NotFound(format!("Vault not found: {}", id)))?;

        if vault.is_unlocked(opened_at_ts) {
            return Ok(false);
        }

        vault.opened_at = Some(opened_at_ts);
        vault.modified_at = opened_at_ts;
        Ok(true)
    }

    async fn clear_opened(&self, id: &VaultId) -> Result<()> {
        let mut vaults = self.vaults.write().unwrap();
        let vault = vaults
            .get_mut(id)
            .ok_or_else(|| Error::NotFound(format!("Vault not found: {}", id)))?;

        vault.opened_at = None;
        vault.modified_at = Utc::now();
        Ok(())
    }

    async fn upsert_pin(&self, pin: PinRecord) -> Result<()> {
        self.pins
            .write()
            .unwrap()
            .insert((pin.vault_id.clone(), pin.user_id.clone()), pin);
        Ok(())
    }

    async fn pin(&self, vault_id: &VaultId, user_id: &UserId) -> Result<Option<PinRecord>> {
        Ok(self
            .pins
            .read()
            .unwrap()
            .get(&(vault_id.clone(), user_id.clone()))
            .cloned())
    }

    async fn delete_pin(&self, vault_id: &VaultId, user_id: &UserId) -> Result<()> {
        self.pins
            .write()
            .unwrap()
            .remove(&(vault_id.clone(), user_id.clone()));
        Ok(())
    }

    async fn pins_for_vault(&self, vault_id: &VaultId) -> Result<Vec<PinRecord>> {
        Ok(self
            .pins
            .read()
            .unwrap()
            .values()
            .filter(|p| p.vault_id == *vault_id)
            .cloned()
            .collect())
    }

    async fn insert_file(&self, file: FileRecord) -> Result<()> {
        let mut files = self.files.write().unwrap();
        let key = (file.vault_id.clone(), file.id.clone());
        if files.contains_key(&key) {
            return Err(Error::Storage(format!("File already exists: {}", file.id)));
        }
        files.insert(key, file);
        Ok(())
    }

    async fn file(&self, vault_id: &VaultId, id: &FileId) -> Result<FileRecord> {
        self.files
            .read()
            .unwrap()
            .get(&(vault_id.clone(), id.clone()))
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("File not found: {}", id)))
    }

    async fn update_file(&self, file: FileRecord) -> Result<()> {
        let mut files = self.files.write().unwrap();
        let key = (file.vault_id.clone(), file.id.clone());
        if !files.contains_key(&key) {
            return Err(Error::NotFound(format!("File not found: {}", file.id)));
        }
        files.insert(key, file);
        Ok(())
    }

    async fn delete_file(&self, vault_id: &VaultId, id: &FileId) -> Result<()> {
        let mut files = self.files.write().unwrap();
        files
            .remove(&(vault_id.clone(), id.clone()))
            .ok_or_else(|| Error::NotFound(format!("File not found: {}", id)))?;
        Ok(())
    }

    async fn files_for_vault(&self, vault_id: &VaultId) -> Result<Vec<FileRecord>> {
        Ok(self
            .files
            .read()
            .unwrap()
            .values()
            .filter(|f| f.vault_id == *vault_id)
            .cloned()
            .collect())
    }

    async fn append_history(&self, entry: HistoryEntry) -> Result<()> {
        self.history.write().unwrap().push(entry);
        Ok(())
    }

    async fn history_for_vault(&self, vault_id: &VaultId) -> Result<Vec<HistoryEntry>> {
        let mut entries: Vec<HistoryEntry> = self
            .history
            .read()
            .unwrap()
            .iter()
            .filter(|e| e.vault_id == *vault_id)
            .cloned()
            .collect();
        entries.sort_by_key(|e| e.timestamp);
        Ok(entries)
    }
}
