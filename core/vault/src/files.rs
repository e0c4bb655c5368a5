//! Encrypted file operations.
//!
//! Payloads pass through the envelope on the way in and out; the store only
//! ever sees ciphertext. Upload, listing and reads require the vault to be
//! inside its unlock window; deletion only requires uploader-or-admin
//! rights.

use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info};

use crate::access::{
    ensure_active, ensure_member, ensure_unlocked, ensure_uploader_or_admin,
};
use crate::audit::AuditLogger;
use quorumvault_common::{FileId, Result, SensitiveBytes, UserId, VaultId};
use quorumvault_crypto::{Envelope, KdfParams};
use quorumvault_storage::{AuditAction, FileRecord, VaultStore};

/// Caller-supplied metadata for an upload.
#[derive(Debug, Clone)]
pub struct FileUpload {
    pub file_name: String,
    pub original_name: String,
    pub mime_type: String,
    pub tags: Vec<String>,
    pub description: String,
}

/// Metadata changes for an existing file. `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct FileChanges {
    pub file_name: Option<String>,
    pub tags: Option<Vec<String>>,
    pub description: Option<String>,
}

/// Listing view of a stored file; never carries the envelope.
#[derive(Debug, Clone, serde::Serialize)]
pub struct FileMetadata {
    pub id: FileId,
    pub vault_id: VaultId,
    pub uploaded_by: UserId,
    pub file_name: String,
    pub original_name: String,
    pub mime_type: String,
    pub file_size: u64,
    pub tags: Vec<String>,
    pub description: String,
    pub created_at: chrono::DateTime<Utc>,
    pub modified_at: chrono::DateTime<Utc>,
}

impl From<&FileRecord> for FileMetadata {
    fn from(record: &FileRecord) -> Self {
        Self {
            id: record.id.clone(),
            vault_id: record.vault_id.clone(),
            uploaded_by: record.uploaded_by.clone(),
            file_name: record.file_name.clone(),
            original_name: record.original_name.clone(),
            mime_type: record.mime_type.clone(),
            file_size: record.file_size,
            tags: record.tags.clone(),
            description: record.description.clone(),
            created_at: record.created_at,
            modified_at: record.modified_at,
        }
    }
}

/// Encrypted file operations over an unlocked vault.
pub struct FileOperations {
    store: Arc<dyn VaultStore>,
    audit: AuditLogger,
    kdf_params: KdfParams,
}

impl FileOperations {
    /// Create a handler with the default KDF cost.
    pub fn new(store: Arc<dyn VaultStore>, audit: AuditLogger) -> Self {
        Self::with_params(store, audit, KdfParams::default())
    }

    /// Create a handler with explicit KDF cost parameters.
    pub fn with_params(
        store: Arc<dyn VaultStore>,
        audit: AuditLogger,
        kdf_params: KdfParams,
    ) -> Self {
        Self {
            store,
            audit,
            kdf_params,
        }
    }

    /// Encrypt and store a payload.
    ///
    /// # Preconditions
    /// - Caller is a member and the vault is currently Unlocked
    ///
    /// # Postconditions
    /// - The stored record carries the full envelope (salt, nonce,
    ///   ciphertext) and one `FileUpload` entry is appended
    ///
    /// # Errors
    /// - `Unauthorized` when the caller is not a member or the vault is
    ///   locked
    pub async fn upload_file(
        &self,
        vault_id: &VaultId,
        acting: &UserId,
        data: &[u8],
        meta: FileUpload,
        password: &[u8],
    ) -> Result<FileMetadata> {
        let vault = self.store.vault(vault_id).await?;
        ensure_active(&vault)?;
        ensure_member(&vault, acting)?;
        ensure_unlocked(&vault, Utc::now())?;

        let envelope = Envelope::seal(data, password, &self.kdf_params)?;

        let now = Utc::now();
        let record = FileRecord {
            id: FileId::generate(),
            vault_id: vault_id.clone(),
            uploaded_by: acting.clone(),
            file_name: meta.file_name,
            original_name: meta.original_name,
            mime_type: meta.mime_type,
            file_size: data.len() as u64,
            envelope,
            tags: meta.tags,
            description: meta.description,
            created_at: now,
            modified_at: now,
        };
        self.store.insert_file(record.clone()).await?;

        self.audit
            .record(
                vault_id,
                acting,
                AuditAction::FileUpload,
                format!("Uploaded '{}'", record.file_name),
            )
            .await;

        info!(
            vault_id = %vault_id,
            file_id = %record.id,
            size = record.file_size,
            "File uploaded"
        );
        Ok(FileMetadata::from(&record))
    }

    /// Decrypt and return a stored payload.
    ///
    /// # Errors
    /// - `Unauthorized` when the caller is not a member or the vault is
    ///   locked
    /// - `AuthenticationFailure` when the password is wrong or the stored
    ///   envelope is corrupted; indistinguishable by design
    pub async fn download_file(
        &self,
        vault_id: &VaultId,
        file_id: &FileId,
        acting: &UserId,
        password: &[u8],
    ) -> Result<SensitiveBytes> {
        let vault = self.store.vault(vault_id).await?;
        ensure_active(&vault)?;
        ensure_member(&vault, acting)?;
        ensure_unlocked(&vault, Utc::now())?;

        let record = self.store.file(vault_id, file_id).await?;
        let plaintext = record.envelope.open(password)?;

        self.audit
            .record(
                vault_id,
                acting,
                AuditAction::FileView,
                format!("Viewed '{}'", record.file_name),
            )
            .await;

        debug!(vault_id = %vault_id, file_id = %file_id, "File decrypted");
        Ok(plaintext)
    }

    /// Metadata of every file in the vault, member only, vault Unlocked.
    pub async fn list_files(
        &self,
        vault_id: &VaultId,
        acting: &UserId,
    ) -> Result<Vec<FileMetadata>> {
        let vault = self.store.vault(vault_id).await?;
        ensure_active(&vault)?;
        ensure_member(&vault, acting)?;
        ensure_unlocked(&vault, Utc::now())?;

        let mut files = self.store.files_for_vault(vault_id).await?;
        files.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(files.iter().map(FileMetadata::from).collect())
    }

    /// Edit file metadata, uploader or admin only, vault Unlocked.
    pub async fn update_file(
        &self,
        vault_id: &VaultId,
        file_id: &FileId,
        acting: &UserId,
        changes: FileChanges,
    ) -> Result<FileMetadata> {
        let vault = self.store.vault(vault_id).await?;
        ensure_active(&vault)?;
        ensure_member(&vault, acting)?;
        ensure_unlocked(&vault, Utc::now())?;

        let mut record = self.store.file(vault_id, file_id).await?;
        ensure_uploader_or_admin(&vault, &record.uploaded_by, acting)?;

        if let Some(file_name) = changes.file_name {
            record.file_name = file_name;
        }
        if let Some(tags) = changes.tags {
            record.tags = tags;
        }
        if let Some(description) = changes.description {
            record.description = description;
        }
        record.modified_at = Utc::now();
        self.store.update_file(record.clone()).await?;

        self.audit
            .record(
                vault_id,
                acting,
                AuditAction::FileEdit,
                format!("Edited '{}'", record.file_name),
            )
            .await;

        Ok(FileMetadata::from(&record))
    }

    /// Delete a file, uploader or admin only.
    ///
    /// Deletion does not require an unlock window; it removes ciphertext,
    /// never exposes plaintext.
    pub async fn delete_file(
        &self,
        vault_id: &VaultId,
        file_id: &FileId,
        acting: &UserId,
    ) -> Result<()> {
        let vault = self.store.vault(vault_id).await?;
        ensure_active(&vault)?;
        ensure_member(&vault, acting)?;

        let record = self.store.file(vault_id, file_id).await?;
        ensure_uploader_or_admin(&vault, &record.uploaded_by, acting)?;

        self.store.delete_file(vault_id, file_id).await?;

        self.audit
            .record(
                vault_id,
                acting,
                AuditAction::FileDelete,
                format!("Deleted '{}'", record.file_name),
            )
            .await;

        info!(vault_id = %vault_id, file_id = %file_id, "File deleted");
        Ok(())
    }
}
