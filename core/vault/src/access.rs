//! Authorization guards shared by the vault services.
//!
//! Caller identity comes from the external identity provider and is trusted
//! as-is; these guards only decide what that identity may do to a vault.

use chrono::{DateTime, Utc};

use quorumvault_common::{Error, Result, UserId};
use quorumvault_storage::VaultRecord;

/// Reject operations on a deactivated vault.
pub(crate) fn ensure_active(vault: &VaultRecord) -> Result<()> {
    if !vault.is_active {
        return Err(Error::NotFound(format!("Vault is deactivated: {}", vault.id)));
    }
    Ok(())
}

/// Caller must be a current member.
pub(crate) fn ensure_member(vault: &VaultRecord, user: &UserId) -> Result<()> {
    if !vault.is_member(user) {
        return Err(Error::Unauthorized(format!(
            "{} is not a member of vault {}",
            user, vault.id
        )));
    }
    Ok(())
}

/// Caller must be the vault admin.
pub(crate) fn ensure_admin(vault: &VaultRecord, user: &UserId) -> Result<()> {
    if !vault.is_admin(user) {
        return Err(Error::Unauthorized(format!(
            "{} is not the admin of vault {}",
            user, vault.id
        )));
    }
    Ok(())
}

/// The vault must currently be inside its unlock window.
pub(crate) fn ensure_unlocked(vault: &VaultRecord, now: DateTime<Utc>) -> Result<()> {
    if !vault.is_unlocked(now) {
        return Err(Error::Unauthorized(format!("Vault is locked: {}", vault.id)));
    }
    Ok(())
}

/// Caller must be the uploader of the file or the vault admin.
pub(crate) fn ensure_uploader_or_admin(
    vault: &VaultRecord,
    uploader: &UserId,
    user: &UserId,
) -> Result<()> {
    if uploader != user && !vault.is_admin(user) {
        return Err(Error::Unauthorized(format!(
            "{} may not manage this file in vault {}",
            user, vault.id
        )));
    }
    Ok(())
}
