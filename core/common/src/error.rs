//! Common error types for QuorumVault.

use thiserror::Error;

use crate::types::UserId;

/// Top-level error type for QuorumVault operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Caller is not a member, or not the admin where admin rights are required.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Vault, file, member or PIN record is absent.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Input failed validation (PIN too short, empty member list, duration < 1).
    #[error("Validation error: {0}")]
    Validation(String),

    /// One or more submitted PINs did not verify.
    #[error("Invalid PIN for member(s): {}", join_ids(.0))]
    InvalidPin(Vec<UserId>),

    /// One or more members have never set a PIN.
    #[error("PIN not set for member(s): {}", join_ids(.0))]
    MissingPin(Vec<UserId>),

    /// Decryption failed. Deliberately carries no detail: wrong password and
    /// corrupted data must be indistinguishable to the caller.
    #[error("Authentication failure")]
    AuthenticationFailure,

    /// Cryptographic operation failed for reasons other than authentication.
    #[error("Cryptographic error: {0}")]
    Crypto(String),

    /// Persistence-layer failure.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Serialization or deserialization failed.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

fn join_ids(ids: &[UserId]) -> String {
    ids.iter()
        .map(|id| id.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Result type alias using the common Error.
pub type Result<T> = std::result::Result<T, Error>;
