//! Vault store abstraction for QuorumVault.
//!
//! This module provides the persisted record shapes, a trait-based interface
//! to the backing document store, and an in-memory implementation.
//!
//! # Design Principles
//! - Store isolation: no quorum or crypto logic behind the trait
//! - Async operations: all store access is async
//! - Single-writer unlock: the Locked→Unlocked transition is a conditional
//!   update decided inside the store
//! - Unified error semantics: consistent error types across backends

pub mod memory;
pub mod records;
pub mod store;

pub use memory::MemoryStore;
pub use records::{AuditAction, FileRecord, HistoryEntry, PinRecord, VaultRecord};
pub use store::VaultStore;
