//! Cryptographic primitives for QuorumVault.
//!
//! This module provides:
//! - Key derivation using Argon2id
//! - Authenticated encryption using XChaCha20-Poly1305
//! - Password envelopes bundling salt, nonce and ciphertext
//! - Salted adaptive PIN hashing
//!
//! # Security Guarantees
//! - All key material is automatically zeroized on drop
//! - No plaintext, PIN or key material is ever logged
//! - Constant-time operations for sensitive comparisons
//! - Decryption failures never reveal whether the password or the data was bad

pub mod aead;
pub mod envelope;
pub mod kdf;
pub mod keys;
pub mod pin;

pub use envelope::{Envelope, PasswordVerifier, VerifiedEnvelope};
pub use kdf::{derive_key, derive_validation_key, KdfParams};
pub use keys::{MasterKey, Salt, ValidationKey, KEY_LENGTH};
pub use pin::{hash_pin, verify_pin, MIN_PIN_LENGTH};
