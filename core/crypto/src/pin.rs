//! Salted adaptive PIN hashing.
//!
//! PINs are hashed with Argon2id into PHC-format strings; the salt is fresh
//! per hash, so re-hashing the same PIN never produces the same string.
//! Verification fails closed: a malformed stored hash is treated as a
//! mismatch, never an error.

use argon2::password_hash::{
    rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier as _, SaltString,
};
use argon2::Argon2;

use quorumvault_common::{Error, Result};

/// Minimum accepted PIN length in characters.
///
/// Four characters is weak against brute force even behind an adaptive
/// hash; the limit is a policy floor, not a recommendation.
pub const MIN_PIN_LENGTH: usize = 4;

/// Hash a raw PIN into a PHC-format Argon2id string.
///
/// # Postconditions
/// - Output embeds a fresh random salt; repeated calls differ
///
/// # Errors
/// - Returns error if hashing fails
///
/// # Security
/// - The raw PIN is never stored or logged
pub fn hash_pin(pin: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);

    let hash = Argon2::default()
        .hash_password(pin.as_bytes(), &salt)
        .map_err(|e| Error::Crypto(format!("PIN hashing failed: {}", e)))?;

    Ok(hash.to_string())
}

/// Verify a candidate PIN against a stored PHC string.
///
/// Fails closed: returns false for a wrong PIN, an unparseable hash, or an
/// empty stored value. Never returns an error.
pub fn verify_pin(pin: &str, stored: &str) -> bool {
    match PasswordHash::new(stored) {
        Ok(parsed) => Argon2::default()
            .verify_password(pin.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_pin("1234").unwrap();

        assert!(verify_pin("1234", &hash));
        assert!(!verify_pin("4321", &hash));
    }

    #[test]
    fn test_fresh_salt_per_hash() {
        let h1 = hash_pin("1234").unwrap();
        let h2 = hash_pin("1234").unwrap();

        assert_ne!(h1, h2);
        assert!(verify_pin("1234", &h1));
        assert!(verify_pin("1234", &h2));
    }

    #[test]
    fn test_verify_fails_closed_on_garbage_hash() {
        assert!(!verify_pin("1234", "not-a-phc-string"));
        assert!(!verify_pin("1234", ""));
    }
}
