//! Authenticated encryption using XChaCha20-Poly1305.
//!
//! XChaCha20-Poly1305 provides both confidentiality and authenticity,
//! with a 24-byte nonce that is safe for random generation.
//!
//! The nonce is handled explicitly rather than prepended to the ciphertext:
//! the envelope layer persists salt, nonce and ciphertext as separate fields
//! that always travel together.

use chacha20poly1305::{
    aead::{generic_array::GenericArray, Aead, AeadCore, KeyInit, OsRng},
    XChaCha20Poly1305,
};

use crate::keys::KEY_LENGTH;
use quorumvault_common::{Error, Result};

/// Nonce size for XChaCha20-Poly1305 (24 bytes).
pub const NONCE_SIZE: usize = 24;

/// Authentication tag size (16 bytes).
pub const TAG_SIZE: usize = 16;

/// Generate a fresh random nonce.
pub fn generate_nonce() -> [u8; NONCE_SIZE] {
    let nonce = XChaCha20Poly1305::generate_nonce(&mut OsRng);
    let mut out = [0u8; NONCE_SIZE];
    out.copy_from_slice(&nonce);
    out
}

/// Encrypt plaintext using XChaCha20-Poly1305.
///
/// # Preconditions
/// - `key` must be exactly KEY_LENGTH bytes
/// - `nonce` must be fresh for this key; reuse breaks confidentiality
///
/// # Postconditions
/// - Returns ciphertext || tag
///
/// # Errors
/// - Returns error if key length is incorrect
/// - Returns error if encryption fails
pub fn encrypt(key: &[u8], nonce: &[u8; NONCE_SIZE], plaintext: &[u8]) -> Result<Vec<u8>> {
    if key.len() != KEY_LENGTH {
        return Err(Error::Crypto(format!(
            "Invalid key length: expected {}, got {}",
            KEY_LENGTH,
            key.len()
        )));
    }

    let cipher = XChaCha20Poly1305::new(GenericArray::from_slice(key));

    cipher
        .encrypt(GenericArray::from_slice(nonce), plaintext)
        .map_err(|e| Error::Crypto(format!("Encryption failed: {}", e)))
}

/// Decrypt ciphertext using XChaCha20-Poly1305.
///
/// # Preconditions
/// - `key` must be exactly KEY_LENGTH bytes
///
/// # Postconditions
/// - Returns the original plaintext
/// - Verifies the authentication tag before returning
///
/// # Errors
/// - Returns `Error::Crypto` if key length is incorrect
/// - Returns `Error::AuthenticationFailure` on any tag or format failure;
///   a wrong key and tampered data are indistinguishable
pub fn decrypt(key: &[u8], nonce: &[u8; NONCE_SIZE], ciphertext: &[u8]) -> Result<Vec<u8>> {
    if key.len() != KEY_LENGTH {
        return Err(Error::Crypto(format!(
            "Invalid key length: expected {}, got {}",
            KEY_LENGTH,
            key.len()
        )));
    }

    if ciphertext.len() < TAG_SIZE {
        return Err(Error::AuthenticationFailure);
    }

    let cipher = XChaCha20Poly1305::new(GenericArray::from_slice(key));

    cipher
        .decrypt(GenericArray::from_slice(nonce), ciphertext)
        .map_err(|_| Error::AuthenticationFailure)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encrypt_decrypt_roundtrip() {
        let key = [42u8; KEY_LENGTH];
        let nonce = generate_nonce();
        let plaintext = b"Hello, World!";

        let ciphertext = encrypt(&key, &nonce, plaintext).unwrap();
        let decrypted = decrypt(&key, &nonce, &ciphertext).unwrap();

        assert_eq!(decrypted, plaintext);
    }

    #[test]
    fn test_ciphertext_size() {
        let key = [42u8; KEY_LENGTH];
        let nonce = generate_nonce();
        let plaintext = b"Test message";

        let ciphertext = encrypt(&key, &nonce, plaintext).unwrap();

        assert_eq!(ciphertext.len(), plaintext.len() + TAG_SIZE);
    }

    #[test]
    fn test_wrong_key_fails_opaquely() {
        let key1 = [1u8; KEY_LENGTH];
        let key2 = [2u8; KEY_LENGTH];
        let nonce = generate_nonce();
        let plaintext = b"Secret data";

        let ciphertext = encrypt(&key1, &nonce, plaintext).unwrap();
        let result = decrypt(&key2, &nonce, &ciphertext);

        assert!(matches!(
            result,
            Err(quorumvault_common::Error::AuthenticationFailure)
        ));
    }

    #[test]
    fn test_tampered_ciphertext_fails_opaquely() {
        let key = [42u8; KEY_LENGTH];
        let nonce = generate_nonce();
        let plaintext = b"Important data";

        let mut ciphertext = encrypt(&key, &nonce, plaintext).unwrap();
        ciphertext[5] ^= 0xFF;

        let result = decrypt(&key, &nonce, &ciphertext);
        assert!(matches!(
            result,
            Err(quorumvault_common::Error::AuthenticationFailure)
        ));
    }

    #[test]
    fn test_truncated_ciphertext_fails_opaquely() {
        let key = [42u8; KEY_LENGTH];
        let nonce = generate_nonce();

        let result = decrypt(&key, &nonce, b"short");
        assert!(matches!(
            result,
            Err(quorumvault_common::Error::AuthenticationFailure)
        ));
    }

    #[test]
    fn test_invalid_key_length() {
        let short_key = [0u8; 16];
        let nonce = generate_nonce();

        assert!(encrypt(&short_key, &nonce, b"data").is_err());
    }

    #[test]
    fn test_empty_plaintext() {
        let key = [42u8; KEY_LENGTH];
        let nonce = generate_nonce();

        let ciphertext = encrypt(&key, &nonce, b"").unwrap();
        let decrypted = decrypt(&key, &nonce, &ciphertext).unwrap();

        assert!(decrypted.is_empty());
    }
}
