//! Password-based encryption envelopes.
//!
//! An [`Envelope`] bundles everything needed to decrypt a payload with the
//! right password: the KDF salt and parameters, the AEAD nonce and the
//! ciphertext. These fields always travel together; splitting them up makes
//! the payload unrecoverable.
//!
//! [`VerifiedEnvelope`] is the variant for client-held data. It carries an
//! additional password verifier derived in a second, independent KDF pass,
//! so a caller can cheaply reject a wrong password before paying for a full
//! decrypt. The verifier shares no material with the encryption key.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use blake2::digest::consts::U32;
use blake2::{Blake2b, Digest};
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;

use crate::aead::{self, NONCE_SIZE};
use crate::kdf::{derive_key, derive_validation_key, KdfParams};
use crate::keys::Salt;
use quorumvault_common::{Result, SensitiveBytes};

/// Self-contained encrypted payload: salt, KDF parameters, nonce and
/// ciphertext.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    /// Salt for the encryption-key derivation.
    pub salt: Salt,
    /// KDF cost parameters used at seal time.
    pub kdf_params: KdfParams,
    /// AEAD nonce, fresh per seal.
    pub nonce: [u8; NONCE_SIZE],
    /// Ciphertext with trailing authentication tag.
    pub ciphertext: Vec<u8>,
}

impl Envelope {
    /// Encrypt `plaintext` under `password`.
    ///
    /// # Postconditions
    /// - Salt and nonce are freshly generated; sealing the same plaintext
    ///   twice under the same password yields unrelated envelopes
    ///
    /// # Errors
    /// - Empty password or invalid KDF parameters
    pub fn seal(plaintext: &[u8], password: &[u8], params: &KdfParams) -> Result<Self> {
        let salt = Salt::generate();
        let key = derive_key(password, &salt, params)?;
        let nonce = aead::generate_nonce();
        let ciphertext = aead::encrypt(key.as_bytes(), &nonce, plaintext)?;

        Ok(Self {
            salt,
            kdf_params: params.clone(),
            nonce,
            ciphertext,
        })
    }

    /// Decrypt the envelope with `password`.
    ///
    /// # Errors
    /// - `Error::AuthenticationFailure` when the integrity check fails.
    ///   A wrong password and corrupted data produce the same error; the
    ///   caller cannot tell them apart.
    pub fn open(&self, password: &[u8]) -> Result<SensitiveBytes> {
        let key = derive_key(password, &self.salt, &self.kdf_params)?;
        let plaintext = aead::decrypt(key.as_bytes(), &self.nonce, &self.ciphertext)?;
        Ok(SensitiveBytes::new(plaintext))
    }
}

/// Stored material for cheap password checks.
///
/// Holds the Blake2b digest of a validation key derived with its own salt.
/// Knowing the digest reveals nothing about the encryption key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PasswordVerifier {
    /// Salt for the validation-key derivation. Independent of any
    /// encryption salt.
    pub salt: Salt,
    /// KDF cost parameters for the validation pass.
    pub kdf_params: KdfParams,
    /// Base64-encoded Blake2b-256 digest of the validation key.
    pub hash: String,
}

impl PasswordVerifier {
    /// Derive a verifier for `password` with a fresh salt.
    pub fn new(password: &[u8], params: &KdfParams) -> Result<Self> {
        let salt = Salt::generate();
        let digest = Self::digest(password, &salt, params)?;

        Ok(Self {
            salt,
            kdf_params: params.clone(),
            hash: URL_SAFE_NO_PAD.encode(digest),
        })
    }

    fn digest(password: &[u8], salt: &Salt, params: &KdfParams) -> Result<[u8; 32]> {
        let key = derive_validation_key(password, salt, params)?;

        let mut hasher = Blake2b::<U32>::new();
        hasher.update(key.as_bytes());

        let mut out = [0u8; 32];
        out.copy_from_slice(&hasher.finalize());
        Ok(out)
    }

    /// Check whether `password` matches this verifier.
    ///
    /// Comparison is constant-time. A malformed stored hash verifies as
    /// false rather than erroring.
    pub fn verify(&self, password: &[u8]) -> Result<bool> {
        let candidate = Self::digest(password, &self.salt, &self.kdf_params)?;

        let stored = match URL_SAFE_NO_PAD.decode(&self.hash) {
            Ok(bytes) if bytes.len() == candidate.len() => bytes,
            _ => return Ok(false),
        };

        Ok(candidate.ct_eq(stored.as_slice()).into())
    }
}

/// Envelope plus password verifier, for client-held data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifiedEnvelope {
    pub envelope: Envelope,
    pub verifier: PasswordVerifier,
}

impl VerifiedEnvelope {
    /// Encrypt `plaintext` under `password` and attach a verifier.
    pub fn seal(plaintext: &[u8], password: &[u8], params: &KdfParams) -> Result<Self> {
        Ok(Self {
            envelope: Envelope::seal(plaintext, password, params)?,
            verifier: PasswordVerifier::new(password, params)?,
        })
    }

    /// Cheap password check without attempting decryption.
    pub fn verify_password(&self, password: &[u8]) -> Result<bool> {
        self.verifier.verify(password)
    }

    /// Decrypt the payload. Authenticates in full regardless of the
    /// verifier; the verifier is an optimization, not the security boundary.
    pub fn open(&self, password: &[u8]) -> Result<SensitiveBytes> {
        self.envelope.open(password)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use quorumvault_common::Error;

    fn test_params() -> KdfParams {
        // Cheap parameters so tests stay fast; production presets live in kdf.rs.
        KdfParams {
            memory_cost: 1024,
            time_cost: 1,
            parallelism: 1,
        }
    }

    #[test]
    fn test_seal_open_roundtrip() {
        let params = test_params();
        let envelope = Envelope::seal(b"payload bytes", b"password", &params).unwrap();
        let plaintext = envelope.open(b"password").unwrap();

        assert_eq!(plaintext.as_bytes(), b"payload bytes");
    }

    #[test]
    fn test_open_wrong_password_is_authentication_failure() {
        let params = test_params();
        let envelope = Envelope::seal(b"payload", b"password", &params).unwrap();

        assert!(matches!(
            envelope.open(b"wrong"),
            Err(Error::AuthenticationFailure)
        ));
    }

    #[test]
    fn test_open_corrupted_is_authentication_failure() {
        let params = test_params();
        let mut envelope = Envelope::seal(b"payload", b"password", &params).unwrap();
        envelope.ciphertext[0] ^= 0xFF;

        // Same error as a wrong password; no comparison oracle.
        assert!(matches!(
            envelope.open(b"password"),
            Err(Error::AuthenticationFailure)
        ));
    }

    #[test]
    fn test_seal_empty_payload() {
        let params = test_params();
        let envelope = Envelope::seal(b"", b"password", &params).unwrap();
        let plaintext = envelope.open(b"password").unwrap();

        assert!(plaintext.is_empty());
    }

    #[test]
    fn test_fresh_salt_and_nonce_per_seal() {
        let params = test_params();
        let e1 = Envelope::seal(b"same", b"password", &params).unwrap();
        let e2 = Envelope::seal(b"same", b"password", &params).unwrap();

        assert_ne!(e1.salt, e2.salt);
        assert_ne!(e1.nonce, e2.nonce);
        assert_ne!(e1.ciphertext, e2.ciphertext);
    }

    #[test]
    fn test_envelope_serde_roundtrip() {
        let params = test_params();
        let envelope = Envelope::seal(b"payload", b"password", &params).unwrap();

        let json = serde_json::to_string(&envelope).unwrap();
        let restored: Envelope = serde_json::from_str(&json).unwrap();

        assert_eq!(restored.open(b"password").unwrap().as_bytes(), b"payload");
    }

    #[test]
    fn test_verified_envelope_password_check() {
        let params = test_params();
        let sealed = VerifiedEnvelope::seal(b"payload", b"password", &params).unwrap();

        assert!(sealed.verify_password(b"password").unwrap());
        assert!(!sealed.verify_password(b"wrong").unwrap());
        assert_eq!(sealed.open(b"password").unwrap().as_bytes(), b"payload");
    }

    #[test]
    fn test_verifier_independent_of_encryption_material() {
        let params = test_params();
        let sealed = VerifiedEnvelope::seal(b"payload", b"password", &params).unwrap();

        // Separate derivation salts back the independence claim.
        assert_ne!(sealed.envelope.salt, sealed.verifier.salt);
    }

    #[test]
    fn test_mangled_verifier_fails_closed() {
        let params = test_params();
        let mut sealed = VerifiedEnvelope::seal(b"payload", b"password", &params).unwrap();
        sealed.verifier.hash = "not-base64!!".to_string();

        assert!(!sealed.verify_password(b"password").unwrap());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(8))]

        #[test]
        fn prop_roundtrip_arbitrary_payloads(payload in proptest::collection::vec(any::<u8>(), 0..2048)) {
            let params = test_params();
            let envelope = Envelope::seal(&payload, b"prop-password", &params).unwrap();
            let plaintext = envelope.open(b"prop-password").unwrap();
            prop_assert_eq!(plaintext.as_bytes(), payload.as_slice());
        }
    }
}
