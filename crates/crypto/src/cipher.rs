//! Field cipher - AES-256-GCM over individual sensitive strings
//!
//! Each encryption draws a fresh random 96-bit nonce, so the same plaintext
//! encrypted twice yields different blobs (semantic security). The stored
//! blob is `nonce || ciphertext+tag`; the GCM tag makes tampering with a
//! stored blob a detectable integrity failure rather than silent garbage.

use aes_gcm::aead::{Aead, AeadCore, KeyInit, OsRng};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use thiserror::Error;

use crate::keys::KEY_LEN;

/// Byte length of the GCM nonce prefixed to every blob.
pub const NONCE_LEN: usize = 12;

/// Byte length of the GCM authentication tag appended to the ciphertext.
pub const TAG_LEN: usize = 16;

/// Errors from the field cipher.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CipherError {
    /// The blob is truncated, tampered with, or was encrypted under a
    /// different key. Callers must treat this as data corruption or key
    /// mismatch, never substitute a default value.
    #[error("field ciphertext failed integrity check")]
    Integrity,

    /// AEAD encryption itself failed. Should not happen for in-memory
    /// string input; surfaced rather than panicking.
    #[error("field encryption failed")]
    Encryption,
}

/// Transparent codec for sensitive string fields crossing the persistence
/// boundary.
#[derive(Clone)]
pub struct FieldCipher {
    cipher: Aes256Gcm,
}

impl FieldCipher {
    pub fn new(key: &[u8; KEY_LEN]) -> Self {
        Self {
            cipher: Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key)),
        }
    }

    /// Encrypt a plaintext field into a self-contained blob.
    ///
    /// An empty string is a legal plaintext and round-trips to an empty
    /// string; the blob is still nonce + tag sized, so "present but empty"
    /// stays distinguishable from an absent field.
    pub fn encrypt(&self, plaintext: &str) -> Result<Vec<u8>, CipherError> {
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let ciphertext = self
            .cipher
            .encrypt(&nonce, plaintext.as_bytes())
            .map_err(|_| CipherError::Encryption)?;

        let mut blob = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        blob.extend_from_slice(nonce.as_slice());
        blob.extend_from_slice(&ciphertext);
        Ok(blob)
    }

    /// Decrypt a blob produced by [`encrypt`](Self::encrypt).
    pub fn decrypt(&self, blob: &[u8]) -> Result<String, CipherError> {
        if blob.len() < NONCE_LEN + TAG_LEN {
            return Err(CipherError::Integrity);
        }
        let (nonce, ciphertext) = blob.split_at(NONCE_LEN);
        let plaintext = self
            .cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| CipherError::Integrity)?;
        String::from_utf8(plaintext).map_err(|_| CipherError::Integrity)
    }

    /// Optional-field variant: `None` stays `None`.
    pub fn encrypt_opt(&self, plaintext: Option<&str>) -> Result<Option<Vec<u8>>, CipherError> {
        plaintext.map(|p| self.encrypt(p)).transpose()
    }

    /// Optional-field variant: `None` stays `None`.
    pub fn decrypt_opt(&self, blob: Option<&[u8]>) -> Result<Option<String>, CipherError> {
        blob.map(|b| self.decrypt(b)).transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cipher() -> FieldCipher {
        FieldCipher::new(&[7u8; KEY_LEN])
    }

    #[test]
    fn test_round_trip() {
        let c = cipher();
        let blob = c.encrypt("AE070331234567890123456").unwrap();
        assert_eq!(c.decrypt(&blob).unwrap(), "AE070331234567890123456");
    }

    #[test]
    fn test_round_trip_empty_string() {
        let c = cipher();
        let blob = c.encrypt("").unwrap();
        assert_eq!(blob.len(), NONCE_LEN + TAG_LEN);
        assert_eq!(c.decrypt(&blob).unwrap(), "");
    }

    #[test]
    fn test_same_plaintext_distinct_blobs() {
        let c = cipher();
        let a = c.encrypt("1015551234567").unwrap();
        let b = c.encrypt("1015551234567").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_tampered_blob_fails_integrity() {
        let c = cipher();
        let mut blob = c.encrypt("1015551234567").unwrap();
        let last = blob.len() - 1;
        blob[last] ^= 0x01;
        assert_eq!(c.decrypt(&blob), Err(CipherError::Integrity));
    }

    #[test]
    fn test_truncated_blob_fails_integrity() {
        let c = cipher();
        let blob = c.encrypt("1015551234567").unwrap();
        assert_eq!(c.decrypt(&blob[..NONCE_LEN]), Err(CipherError::Integrity));
        assert_eq!(c.decrypt(&[]), Err(CipherError::Integrity));
    }

    #[test]
    fn test_wrong_key_fails_integrity() {
        let blob = cipher().encrypt("1015551234567").unwrap();
        let other = FieldCipher::new(&[8u8; KEY_LEN]);
        assert_eq!(other.decrypt(&blob), Err(CipherError::Integrity));
    }

    #[test]
    fn test_optional_none_passes_through() {
        let c = cipher();
        assert_eq!(c.encrypt_opt(None).unwrap(), None);
        assert_eq!(c.decrypt_opt(None).unwrap(), None);
    }

    #[test]
    fn test_optional_present_round_trips() {
        let c = cipher();
        let blob = c.encrypt_opt(Some("x")).unwrap().unwrap();
        assert_eq!(c.decrypt_opt(Some(&blob)).unwrap().as_deref(), Some("x"));
    }
}
