//! Uniqueness fingerprints for encrypted identifier fields
//!
//! The field cipher is deliberately non-deterministic (fresh nonce per
//! encryption), so a database unique constraint on the ciphertext column
//! can never detect a duplicate IBAN: two encryptions of the same value
//! share no bytes. The alternatives are storing identifiers in plaintext
//! (security regression) or switching the whole field to deterministic
//! encryption (cryptographic regression). Instead, every sensitive field
//! also gets a deterministic keyed HMAC-SHA256 fingerprint; uniqueness and
//! lookup-by-identifier run against the fingerprint column and nothing
//! else. The fingerprint never leaves this subsystem.

use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::keys::KEY_LEN;

type HmacSha256 = Hmac<Sha256>;

/// Hex length of a fingerprint token (SHA-256 output).
pub const FINGERPRINT_LEN: usize = 64;

/// Computes deterministic, one-way fingerprints under a secret that is
/// distinct from the cipher key.
#[derive(Clone)]
pub struct Fingerprinter {
    key: [u8; KEY_LEN],
}

impl Fingerprinter {
    pub fn new(key: &[u8; KEY_LEN]) -> Self {
        Self { key: *key }
    }

    /// Fingerprint a normalized plaintext identifier.
    ///
    /// Identical input always yields the identical 64-char hex token;
    /// without the secret, the token reveals nothing about the input.
    /// Callers must normalize first (the registry fingerprints the same
    /// form it encrypts).
    pub fn fingerprint(&self, plaintext: &str) -> String {
        let mut mac = HmacSha256::new_from_slice(&self.key)
            .expect("HMAC accepts any key length");
        mac.update(plaintext.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deterministic() {
        let fp = Fingerprinter::new(&[3u8; KEY_LEN]);
        assert_eq!(
            fp.fingerprint("AE070331234567890123456"),
            fp.fingerprint("AE070331234567890123456")
        );
    }

    #[test]
    fn test_fixed_length_hex() {
        let fp = Fingerprinter::new(&[3u8; KEY_LEN]);
        let token = fp.fingerprint("1015551234567");
        assert_eq!(token.len(), FINGERPRINT_LEN);
        assert!(token.bytes().all(|b| b.is_ascii_hexdigit()));
    }

    #[test]
    fn test_distinct_inputs_distinct_tokens() {
        let fp = Fingerprinter::new(&[3u8; KEY_LEN]);
        assert_ne!(
            fp.fingerprint("AE070331234567890123456"),
            fp.fingerprint("AE550021000000000123456")
        );
    }

    #[test]
    fn test_distinct_keys_distinct_tokens() {
        let a = Fingerprinter::new(&[3u8; KEY_LEN]);
        let b = Fingerprinter::new(&[4u8; KEY_LEN]);
        assert_ne!(a.fingerprint("same input"), b.fingerprint("same input"));
    }
}
