//! Key material for the field cipher and the fingerprinter
//!
//! Both secrets arrive from the deployment environment at process start and
//! are injected into the constructors that need them. There is no default
//! key: a production process without keys must refuse to start, not fall
//! back to something embedded in the binary.

use std::fmt;
use thiserror::Error;

/// Byte length of each secret (256 bits).
pub const KEY_LEN: usize = 32;

/// Environment variable holding the hex-encoded AES-256 field key.
pub const CIPHER_KEY_ENV: &str = "BANKREG_CIPHER_KEY";

/// Environment variable holding the hex-encoded HMAC fingerprint secret.
pub const FINGERPRINT_KEY_ENV: &str = "BANKREG_FINGERPRINT_KEY";

/// Errors loading key material.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KeyError {
    #[error("missing required key in environment variable {var}")]
    Missing { var: &'static str },

    #[error("key in {var} must be {expected} hex characters")]
    BadEncoding { var: &'static str, expected: usize },

    #[error("cipher key and fingerprint key must be distinct secrets")]
    NotDistinct,
}

/// The two process-wide secrets, loaded once at startup.
///
/// The fingerprint secret must differ from the cipher key: the fingerprint
/// is stored in an indexed column, so deriving it from the encryption key
/// would let an index leak weaken the cipher.
#[derive(Clone)]
pub struct KeyMaterial {
    cipher_key: [u8; KEY_LEN],
    fingerprint_key: [u8; KEY_LEN],
}

impl KeyMaterial {
    /// Load both keys from the environment. Fails fast if either variable
    /// is absent or malformed.
    pub fn from_env() -> Result<Self, KeyError> {
        let cipher_hex = std::env::var(CIPHER_KEY_ENV).map_err(|_| KeyError::Missing {
            var: CIPHER_KEY_ENV,
        })?;
        let fingerprint_hex =
            std::env::var(FINGERPRINT_KEY_ENV).map_err(|_| KeyError::Missing {
                var: FINGERPRINT_KEY_ENV,
            })?;
        Self::from_hex(&cipher_hex, &fingerprint_hex)
    }

    /// Build key material from hex strings (config files, tests).
    pub fn from_hex(cipher_hex: &str, fingerprint_hex: &str) -> Result<Self, KeyError> {
        let cipher_key = decode_key(cipher_hex, CIPHER_KEY_ENV)?;
        let fingerprint_key = decode_key(fingerprint_hex, FINGERPRINT_KEY_ENV)?;
        if cipher_key == fingerprint_key {
            return Err(KeyError::NotDistinct);
        }
        Ok(Self {
            cipher_key,
            fingerprint_key,
        })
    }

    pub fn cipher_key(&self) -> &[u8; KEY_LEN] {
        &self.cipher_key
    }

    pub fn fingerprint_key(&self) -> &[u8; KEY_LEN] {
        &self.fingerprint_key
    }
}

// Keys must never end up in logs or panic messages.
impl fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("KeyMaterial(<redacted>)")
    }
}

fn decode_key(hex_str: &str, var: &'static str) -> Result<[u8; KEY_LEN], KeyError> {
    let bytes = hex::decode(hex_str.trim()).map_err(|_| KeyError::BadEncoding {
        var,
        expected: KEY_LEN * 2,
    })?;
    let arr: [u8; KEY_LEN] = bytes.try_into().map_err(|_| KeyError::BadEncoding {
        var,
        expected: KEY_LEN * 2,
    })?;
    Ok(arr)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CIPHER_HEX: &str =
        "000102030405060708090a0b0c0d0e0f101112131415161718191a1b1c1d1e1f";
    const FP_HEX: &str =
        "202122232425262728292a2b2c2d2e2f303132333435363738393a3b3c3d3e3f";

    #[test]
    fn test_from_hex() {
        let keys = KeyMaterial::from_hex(CIPHER_HEX, FP_HEX).unwrap();
        assert_eq!(keys.cipher_key()[0], 0x00);
        assert_eq!(keys.fingerprint_key()[0], 0x20);
    }

    #[test]
    fn test_rejects_short_key() {
        assert_eq!(
            KeyMaterial::from_hex("aabb", FP_HEX).unwrap_err(),
            KeyError::BadEncoding {
                var: CIPHER_KEY_ENV,
                expected: 64
            }
        );
    }

    #[test]
    fn test_rejects_non_hex() {
        assert!(matches!(
            KeyMaterial::from_hex(&"zz".repeat(32), FP_HEX),
            Err(KeyError::BadEncoding { .. })
        ));
    }

    #[test]
    fn test_rejects_identical_keys() {
        assert_eq!(
            KeyMaterial::from_hex(CIPHER_HEX, CIPHER_HEX).unwrap_err(),
            KeyError::NotDistinct
        );
    }

    // Env vars are process-global, so every from_env scenario lives in
    // this one test rather than racing across the harness threads.
    #[test]
    fn test_from_env_fails_fast_without_keys() {
        std::env::remove_var(CIPHER_KEY_ENV);
        std::env::remove_var(FINGERPRINT_KEY_ENV);
        assert_eq!(
            KeyMaterial::from_env().unwrap_err(),
            KeyError::Missing {
                var: CIPHER_KEY_ENV
            }
        );

        std::env::set_var(CIPHER_KEY_ENV, CIPHER_HEX);
        assert_eq!(
            KeyMaterial::from_env().unwrap_err(),
            KeyError::Missing {
                var: FINGERPRINT_KEY_ENV
            }
        );

        std::env::set_var(FINGERPRINT_KEY_ENV, FP_HEX);
        let keys = KeyMaterial::from_env().unwrap();
        assert_eq!(keys.cipher_key()[0], 0x00);
        assert_eq!(keys.fingerprint_key()[0], 0x20);

        std::env::remove_var(CIPHER_KEY_ENV);
        std::env::remove_var(FINGERPRINT_KEY_ENV);
    }

    #[test]
    fn test_debug_redacts() {
        let keys = KeyMaterial::from_hex(CIPHER_HEX, FP_HEX).unwrap();
        let rendered = format!("{:?}", keys);
        assert!(!rendered.contains("0001"));
        assert!(rendered.contains("redacted"));
    }
}
