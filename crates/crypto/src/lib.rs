//! BankReg Crypto - Field-level protection for sensitive identifiers
//!
//! Two cooperating codecs sit at the persistence boundary:
//! - `FieldCipher`: AES-256-GCM, non-deterministic, tamper-evident
//! - `Fingerprinter`: deterministic keyed HMAC so uniqueness checks work
//!   without plaintext or deterministic encryption
//!
//! Both are keyed from `KeyMaterial`, supplied by the environment at
//! startup and injected explicitly (tests pass fixed keys).

pub mod cipher;
pub mod fingerprint;
pub mod keys;

pub use cipher::{CipherError, FieldCipher, NONCE_LEN, TAG_LEN};
pub use fingerprint::{Fingerprinter, FINGERPRINT_LEN};
pub use keys::{KeyError, KeyMaterial, CIPHER_KEY_ENV, FINGERPRINT_KEY_ENV, KEY_LEN};
