//! SWIFT/BIC validation - structural check only
//!
//! Layout (ISO 9362): 4 letters institution + 2 letters country +
//! 2 alphanumeric location + optional 3 alphanumeric branch. There is no
//! checksum for BICs; shape is the whole check.

use thiserror::Error;

/// Rejection reason for a SWIFT/BIC candidate.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwiftError {
    #[error("SWIFT code must be 8 or 11 characters")]
    BadLength,

    #[error("SWIFT code does not match the BIC structure")]
    BadStructure,
}

/// Validate a SWIFT/BIC code and return its normalized (trimmed,
/// upper-cased) form.
///
/// # Examples
/// ```
/// use bankreg_core::swift::validate;
///
/// assert!(validate("EBILAEAD").is_ok());
/// assert!(validate("EBILAEADXXX").is_ok());
/// assert!(validate("EBILAEAD1").is_err());
/// ```
pub fn validate(raw: &str) -> Result<String, SwiftError> {
    let normalized = raw.trim().to_ascii_uppercase();
    let bytes = normalized.as_bytes();

    if bytes.len() != 8 && bytes.len() != 11 {
        return Err(SwiftError::BadLength);
    }

    let institution_and_country = bytes[..6].iter().all(u8::is_ascii_uppercase);
    let location_and_branch = bytes[6..]
        .iter()
        .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit());

    if !institution_and_country || !location_and_branch {
        return Err(SwiftError::BadStructure);
    }

    Ok(normalized)
}
