//! IBAN validation - UAE format + ISO 13616 mod-97 checksum
//!
//! A UAE IBAN is exactly 23 characters: `AE` + 2 check digits + 19 BBAN
//! digits. Validation is a pure function of the input string so it can be
//! unit-tested against literal fixtures.

use thiserror::Error;

/// Why an IBAN candidate was rejected.
///
/// The two failure modes are distinct so callers can render precise
/// messages: a format failure means the user mistyped the shape, a checksum
/// failure means the digits themselves are wrong.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum IbanError {
    /// Not `AE` + 21 digits (23 characters total).
    #[error("bad-format")]
    BadFormat,

    /// Shape is right but the mod-97 remainder is not 1.
    #[error("bad-checksum")]
    BadChecksum,
}

/// Total length of a UAE IBAN.
pub const UAE_IBAN_LEN: usize = 23;

/// Validate a UAE IBAN and return its normalized (trimmed, upper-cased) form.
///
/// Rejects unless the input matches `AE` + 21 digits, then runs the ISO 13616
/// checksum: move the first four characters to the end, map letters to their
/// numeric values (A=10 ... Z=35), and take the resulting decimal numeral
/// modulo 97. Valid iff the remainder is 1.
///
/// # Examples
/// ```
/// use bankreg_core::iban::{validate, IbanError};
///
/// assert!(validate("AE070331234567890123456").is_ok());
/// assert_eq!(validate("AE99"), Err(IbanError::BadFormat));
/// ```
pub fn validate(raw: &str) -> Result<String, IbanError> {
    let normalized = normalize(raw);

    if normalized.len() != UAE_IBAN_LEN {
        return Err(IbanError::BadFormat);
    }
    if !normalized.starts_with("AE") {
        return Err(IbanError::BadFormat);
    }
    if !normalized[2..].bytes().all(|b| b.is_ascii_digit()) {
        return Err(IbanError::BadFormat);
    }

    if mod97(&normalized) != 1 {
        return Err(IbanError::BadChecksum);
    }

    Ok(normalized)
}

/// Canonical form used for validation, storage, and fingerprinting:
/// trimmed and upper-cased. Fingerprints must be computed over this form or
/// `ae07...` and `AE07...` would count as distinct identifiers.
pub fn normalize(raw: &str) -> String {
    raw.trim().to_ascii_uppercase()
}

/// ISO 13616 mod-97 over the rearranged IBAN.
///
/// Computed incrementally digit-by-digit so no big-integer arithmetic is
/// needed: each decimal digit folds in as `r = (r * 10 + d) % 97`, each
/// letter as its two-digit value `r = (r * 100 + v) % 97`.
fn mod97(iban: &str) -> u32 {
    let rearranged = iban[4..].bytes().chain(iban[..4].bytes());

    let mut rem: u32 = 0;
    for b in rearranged {
        if b.is_ascii_digit() {
            rem = (rem * 10 + u32::from(b - b'0')) % 97;
        } else {
            // A=10 ... Z=35 contributes two decimal digits at once.
            let v = u32::from(b - b'A') + 10;
            rem = (rem * 100 + v) % 97;
        }
    }
    rem
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID: &str = "AE070331234567890123456";

    #[test]
    fn test_valid_iban() {
        assert_eq!(validate(VALID).unwrap(), VALID);
    }

    #[test]
    fn test_lowercase_prefix_normalized() {
        assert_eq!(validate("ae070331234567890123456").unwrap(), VALID);
    }

    #[test]
    fn test_surrounding_whitespace_trimmed() {
        assert_eq!(validate("  AE070331234567890123456 ").unwrap(), VALID);
    }

    #[test]
    fn test_flipping_any_digit_breaks_checksum() {
        let bytes = VALID.as_bytes();
        for i in 2..VALID.len() {
            let mut flipped = bytes.to_vec();
            flipped[i] = if flipped[i] == b'9' { b'0' } else { flipped[i] + 1 };
            let candidate = String::from_utf8(flipped).unwrap();
            assert_eq!(
                validate(&candidate),
                Err(IbanError::BadChecksum),
                "digit flip at {} should fail checksum: {}",
                i,
                candidate
            );
        }
    }

    #[test]
    fn test_wrong_length() {
        assert_eq!(validate("AE07033123456789012345"), Err(IbanError::BadFormat));
        assert_eq!(
            validate("AE0703312345678901234567"),
            Err(IbanError::BadFormat)
        );
        assert_eq!(validate(""), Err(IbanError::BadFormat));
    }

    #[test]
    fn test_wrong_country() {
        // Same shape, German prefix.
        assert_eq!(validate("DE070331234567890123456"), Err(IbanError::BadFormat));
    }

    #[test]
    fn test_non_digit_body() {
        assert_eq!(validate("AE07033123456789012345X"), Err(IbanError::BadFormat));
    }

    #[test]
    fn test_error_reasons_render_as_codes() {
        assert_eq!(IbanError::BadFormat.to_string(), "bad-format");
        assert_eq!(IbanError::BadChecksum.to_string(), "bad-checksum");
    }

    #[test]
    fn test_other_valid_checksums() {
        // Independently computed valid UAE IBANs.
        for iban in [
            "AE550021000000000123456",
            "AE250331111111111111111",
            "AE160339999999999999999",
            "AE810331234567890000001",
        ] {
            assert_eq!(validate(iban).unwrap(), iban);
        }
    }
}
