//! Identifier masking rules
//!
//! Pure string transforms; the registry applies them to decrypted values on
//! every read path except the explicit reveal operation.

const MASK: &str = "****";

/// Mask an account number, keeping only the last four characters.
///
/// Fewer than four characters means nothing recognizable can be kept, so
/// the whole value collapses to the mask (which also avoids leaking the
/// length of very short numbers).
pub fn mask_account_number(plaintext: &str) -> String {
    let chars: Vec<char> = plaintext.chars().collect();
    if chars.len() < 4 {
        return MASK.to_string();
    }
    let last4: String = chars[chars.len() - 4..].iter().collect();
    format!("{MASK}{last4}")
}

/// Mask an IBAN, keeping the first four (country + check digits) and last
/// four characters. Anything shorter than eight characters is masked
/// entirely.
pub fn mask_iban(plaintext: &str) -> String {
    let chars: Vec<char> = plaintext.chars().collect();
    if chars.len() < 8 {
        return MASK.to_string();
    }
    let first4: String = chars[..4].iter().collect();
    let last4: String = chars[chars.len() - 4..].iter().collect();
    format!("{first4}{MASK}{last4}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_account_number_keeps_last_four() {
        assert_eq!(mask_account_number("1234567890"), "****7890");
    }

    #[test]
    fn test_account_number_exactly_four() {
        assert_eq!(mask_account_number("7890"), "****7890");
    }

    #[test]
    fn test_short_account_number_fully_masked() {
        assert_eq!(mask_account_number("123"), "****");
        assert_eq!(mask_account_number(""), "****");
    }

    #[test]
    fn test_iban_keeps_ends() {
        assert_eq!(mask_iban("AE070331234567890123456"), "AE07****3456");
    }

    #[test]
    fn test_short_iban_fully_masked() {
        assert_eq!(mask_iban("AE07033"), "****");
    }
}
