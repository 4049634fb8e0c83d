//! Bank account domain types
//!
//! `BankAccount` is the decrypted working form of a record. The registry
//! only materializes it on paths that are allowed to see plaintext
//! identifiers; everything display-facing goes through the masked
//! projection instead.

use crate::iban::{self, IbanError};
use crate::swift::{self, SwiftError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use thiserror::Error;

/// Maximum length of the bank name.
pub const BANK_NAME_MAX: usize = 100;

/// Maximum length of the account holder name.
pub const ACCOUNT_NAME_MAX: usize = 255;

/// Input validation failures for account commands.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("invalid IBAN: {0}")]
    Iban(#[from] IbanError),

    #[error("invalid SWIFT code: {0}")]
    Swift(#[from] SwiftError),

    #[error("{field} is required")]
    Missing { field: &'static str },

    #[error("{field} exceeds {max} characters")]
    TooLong { field: &'static str, max: usize },
}

/// The two identifier fields that are encrypted at rest.
///
/// Used to name which field a duplicate collided on and which field a
/// reveal operation exposed.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display,
)]
pub enum SensitiveField {
    #[strum(serialize = "accountNumber")]
    #[serde(rename = "accountNumber")]
    AccountNumber,

    #[strum(serialize = "iban")]
    #[serde(rename = "iban")]
    Iban,
}

/// Account lifecycle status. Soft delete sets `Inactive`; records are never
/// physically removed and an inactive account is never reactivated.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountStatus {
    Active,
    Inactive,
}

impl AccountStatus {
    pub fn is_active(self) -> bool {
        self == AccountStatus::Active
    }
}

/// A company bank account with identifiers in plaintext.
///
/// Only the registry constructs this, and only after decrypting the stored
/// blobs. It must never be logged wholesale; audit and log lines carry the
/// `id`, never the identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankAccount {
    pub id: String,
    pub bank_name: String,
    pub account_name: String,
    pub account_number: String,
    pub iban: String,
    pub swift_code: String,
    pub is_primary: bool,
    pub status: AccountStatus,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Create command. The caller never chooses `id`, `is_primary`, `status`,
/// or timestamps; the registry assigns all of those.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewBankAccount {
    pub bank_name: String,
    pub account_name: String,
    pub account_number: String,
    pub iban: String,
    pub swift_code: String,
}

impl NewBankAccount {
    /// Validate and normalize the command.
    ///
    /// Checks required fields and length caps, then the IBAN checksum and
    /// SWIFT structure. On success the returned command carries the
    /// normalized identifier forms, which are also the forms that get
    /// fingerprinted and encrypted.
    pub fn validated(self) -> Result<NewBankAccount, ValidationError> {
        let bank_name = required("bankName", &self.bank_name, BANK_NAME_MAX)?;
        let account_name = required("accountName", &self.account_name, ACCOUNT_NAME_MAX)?;

        let account_number = self.account_number.trim().to_string();
        if account_number.is_empty() {
            return Err(ValidationError::Missing {
                field: "accountNumber",
            });
        }

        let iban = iban::validate(&self.iban)?;
        let swift_code = swift::validate(&self.swift_code)?;

        Ok(NewBankAccount {
            bank_name,
            account_name,
            account_number,
            iban,
            swift_code,
        })
    }
}

/// Update command: every field optional, absent means unchanged.
///
/// `id`, `created_by`, and `created_at` are immutable and simply not
/// representable here. Primary/status transitions have their own
/// operations and are likewise absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountUpdate {
    pub bank_name: Option<String>,
    pub account_name: Option<String>,
    pub account_number: Option<String>,
    pub iban: Option<String>,
    pub swift_code: Option<String>,
}

impl AccountUpdate {
    pub fn is_empty(&self) -> bool {
        self.bank_name.is_none()
            && self.account_name.is_none()
            && self.account_number.is_none()
            && self.iban.is_none()
            && self.swift_code.is_none()
    }

    /// Validate and normalize whichever fields are present.
    pub fn validated(self) -> Result<AccountUpdate, ValidationError> {
        let bank_name = self
            .bank_name
            .map(|v| required("bankName", &v, BANK_NAME_MAX))
            .transpose()?;
        let account_name = self
            .account_name
            .map(|v| required("accountName", &v, ACCOUNT_NAME_MAX))
            .transpose()?;

        let account_number = match self.account_number {
            Some(v) => {
                let trimmed = v.trim().to_string();
                if trimmed.is_empty() {
                    return Err(ValidationError::Missing {
                        field: "accountNumber",
                    });
                }
                Some(trimmed)
            }
            None => None,
        };

        let iban = self.iban.map(|v| iban::validate(&v)).transpose()?;
        let swift_code = self.swift_code.map(|v| swift::validate(&v)).transpose()?;

        Ok(AccountUpdate {
            bank_name,
            account_name,
            account_number,
            iban,
            swift_code,
        })
    }
}

fn required(field: &'static str, value: &str, max: usize) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Missing { field });
    }
    if trimmed.chars().count() > max {
        return Err(ValidationError::TooLong { field, max });
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_account() -> NewBankAccount {
        NewBankAccount {
            bank_name: "Emirates NBD".to_string(),
            account_name: "Acme Properties LLC".to_string(),
            account_number: "1015551234567".to_string(),
            iban: "AE070331234567890123456".to_string(),
            swift_code: "EBILAEAD".to_string(),
        }
    }

    #[test]
    fn test_valid_create_command() {
        let cmd = new_account().validated().unwrap();
        assert_eq!(cmd.bank_name, "Emirates NBD");
        assert_eq!(cmd.iban, "AE070331234567890123456");
    }

    #[test]
    fn test_identifiers_normalized() {
        let mut cmd = new_account();
        cmd.iban = " ae070331234567890123456 ".to_string();
        cmd.swift_code = "ebilaead".to_string();
        let cmd = cmd.validated().unwrap();
        assert_eq!(cmd.iban, "AE070331234567890123456");
        assert_eq!(cmd.swift_code, "EBILAEAD");
    }

    #[test]
    fn test_missing_bank_name() {
        let mut cmd = new_account();
        cmd.bank_name = "  ".to_string();
        assert_eq!(
            cmd.validated(),
            Err(ValidationError::Missing { field: "bankName" })
        );
    }

    #[test]
    fn test_bank_name_too_long() {
        let mut cmd = new_account();
        cmd.bank_name = "B".repeat(BANK_NAME_MAX + 1);
        assert_eq!(
            cmd.validated(),
            Err(ValidationError::TooLong {
                field: "bankName",
                max: BANK_NAME_MAX
            })
        );
    }

    #[test]
    fn test_bad_iban_propagates_reason() {
        let mut cmd = new_account();
        cmd.iban = "AE070331234567890123457".to_string();
        assert_eq!(
            cmd.validated(),
            Err(ValidationError::Iban(IbanError::BadChecksum))
        );
    }

    #[test]
    fn test_update_skips_absent_fields() {
        let patch = AccountUpdate {
            bank_name: Some("Mashreq".to_string()),
            ..Default::default()
        };
        let patch = patch.validated().unwrap();
        assert_eq!(patch.bank_name.as_deref(), Some("Mashreq"));
        assert!(patch.iban.is_none());
    }

    #[test]
    fn test_update_validates_present_identifier() {
        let patch = AccountUpdate {
            swift_code: Some("EBILAEAD1".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            patch.validated(),
            Err(ValidationError::Swift(SwiftError::BadLength))
        ));
    }

    #[test]
    fn test_status_round_trip() {
        assert_eq!(AccountStatus::Active.to_string(), "ACTIVE");
        assert_eq!("INACTIVE".parse::<AccountStatus>().unwrap(), AccountStatus::Inactive);
        let json = serde_json::to_string(&AccountStatus::Active).unwrap();
        assert_eq!(json, "\"ACTIVE\"");
    }
}
