//! Display-safe account projection

use bankreg_core::{AccountStatus, BankAccount};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::mask::{mask_account_number, mask_iban};

/// What list/detail screens see: plaintext metadata, masked identifiers.
///
/// This is the only shape the registry hands to ordinary read paths; the
/// full plaintext exists solely behind the authorized reveal operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountSummary {
    pub id: String,
    pub bank_name: String,
    pub account_name: String,
    pub account_number_masked: String,
    pub iban_masked: String,
    pub swift_code: String,
    pub is_primary: bool,
    pub status: AccountStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AccountSummary {
    /// Project a decrypted account into its masked view.
    pub fn project(account: &BankAccount) -> Self {
        Self {
            id: account.id.clone(),
            bank_name: account.bank_name.clone(),
            account_name: account.account_name.clone(),
            account_number_masked: mask_account_number(&account.account_number),
            iban_masked: mask_iban(&account.iban),
            swift_code: account.swift_code.clone(),
            is_primary: account.is_primary,
            status: account.status,
            created_at: account.created_at,
            updated_at: account.updated_at,
        }
    }
}
