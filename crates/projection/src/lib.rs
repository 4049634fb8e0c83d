//! BankReg Projection - masked, display-safe views
//!
//! Read paths never see plaintext identifiers; they get `AccountSummary`
//! with `****`-masked account number and IBAN.

pub mod mask;
pub mod summary;

pub use mask::{mask_account_number, mask_iban};
pub use summary::AccountSummary;
