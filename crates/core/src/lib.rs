//! BankReg Core - Domain types and identifier validators
//!
//! This crate contains the fundamental types used across BankReg:
//! - `BankAccount` / `NewBankAccount` / `AccountUpdate`: the aggregate and
//!   its commands
//! - `AccountStatus`: lifecycle status (soft delete only)
//! - `iban` / `swift`: pure identifier validators

pub mod account;
pub mod iban;
pub mod swift;

pub use account::{
    AccountStatus, AccountUpdate, BankAccount, NewBankAccount, SensitiveField, ValidationError,
};
pub use iban::IbanError;
pub use swift::SwiftError;
