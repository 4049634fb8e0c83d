//! Registry errors
//!
//! Validation and duplicate errors are expected caller mistakes: fix the
//! input and resubmit. Integrity errors are not; they mean corrupted
//! ciphertext or a key mismatch and are logged at error severity where they
//! are raised. Nothing here retries; retry policy belongs to callers.

use bankreg_core::{SensitiveField, ValidationError};
use bankreg_crypto::CipherError;
use thiserror::Error;

/// Cross-record invariant failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvariantViolation {
    /// At least one account must stay active.
    #[error("cannot deactivate the last active bank account")]
    LastActiveAccount,

    /// Primary transitions only apply to active accounts.
    #[error("account {id} is not active")]
    NotActive { id: String },

    /// Deactivation is one-way; there is no inactive-to-inactive edge.
    #[error("account {id} is already inactive")]
    AlreadyInactive { id: String },
}

/// Everything a registry operation can fail with.
#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("duplicate {field}: value already in use by another account")]
    Duplicate { field: SensitiveField },

    #[error(transparent)]
    InvariantViolation(#[from] InvariantViolation),

    /// Deactivation blocked by an unresolved obligation held elsewhere
    /// (pending cheques or payments referencing this account).
    #[error("account {id} has unresolved linked records and cannot be deactivated")]
    LinkedRecords { id: String },

    /// AEAD encryption of an input field failed before anything was
    /// persisted.
    #[error("field encryption failed")]
    Encryption(#[source] CipherError),

    /// Stored ciphertext failed authentication. Data corruption or key
    /// mismatch; never substituted with a default value.
    #[error("stored field for account {id} failed integrity check")]
    Integrity {
        id: String,
        #[source]
        source: CipherError,
    },

    #[error("bank account not found: {id}")]
    NotFound { id: String },

    /// The caller's access-control layer did not clear this request for
    /// plaintext access.
    #[error("not authorized to view full account details")]
    Unauthorized,

    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    /// A persisted row no longer parses (timestamp or status column).
    #[error("corrupt stored record {id}: {what}")]
    Corrupt { id: String, what: &'static str },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_names_field() {
        let err = RegistryError::Duplicate {
            field: SensitiveField::Iban,
        };
        assert!(err.to_string().contains("iban"));
    }

    #[test]
    fn test_invariant_messages() {
        assert_eq!(
            InvariantViolation::LastActiveAccount.to_string(),
            "cannot deactivate the last active bank account"
        );
    }
}
