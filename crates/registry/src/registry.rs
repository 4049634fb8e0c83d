//! Bank account registry - the aggregate root
//!
//! Every operation validates input, keeps the sensitive identifiers
//! encrypted at rest, and maintains the cross-record invariants:
//! at most one active primary, at least one active account once the set is
//! non-empty, no duplicate identifiers among stored records, and no
//! deactivation while another module holds an unresolved obligation.
//!
//! Per-record state machine: created active (primary iff no active primary
//! exists, which covers the first account), `set_primary` swaps the primary
//! flag between active accounts, `deactivate` is the soft delete. There is
//! no reactivation edge and no hard delete; records stay forever for audit.
//!
//! Plaintext identifiers exist in memory only for the duration of a call
//! and are never cached; `reveal` and `get_full_detail` results must be
//! treated as non-cacheable by callers too.

use std::sync::Arc;

use bankreg_core::{
    AccountStatus, AccountUpdate, BankAccount, NewBankAccount, SensitiveField,
};
use bankreg_crypto::{FieldCipher, Fingerprinter, KeyMaterial};
use bankreg_projection::AccountSummary;
use chrono::Utc;
use uuid::Uuid;

use crate::audit::{AuditAction, AuditEvent, AuditSink};
use crate::error::{InvariantViolation, RegistryError};
use crate::links::LinkChecker;
use crate::store::{self, AccountStore, StoredAccount};

/// The registry service. One instance per process, shared by reference.
pub struct AccountRegistry {
    store: AccountStore,
    cipher: FieldCipher,
    fingerprinter: Fingerprinter,
    links: Arc<dyn LinkChecker>,
    audit: Arc<dyn AuditSink>,
}

impl AccountRegistry {
    pub fn new(
        store: AccountStore,
        keys: &KeyMaterial,
        links: Arc<dyn LinkChecker>,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        Self {
            store,
            cipher: FieldCipher::new(keys.cipher_key()),
            fingerprinter: Fingerprinter::new(keys.fingerprint_key()),
            links,
            audit,
        }
    }

    /// Create an account.
    ///
    /// The caller never chooses the primary flag: the new account becomes
    /// primary exactly when no active primary exists, which makes the very
    /// first account primary and self-heals a set that somehow lost its
    /// primary.
    pub fn create(
        &self,
        cmd: NewBankAccount,
        actor: &str,
    ) -> Result<AccountSummary, RegistryError> {
        let cmd = cmd.validated()?;
        let number_fp = self.fingerprinter.fingerprint(&cmd.account_number);
        let iban_fp = self.fingerprinter.fingerprint(&cmd.iban);

        let account_number_enc = self.encrypt_field(&cmd.account_number)?;
        let iban_enc = self.encrypt_field(&cmd.iban)?;

        let row = self.store.with_tx(|tx| {
            if store::find_by_fingerprint(tx, SensitiveField::AccountNumber, &number_fp, None)?
                .is_some()
            {
                return Err(RegistryError::Duplicate {
                    field: SensitiveField::AccountNumber,
                });
            }
            if store::find_by_fingerprint(tx, SensitiveField::Iban, &iban_fp, None)?.is_some() {
                return Err(RegistryError::Duplicate {
                    field: SensitiveField::Iban,
                });
            }

            let is_primary = store::active_primary(tx)?.is_none();
            let now = Utc::now();
            let row = StoredAccount {
                id: Uuid::new_v4().to_string(),
                bank_name: cmd.bank_name.clone(),
                account_name: cmd.account_name.clone(),
                account_number_enc: account_number_enc.clone(),
                account_number_fp: number_fp.clone(),
                iban_enc: iban_enc.clone(),
                iban_fp: iban_fp.clone(),
                swift_code: cmd.swift_code.clone(),
                is_primary,
                status: AccountStatus::Active,
                created_by: actor.to_string(),
                created_at: now,
                updated_at: now,
            };
            store::insert(tx, &row)?;
            Ok(row)
        })?;

        self.audit.record(AuditEvent::new(
            AuditAction::Created,
            &row.id,
            actor,
            format!("primary={}", row.is_primary),
        ));

        let account = self.decrypt_account(row)?;
        Ok(AccountSummary::project(&account))
    }

    /// Apply a partial update.
    ///
    /// Identifier changes are re-validated and re-checked for duplicates
    /// excluding this record's own fingerprints, so re-saving an unchanged
    /// value never collides with itself.
    pub fn update(
        &self,
        id: &str,
        patch: AccountUpdate,
        actor: &str,
    ) -> Result<AccountSummary, RegistryError> {
        if patch.is_empty() {
            return self.get(id);
        }
        let patch = patch.validated()?;

        let row = self.store.with_tx(|tx| {
            let mut row = store::fetch(tx, id)?;

            if let Some(bank_name) = patch.bank_name {
                row.bank_name = bank_name;
            }
            if let Some(account_name) = patch.account_name {
                row.account_name = account_name;
            }
            if let Some(swift_code) = patch.swift_code {
                row.swift_code = swift_code;
            }

            if let Some(account_number) = patch.account_number {
                let fp = self.fingerprinter.fingerprint(&account_number);
                if store::find_by_fingerprint(tx, SensitiveField::AccountNumber, &fp, Some(id))?
                    .is_some()
                {
                    return Err(RegistryError::Duplicate {
                        field: SensitiveField::AccountNumber,
                    });
                }
                row.account_number_enc = self.encrypt_field(&account_number)?;
                row.account_number_fp = fp;
            }
            if let Some(iban) = patch.iban {
                let fp = self.fingerprinter.fingerprint(&iban);
                if store::find_by_fingerprint(tx, SensitiveField::Iban, &fp, Some(id))?.is_some()
                {
                    return Err(RegistryError::Duplicate {
                        field: SensitiveField::Iban,
                    });
                }
                row.iban_enc = self.encrypt_field(&iban)?;
                row.iban_fp = fp;
            }

            row.updated_at = Utc::now();
            store::save(tx, &row)?;
            Ok(row)
        })?;

        self.audit
            .record(AuditEvent::new(AuditAction::Updated, &row.id, actor, ""));

        let account = self.decrypt_account(row)?;
        Ok(AccountSummary::project(&account))
    }

    /// Make `id` the single active primary account.
    ///
    /// Demotion of the previous primary and promotion of the target happen
    /// in one transaction; no reader can observe zero or two primaries.
    pub fn set_primary(&self, id: &str, actor: &str) -> Result<AccountSummary, RegistryError> {
        let (row, demoted) = self.store.with_tx(|tx| {
            let mut target = store::fetch(tx, id)?;
            if !target.status.is_active() {
                return Err(RegistryError::InvariantViolation(
                    InvariantViolation::NotActive { id: id.to_string() },
                ));
            }
            if target.is_primary {
                return Ok((target, None));
            }

            let previous = store::active_primary(tx)?;
            let demoted = match previous {
                Some(mut prev) => {
                    prev.is_primary = false;
                    prev.updated_at = Utc::now();
                    store::save(tx, &prev)?;
                    Some(prev.id)
                }
                None => None,
            };

            target.is_primary = true;
            target.updated_at = Utc::now();
            store::save(tx, &target)?;
            Ok((target, Some(demoted)))
        })?;

        // `demoted` is None only for the no-op case (already primary).
        if let Some(previous) = demoted {
            self.audit.record(AuditEvent::new(
                AuditAction::PrimaryChanged,
                &row.id,
                actor,
                match previous {
                    Some(prev) => format!("previous={prev}"),
                    None => "previous=none".to_string(),
                },
            ));
        }

        let account = self.decrypt_account(row)?;
        Ok(AccountSummary::project(&account))
    }

    /// Soft-delete an account.
    ///
    /// Rejected when it is the last active account or when the
    /// injected link checker reports an unresolved obligation. When
    /// the deactivated account was primary, the oldest remaining active
    /// account is promoted in the same transaction so the active set never
    /// lacks a primary.
    pub fn deactivate(&self, id: &str, actor: &str) -> Result<(), RegistryError> {
        let new_primary = self.store.with_tx(|tx| {
            let mut target = store::fetch(tx, id)?;
            if !target.status.is_active() {
                return Err(RegistryError::InvariantViolation(
                    InvariantViolation::AlreadyInactive { id: id.to_string() },
                ));
            }
            if store::count_active(tx)? <= 1 {
                return Err(RegistryError::InvariantViolation(
                    InvariantViolation::LastActiveAccount,
                ));
            }
            if self.links.has_unresolved_links(id) {
                return Err(RegistryError::LinkedRecords { id: id.to_string() });
            }

            let was_primary = target.is_primary;
            target.status = AccountStatus::Inactive;
            target.is_primary = false;
            target.updated_at = Utc::now();
            store::save(tx, &target)?;

            let mut new_primary = None;
            if was_primary {
                // The last-active guard above means a successor exists.
                if let Some(mut next) = store::oldest_active_excluding(tx, id)? {
                    next.is_primary = true;
                    next.updated_at = Utc::now();
                    store::save(tx, &next)?;
                    new_primary = Some(next.id);
                }
            }
            Ok(new_primary)
        })?;

        self.audit.record(AuditEvent::new(
            AuditAction::Deactivated,
            id,
            actor,
            match &new_primary {
                Some(next) => format!("newPrimary={next}"),
                None => String::new(),
            },
        ));
        Ok(())
    }

    /// List masked summaries, oldest first, optionally filtered by a
    /// case-insensitive substring over bank name and account holder name.
    /// The filter runs on plaintext metadata before any decryption, so
    /// non-matching rows are never decrypted.
    pub fn list(&self, search: Option<&str>) -> Result<Vec<AccountSummary>, RegistryError> {
        let rows = self.store.with_tx(|tx| store::list_all(tx))?;
        let needle = search.map(str::to_lowercase);

        let mut summaries = Vec::new();
        for row in rows {
            if let Some(q) = &needle {
                if !row.bank_name.to_lowercase().contains(q)
                    && !row.account_name.to_lowercase().contains(q)
                {
                    continue;
                }
            }
            let account = self.decrypt_account(row)?;
            summaries.push(AccountSummary::project(&account));
        }
        Ok(summaries)
    }

    /// Masked view of a single account.
    pub fn get(&self, id: &str) -> Result<AccountSummary, RegistryError> {
        let row = self.store.with_tx(|tx| store::fetch(tx, id))?;
        let account = self.decrypt_account(row)?;
        Ok(AccountSummary::project(&account))
    }

    /// Full plaintext detail. `authorized` is the verdict of the caller's
    /// access-control layer, which this component trusts. Exposing both
    /// identifiers is audited exactly like a reveal.
    pub fn get_full_detail(
        &self,
        id: &str,
        authorized: bool,
        actor: &str,
    ) -> Result<BankAccount, RegistryError> {
        if !authorized {
            tracing::warn!(account_id = %id, actor = %actor, "unauthorized full-detail request");
            return Err(RegistryError::Unauthorized);
        }
        let row = self.store.with_tx(|tx| store::fetch(tx, id))?;
        let account = self.decrypt_account(row)?;

        self.audit.record(AuditEvent::new(
            AuditAction::FullDetailViewed,
            id,
            actor,
            "fields=accountNumber,iban",
        ));
        Ok(account)
    }

    /// Decrypt a single identifier field. Recording who revealed what is a
    /// hard requirement of this operation, so the audit event is written on
    /// every success.
    pub fn reveal(
        &self,
        id: &str,
        field: SensitiveField,
        actor: &str,
    ) -> Result<String, RegistryError> {
        let row = self.store.with_tx(|tx| store::fetch(tx, id))?;
        let blob = match field {
            SensitiveField::AccountNumber => &row.account_number_enc,
            SensitiveField::Iban => &row.iban_enc,
        };
        let plaintext = self.decrypt_field(&row.id, blob)?;

        self.audit.record(AuditEvent::new(
            AuditAction::Revealed,
            id,
            actor,
            format!("field={field}"),
        ));
        Ok(plaintext)
    }

    fn encrypt_field(&self, plaintext: &str) -> Result<Vec<u8>, RegistryError> {
        self.cipher
            .encrypt(plaintext)
            .map_err(RegistryError::Encryption)
    }

    fn decrypt_field(&self, id: &str, blob: &[u8]) -> Result<String, RegistryError> {
        self.cipher.decrypt(blob).map_err(|source| {
            tracing::error!(
                account_id = %id,
                error = %source,
                "stored field failed integrity check"
            );
            RegistryError::Integrity {
                id: id.to_string(),
                source,
            }
        })
    }

    fn decrypt_account(&self, row: StoredAccount) -> Result<BankAccount, RegistryError> {
        let account_number = self.decrypt_field(&row.id, &row.account_number_enc)?;
        let iban = self.decrypt_field(&row.id, &row.iban_enc)?;
        Ok(BankAccount {
            id: row.id,
            bank_name: row.bank_name,
            account_name: row.account_name,
            account_number,
            iban,
            swift_code: row.swift_code,
            is_primary: row.is_primary,
            status: row.status,
            created_by: row.created_by,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}
