//! SQLite storage for bank account records
//!
//! Rows hold the two encrypted blobs and their fingerprint tokens next to
//! the plaintext metadata. The unique indexes on the fingerprint columns
//! back up the registry's explicit duplicate checks at the storage layer;
//! there is deliberately no index on the ciphertext columns because the
//! cipher is non-deterministic and such an index could never match.
//!
//! A single connection behind a mutex, with every invariant-bearing
//! operation inside one SQLite transaction, is what serializes concurrent
//! primary transitions and deactivations.

use bankreg_core::{AccountStatus, SensitiveField};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Transaction};
use std::path::Path;
use std::sync::{Mutex, PoisonError};

use crate::error::RegistryError;

/// One persisted record in its at-rest (encrypted) form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredAccount {
    pub id: String,
    pub bank_name: String,
    pub account_name: String,
    pub account_number_enc: Vec<u8>,
    pub account_number_fp: String,
    pub iban_enc: Vec<u8>,
    pub iban_fp: String,
    pub swift_code: String,
    pub is_primary: bool,
    pub status: AccountStatus,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Connection owner. All registry operations funnel through [`with_tx`].
///
/// [`with_tx`]: AccountStore::with_tx
pub struct AccountStore {
    conn: Mutex<Connection>,
}

impl AccountStore {
    /// Open (or create) a store at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, RegistryError> {
        let conn = Connection::open(path)?;
        init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory store (for testing).
    pub fn in_memory() -> Result<Self, RegistryError> {
        let conn = Connection::open_in_memory()?;
        init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Run `f` inside a transaction, committing on success.
    ///
    /// The mutex plus the transaction make each read-check-write sequence
    /// atomic with respect to every other registry operation; two
    /// concurrent primary transitions cannot interleave.
    pub fn with_tx<T, E>(&self, f: impl FnOnce(&Transaction) -> Result<T, E>) -> Result<T, E>
    where
        E: From<rusqlite::Error>,
    {
        let mut conn = self.conn.lock().unwrap_or_else(PoisonError::into_inner);
        let tx = conn.transaction()?;
        let out = f(&tx)?;
        tx.commit()?;
        Ok(out)
    }
}

fn init_schema(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS bank_accounts (
            id TEXT PRIMARY KEY,
            bank_name TEXT NOT NULL,
            account_name TEXT NOT NULL,
            account_number_enc BLOB NOT NULL,
            account_number_fp TEXT NOT NULL,
            iban_enc BLOB NOT NULL,
            iban_fp TEXT NOT NULL,
            swift_code TEXT NOT NULL,
            is_primary INTEGER NOT NULL DEFAULT 0,
            status TEXT NOT NULL,
            created_by TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );
        CREATE UNIQUE INDEX IF NOT EXISTS idx_bank_accounts_account_number_fp
            ON bank_accounts(account_number_fp);
        CREATE UNIQUE INDEX IF NOT EXISTS idx_bank_accounts_iban_fp
            ON bank_accounts(iban_fp);
        CREATE INDEX IF NOT EXISTS idx_bank_accounts_status
            ON bank_accounts(status);",
    )
}

const COLUMNS: &str = "id, bank_name, account_name, account_number_enc, account_number_fp, \
     iban_enc, iban_fp, swift_code, is_primary, status, created_by, created_at, updated_at";

/// Insert a new record.
pub fn insert(conn: &Connection, account: &StoredAccount) -> Result<(), RegistryError> {
    conn.execute(
        "INSERT INTO bank_accounts
         (id, bank_name, account_name, account_number_enc, account_number_fp,
          iban_enc, iban_fp, swift_code, is_primary, status, created_by,
          created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
        params![
            account.id,
            account.bank_name,
            account.account_name,
            account.account_number_enc,
            account.account_number_fp,
            account.iban_enc,
            account.iban_fp,
            account.swift_code,
            account.is_primary,
            account.status.to_string(),
            account.created_by,
            account.created_at.to_rfc3339(),
            account.updated_at.to_rfc3339(),
        ],
    )?;
    Ok(())
}

/// Overwrite every mutable column of an existing record.
/// `created_by` and `created_at` are immutable and not part of the UPDATE.
pub fn save(conn: &Connection, account: &StoredAccount) -> Result<(), RegistryError> {
    let rows = conn.execute(
        "UPDATE bank_accounts SET
            bank_name = ?2,
            account_name = ?3,
            account_number_enc = ?4,
            account_number_fp = ?5,
            iban_enc = ?6,
            iban_fp = ?7,
            swift_code = ?8,
            is_primary = ?9,
            status = ?10,
            updated_at = ?11
         WHERE id = ?1",
        params![
            account.id,
            account.bank_name,
            account.account_name,
            account.account_number_enc,
            account.account_number_fp,
            account.iban_enc,
            account.iban_fp,
            account.swift_code,
            account.is_primary,
            account.status.to_string(),
            account.updated_at.to_rfc3339(),
        ],
    )?;
    if rows == 0 {
        return Err(RegistryError::NotFound {
            id: account.id.clone(),
        });
    }
    Ok(())
}

/// Fetch one record by id.
pub fn fetch(conn: &Connection, id: &str) -> Result<StoredAccount, RegistryError> {
    fetch_opt(conn, id)?.ok_or_else(|| RegistryError::NotFound { id: id.to_string() })
}

/// Fetch one record by id, `None` if absent.
pub fn fetch_opt(conn: &Connection, id: &str) -> Result<Option<StoredAccount>, RegistryError> {
    let raw = conn
        .query_row(
            &format!("SELECT {COLUMNS} FROM bank_accounts WHERE id = ?1"),
            params![id],
            map_raw,
        )
        .optional()?;
    raw.map(RawAccount::into_stored).transpose()
}

/// Every record, oldest first (`id` tiebreak keeps equal timestamps
/// deterministic).
pub fn list_all(conn: &Connection) -> Result<Vec<StoredAccount>, RegistryError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {COLUMNS} FROM bank_accounts ORDER BY created_at, id"
    ))?;
    let raws = stmt
        .query_map([], map_raw)?
        .collect::<Result<Vec<_>, _>>()?;
    raws.into_iter().map(RawAccount::into_stored).collect()
}

/// Id of the record holding this fingerprint, if any, optionally ignoring
/// one record (so updates don't collide with themselves).
pub fn find_by_fingerprint(
    conn: &Connection,
    field: SensitiveField,
    fingerprint: &str,
    exclude_id: Option<&str>,
) -> Result<Option<String>, RegistryError> {
    let column = match field {
        SensitiveField::AccountNumber => "account_number_fp",
        SensitiveField::Iban => "iban_fp",
    };
    let id = conn
        .query_row(
            &format!(
                "SELECT id FROM bank_accounts
                 WHERE {column} = ?1 AND (?2 IS NULL OR id <> ?2)"
            ),
            params![fingerprint, exclude_id],
            |row| row.get(0),
        )
        .optional()?;
    Ok(id)
}

/// The active primary account, if one exists.
pub fn active_primary(conn: &Connection) -> Result<Option<StoredAccount>, RegistryError> {
    let raw = conn
        .query_row(
            &format!(
                "SELECT {COLUMNS} FROM bank_accounts
                 WHERE status = 'ACTIVE' AND is_primary = 1 LIMIT 1"
            ),
            [],
            map_raw,
        )
        .optional()?;
    raw.map(RawAccount::into_stored).transpose()
}

/// Number of active records.
pub fn count_active(conn: &Connection) -> Result<i64, RegistryError> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM bank_accounts WHERE status = 'ACTIVE'",
        [],
        |row| row.get(0),
    )?;
    Ok(count)
}

/// Oldest active record other than `exclude_id`; the reassignment target
/// when the primary account is deactivated.
pub fn oldest_active_excluding(
    conn: &Connection,
    exclude_id: &str,
) -> Result<Option<StoredAccount>, RegistryError> {
    let raw = conn
        .query_row(
            &format!(
                "SELECT {COLUMNS} FROM bank_accounts
                 WHERE status = 'ACTIVE' AND id <> ?1
                 ORDER BY created_at, id LIMIT 1"
            ),
            params![exclude_id],
            map_raw,
        )
        .optional()?;
    raw.map(RawAccount::into_stored).transpose()
}

// Two-stage row mapping: pull raw column values under rusqlite's error
// type, then parse timestamps/status into domain types under ours.
struct RawAccount {
    id: String,
    bank_name: String,
    account_name: String,
    account_number_enc: Vec<u8>,
    account_number_fp: String,
    iban_enc: Vec<u8>,
    iban_fp: String,
    swift_code: String,
    is_primary: bool,
    status: String,
    created_by: String,
    created_at: String,
    updated_at: String,
}

fn map_raw(row: &rusqlite::Row) -> rusqlite::Result<RawAccount> {
    Ok(RawAccount {
        id: row.get(0)?,
        bank_name: row.get(1)?,
        account_name: row.get(2)?,
        account_number_enc: row.get(3)?,
        account_number_fp: row.get(4)?,
        iban_enc: row.get(5)?,
        iban_fp: row.get(6)?,
        swift_code: row.get(7)?,
        is_primary: row.get(8)?,
        status: row.get(9)?,
        created_by: row.get(10)?,
        created_at: row.get(11)?,
        updated_at: row.get(12)?,
    })
}

impl RawAccount {
    fn into_stored(self) -> Result<StoredAccount, RegistryError> {
        let status: AccountStatus = self.status.parse().map_err(|_| RegistryError::Corrupt {
            id: self.id.clone(),
            what: "status",
        })?;
        let created_at = parse_ts(&self.created_at, &self.id, "created_at")?;
        let updated_at = parse_ts(&self.updated_at, &self.id, "updated_at")?;

        Ok(StoredAccount {
            id: self.id,
            bank_name: self.bank_name,
            account_name: self.account_name,
            account_number_enc: self.account_number_enc,
            account_number_fp: self.account_number_fp,
            iban_enc: self.iban_enc,
            iban_fp: self.iban_fp,
            swift_code: self.swift_code,
            is_primary: self.is_primary,
            status,
            created_by: self.created_by,
            created_at,
            updated_at,
        })
    }
}

fn parse_ts(raw: &str, id: &str, what: &'static str) -> Result<DateTime<Utc>, RegistryError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| RegistryError::Corrupt {
            id: id.to_string(),
            what,
        })
}
