//! BankReg Registry - the bank account aggregate root
//!
//! All access to company bank accounts goes through [`AccountRegistry`]:
//! it validates identifiers, encrypts them before they reach storage,
//! enforces the cross-record invariants (single active primary, last
//! active account, duplicate identifiers, linked-record guard), and hands
//! masked projections to ordinary read paths.
//!
//! # Wiring
//! ```no_run
//! use std::sync::Arc;
//! use bankreg_crypto::KeyMaterial;
//! use bankreg_registry::{AccountRegistry, AccountStore, NoLinks, TracingAuditSink};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let keys = KeyMaterial::from_env()?;
//! let registry = AccountRegistry::new(
//!     AccountStore::open("bank_accounts.db")?,
//!     &keys,
//!     Arc::new(NoLinks),
//!     Arc::new(TracingAuditSink),
//! );
//! # Ok(())
//! # }
//! ```

pub mod audit;
pub mod error;
pub mod links;
pub mod registry;
pub mod store;

pub use audit::{AuditAction, AuditEvent, AuditSink, MemoryAuditSink, TracingAuditSink};
pub use error::{InvariantViolation, RegistryError};
pub use links::{LinkChecker, NoLinks};
pub use registry::AccountRegistry;
pub use store::{AccountStore, StoredAccount};
