//! Outbound port: linked-record check
//!
//! The payments/cheques module owns the knowledge of whether an account is
//! still referenced by an unresolved obligation (a pending cheque's deposit
//! destination, an in-flight payment). The registry only asks the question;
//! it never inspects those records itself.

/// Injected collaborator consulted before deactivation.
pub trait LinkChecker: Send + Sync {
    /// True if an unresolved external obligation still references this
    /// account, in which case deactivation must be rejected.
    fn has_unresolved_links(&self, account_id: &str) -> bool;
}

/// Checker for deployments (and tests) without a payments module wired in.
pub struct NoLinks;

impl LinkChecker for NoLinks {
    fn has_unresolved_links(&self, _account_id: &str) -> bool {
        false
    }
}
