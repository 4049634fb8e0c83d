//! Audit sink for reveal events and status transitions
//!
//! Recording who revealed which field and when is a requirement of the
//! reveal operation, not optional telemetry. Status transitions (creation,
//! primary changes, deactivation) go through the same sink so the account
//! set's history is reconstructable.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use strum_macros::{Display, EnumString};

/// What happened.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    Created,
    Updated,
    PrimaryChanged,
    Deactivated,
    Revealed,
    FullDetailViewed,
}

/// One audit record. Carries the account id and actor, never plaintext
/// identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEvent {
    pub action: AuditAction,
    pub account_id: String,
    pub actor: String,
    pub at: DateTime<Utc>,
    /// Free-form context, e.g. which field a reveal exposed.
    pub details: String,
}

impl AuditEvent {
    pub fn new(
        action: AuditAction,
        account_id: impl Into<String>,
        actor: impl Into<String>,
        details: impl Into<String>,
    ) -> Self {
        Self {
            action,
            account_id: account_id.into(),
            actor: actor.into(),
            at: Utc::now(),
            details: details.into(),
        }
    }
}

/// Injected audit destination.
pub trait AuditSink: Send + Sync {
    fn record(&self, event: AuditEvent);
}

/// Default sink: structured tracing events at info level.
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn record(&self, event: AuditEvent) {
        tracing::info!(
            action = %event.action,
            account_id = %event.account_id,
            actor = %event.actor,
            details = %event.details,
            "bank account audit event"
        );
    }
}

/// In-memory sink for tests: collects every event for later assertions.
pub struct MemoryAuditSink {
    events: Mutex<Vec<AuditEvent>>,
}

impl MemoryAuditSink {
    pub fn new() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
        }
    }

    pub fn events(&self) -> Vec<AuditEvent> {
        self.events
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }
}

impl Default for MemoryAuditSink {
    fn default() -> Self {
        Self::new()
    }
}

impl AuditSink for MemoryAuditSink {
    fn record(&self, event: AuditEvent) {
        self.events
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_sink_collects_in_order() {
        let sink = MemoryAuditSink::new();
        sink.record(AuditEvent::new(AuditAction::Created, "a-1", "user-1", ""));
        sink.record(AuditEvent::new(
            AuditAction::Revealed,
            "a-1",
            "user-2",
            "field=iban",
        ));

        let events = sink.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].action, AuditAction::Created);
        assert_eq!(events[1].actor, "user-2");
    }

    #[test]
    fn test_action_round_trip() {
        assert_eq!(AuditAction::PrimaryChanged.to_string(), "PRIMARY_CHANGED");
        assert_eq!(
            "REVEALED".parse::<AuditAction>().unwrap(),
            AuditAction::Revealed
        );
    }
}
