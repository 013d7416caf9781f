//! Ticket lifecycle audit trail.
//!
//! The worker pool records one event per lifecycle step when a sink is
//! attached. Sinks are synchronous and called outside of any store lock.

use std::collections::VecDeque;
use std::fmt;

use crate::core::ticket::Ticket;
use crate::util::clock::now_ms;

/// Lifecycle step being audited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditAction {
    /// Claim loop pulled the ticket.
    Claimed,
    /// Execution loop persisted the start timestamp.
    Started,
    /// Ticket reached `Complete`.
    Completed,
    /// A store write for the ticket failed; the ticket is left as the store has it.
    UpdateFailed,
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Claimed => "claimed",
            Self::Started => "started",
            Self::Completed => "completed",
            Self::UpdateFailed => "update_failed",
        };
        f.write_str(s)
    }
}

/// Audit event structure.
#[derive(Debug, Clone)]
pub struct AuditEvent {
    /// Event identifier.
    pub event_id: String,
    /// Related ticket identifier.
    pub ticket_id: String,
    /// Ticket topic.
    pub topic: String,
    /// Action taken.
    pub action: AuditAction,
    /// Timestamp milliseconds.
    pub created_at_ms: u128,
    /// Additional context, e.g. a worker or store error.
    pub detail: Option<String>,
}

/// Audit sink abstraction.
pub trait AuditSink: Send {
    /// Record an audit event.
    fn record(&mut self, event: AuditEvent);
}

/// In-memory audit sink for testing and dev.
pub struct InMemoryAuditSink {
    events: VecDeque<AuditEvent>,
    max_events: usize,
}

impl InMemoryAuditSink {
    /// Create a new in-memory sink with a bounded buffer.
    #[must_use]
    pub fn new(max_events: usize) -> Self {
        Self {
            events: VecDeque::with_capacity(max_events),
            max_events,
        }
    }

    /// Retrieve a snapshot of stored events.
    #[must_use]
    pub fn events(&self) -> Vec<AuditEvent> {
        self.events.iter().cloned().collect()
    }

    /// Events recorded for one ticket, oldest first.
    #[must_use]
    pub fn events_for(&self, ticket_id: &str) -> Vec<AuditEvent> {
        self.events
            .iter()
            .filter(|e| e.ticket_id == ticket_id)
            .cloned()
            .collect()
    }
}

impl AuditSink for InMemoryAuditSink {
    fn record(&mut self, event: AuditEvent) {
        if self.max_events == 0 {
            return;
        }
        if self.events.len() >= self.max_events {
            self.events.pop_front();
        }
        self.events.push_back(event);
    }
}

/// Build an audit event for a ticket.
#[must_use]
pub fn build_audit_event(
    ticket: &Ticket,
    action: AuditAction,
    detail: Option<String>,
) -> AuditEvent {
    let created_at_ms = now_ms();
    AuditEvent {
        event_id: format!("{}-{action}-{created_at_ms}", ticket.id),
        ticket_id: ticket.id.to_string(),
        topic: ticket.topic.clone(),
        action,
        created_at_ms,
        detail,
    }
}
