//! Error types for ticket store and scheduling operations.

use thiserror::Error;

use crate::core::ticket::{Phase, TicketId};

/// Errors produced by ticket stores, schedulers, and job handles.
#[derive(Debug, Error)]
pub enum JobQueueError {
    /// No eligible ticket exists, or the requested ticket ID is unknown.
    ///
    /// Returned by `pull` when nothing is pending and by `update`/`get` when
    /// the ID is missing. Callers treat it as "retry later", not a fault.
    #[error("ticket not found{}", .id.as_ref().map(|id| format!(": {id}")).unwrap_or_default())]
    NotFound {
        /// ID that was looked up, if the lookup was by ID.
        id: Option<TicketId>,
    },
    /// Request body could not be serialized at schedule time.
    #[error("marshal request body: {0}")]
    Marshal(#[source] serde_json::Error),
    /// Ticket body could not be decoded into the requested type.
    #[error("unmarshal ticket body: {0}")]
    Unmarshal(#[source] serde_json::Error),
    /// The operation's context was cancelled.
    #[error("context cancelled")]
    Cancelled,
    /// The operation's context deadline passed.
    #[error("context deadline exceeded")]
    DeadlineExceeded,
    /// A write tried to move a ticket to a phase it cannot reach.
    #[error("ticket {id}: invalid phase transition {from} -> {to}")]
    InvalidTransition {
        /// Ticket being written.
        id: TicketId,
        /// Phase currently stored.
        from: Phase,
        /// Phase the write asked for.
        to: Phase,
    },
    /// Backend-specific failure with context.
    #[error("backend error: {0}")]
    Backend(String),
}

impl JobQueueError {
    /// Not-found error without an ID, as returned by an empty `pull`.
    #[must_use]
    pub const fn not_found() -> Self {
        Self::NotFound { id: None }
    }

    /// Not-found error for a specific ticket.
    #[must_use]
    pub const fn ticket_not_found(id: TicketId) -> Self {
        Self::NotFound { id: Some(id) }
    }

    /// Whether this is the expected "nothing there" outcome.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Whether this error came from context cancellation or deadline expiry.
    #[must_use]
    pub const fn is_cancellation(&self) -> bool {
        matches!(self, Self::Cancelled | Self::DeadlineExceeded)
    }
}

/// Result alias for store and scheduling operations.
pub type JobResult<T> = Result<T, JobQueueError>;

/// Application-facing result using anyhow for higher-level contexts.
///
/// Workers return this so user code can bubble up any error type; the pool
/// only keeps its display string.
pub type AppResult<T> = Result<T, anyhow::Error>;
