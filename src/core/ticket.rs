//! Ticket data model: identity, lifecycle phase, and opaque payload.

use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::core::error::{JobQueueError, JobResult};

/// Globally unique ticket identifier (UUID v4 in string form).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TicketId(String);

impl TicketId {
    /// Allocate a fresh random identifier.
    #[must_use]
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Borrow the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TicketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for TicketId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for TicketId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

/// Position of a ticket in its lifecycle.
///
/// `Complete` is the only terminal phase. Worker failure is carried in
/// [`Ticket::error_msg`], not in a separate phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Phase {
    /// Scheduled, waiting to be claimed.
    Pending,
    /// Claimed by a pool and handed to an execution loop.
    Processing,
    /// Work finished, successfully or not.
    Complete,
}

impl Phase {
    const fn rank(self) -> u8 {
        match self {
            Self::Pending => 0,
            Self::Processing => 1,
            Self::Complete => 2,
        }
    }

    /// Whether a stored ticket in `self` may be overwritten with `next`.
    ///
    /// Phases only advance one step at a time. Rewriting a ticket without
    /// changing its phase is allowed until it is complete; nothing leaves
    /// `Complete`.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        if matches!(self, Self::Complete) {
            return false;
        }
        let (from, to) = (self.rank(), next.rank());
        to == from || to == from + 1
    }

    /// Whether this phase is terminal.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Complete)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "PENDING",
            Self::Processing => "PROCESSING",
            Self::Complete => "COMPLETE",
        };
        f.write_str(s)
    }
}

/// Opaque serialized payload. Stores and pools never look inside.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Body(Vec<u8>);

impl Body {
    /// Serialize a value into a body using JSON.
    ///
    /// # Errors
    ///
    /// Returns [`JobQueueError::Marshal`] if the value cannot be serialized.
    pub fn encode<T: Serialize + ?Sized>(value: &T) -> JobResult<Self> {
        serde_json::to_vec(value)
            .map(Self)
            .map_err(JobQueueError::Marshal)
    }

    /// Decode the body into a concrete type.
    ///
    /// # Errors
    ///
    /// Returns [`JobQueueError::Unmarshal`] if the bytes do not match `T`.
    pub fn decode<T: DeserializeOwned>(&self) -> JobResult<T> {
        serde_json::from_slice(&self.0).map_err(JobQueueError::Unmarshal)
    }

    /// Raw bytes of the payload.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Payload size in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the payload is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<u8>> for Body {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

/// Producer input: a topic and any serializable body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request<T> {
    /// Routing key selecting which workers consume the ticket.
    pub topic: String,
    /// Payload, marshaled by the scheduler.
    pub body: T,
}

impl<T> Request<T> {
    /// Create a request for a topic.
    pub fn new(topic: impl Into<String>, body: T) -> Self {
        Self {
            topic: topic.into(),
            body,
        }
    }
}

/// Persisted state of one unit of scheduled work.
///
/// Timestamps are milliseconds since the Unix epoch. `started_at_ms` and
/// `ended_at_ms` stay `None` until the ticket is started and completed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    /// Unique identifier, fixed at creation.
    pub id: TicketId,
    /// Routing key, fixed at creation.
    pub topic: String,
    /// Lifecycle phase.
    pub phase: Phase,
    /// Creation time.
    pub created_at_ms: u128,
    /// Time of the most recent store write.
    pub updated_at_ms: u128,
    /// Time an execution loop began work.
    pub started_at_ms: Option<u128>,
    /// Time the ticket reached `Complete`.
    pub ended_at_ms: Option<u128>,
    /// Opaque payload.
    pub body: Body,
    /// Worker failure description, if the work returned an error.
    pub error_msg: Option<String>,
}

impl Ticket {
    /// Build a fresh `Pending` ticket with a new ID.
    #[must_use]
    pub fn new(topic: impl Into<String>, body: Body, now_ms: u128) -> Self {
        Self {
            id: TicketId::generate(),
            topic: topic.into(),
            phase: Phase::Pending,
            created_at_ms: now_ms,
            updated_at_ms: now_ms,
            started_at_ms: None,
            ended_at_ms: None,
            body,
            error_msg: None,
        }
    }

    /// Decode the payload into a concrete type.
    ///
    /// # Errors
    ///
    /// Returns [`JobQueueError::Unmarshal`] if the payload does not match `T`.
    pub fn decode_body<T: DeserializeOwned>(&self) -> JobResult<T> {
        self.body.decode()
    }

    /// Whether the ticket has reached its terminal phase.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.phase.is_terminal()
    }

    /// Whether the ticket completed without a worker error.
    #[must_use]
    pub const fn succeeded(&self) -> bool {
        self.is_complete() && self.error_msg.is_none()
    }

    /// Stamp the start of execution.
    pub fn mark_started(&mut self, now_ms: u128) {
        self.started_at_ms = Some(now_ms);
    }

    /// Move to `Complete`, recording the worker error if any.
    pub fn mark_complete(&mut self, error: Option<String>, now_ms: u128) {
        self.error_msg = error;
        self.ended_at_ms = Some(now_ms);
        self.phase = Phase::Complete;
    }

    /// Execution time, once both start and end are known.
    #[must_use]
    pub fn run_time_ms(&self) -> Option<u128> {
        match (self.started_at_ms, self.ended_at_ms) {
            (Some(start), Some(end)) => Some(end.saturating_sub(start)),
            _ => None,
        }
    }
}
