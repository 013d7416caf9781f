//! In-memory ticket store.
//!
//! Every operation takes one exclusive lock over the whole store, which makes
//! each ticket transition atomic. A production backend can shard by topic or
//! use database transactions; the trait contract only needs per-ticket
//! atomicity.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::Notify;

use crate::core::{
    Body, Context, JobQueueError, JobResult, Phase, Request, Scheduler, Ticket, TicketId,
    TicketJob, TicketManager,
};
use crate::util::clock::now_ms;

/// Tickets of one topic in arrival order.
#[derive(Debug, Default)]
struct TopicTickets {
    tickets: Vec<Ticket>,
    /// Positions in `tickets` that were pending when queued, oldest first.
    /// Entries are checked again on pop; a ticket moved on by `update` is skipped.
    pending: VecDeque<usize>,
}

#[derive(Debug, Default)]
struct StoreState {
    topics: HashMap<String, TopicTickets>,
    /// Ticket ID to (topic, position) for O(1) lookups.
    index: HashMap<TicketId, (String, usize)>,
}

/// Per-phase ticket counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreStats {
    /// Tickets waiting to be claimed.
    pub pending: usize,
    /// Tickets claimed but not complete.
    pub processing: usize,
    /// Tickets in the terminal phase.
    pub complete: usize,
}

impl StoreStats {
    /// Total number of stored tickets.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.pending + self.processing + self.complete
    }
}

/// Reference [`TicketManager`] and [`Scheduler`] keeping tickets in memory.
///
/// Cloning is cheap and every clone shares the same tickets. Tickets are never
/// evicted.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTicketStore {
    state: Arc<Mutex<StoreState>>,
    notify: Arc<Notify>,
}

impl InMemoryTicketStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored tickets across all topics.
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.lock().index.len()
    }

    /// Whether the store holds no tickets.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Count stored tickets by phase.
    #[must_use]
    pub fn stats(&self) -> StoreStats {
        let state = self.state.lock();
        let mut stats = StoreStats::default();
        for ticket in state.topics.values().flat_map(|t| t.tickets.iter()) {
            match ticket.phase {
                Phase::Pending => stats.pending += 1,
                Phase::Processing => stats.processing += 1,
                Phase::Complete => stats.complete += 1,
            }
        }
        stats
    }

    /// Insert a fully built `Pending` ticket and wake idle claim loops.
    fn insert(&self, ticket: Ticket) -> TicketId {
        let id = ticket.id.clone();
        {
            let mut state = self.state.lock();
            let topic = ticket.topic.clone();
            let entry = state.topics.entry(topic.clone()).or_default();
            let position = entry.tickets.len();
            entry.tickets.push(ticket);
            entry.pending.push_back(position);
            state.index.insert(id.clone(), (topic, position));
        }
        self.notify.notify_waiters();
        id
    }
}

#[async_trait]
impl TicketManager for InMemoryTicketStore {
    async fn pull(&self, ctx: &Context, topics: &[String]) -> JobResult<Ticket> {
        ctx.check()?;
        let mut state = self.state.lock();
        for topic in topics {
            let Some(entry) = state.topics.get_mut(topic) else {
                continue;
            };
            while let Some(position) = entry.pending.pop_front() {
                let ticket = &mut entry.tickets[position];
                if ticket.phase != Phase::Pending {
                    continue;
                }
                ticket.phase = Phase::Processing;
                ticket.updated_at_ms = now_ms().max(ticket.created_at_ms);
                return Ok(ticket.clone());
            }
        }
        Err(JobQueueError::not_found())
    }

    async fn update(&self, ctx: &Context, ticket: Ticket) -> JobResult<Ticket> {
        ctx.check()?;
        let mut state = self.state.lock();
        let position = match state.index.get(&ticket.id) {
            Some((topic, position)) if *topic == ticket.topic => *position,
            _ => return Err(JobQueueError::ticket_not_found(ticket.id)),
        };
        let Some(entry) = state.topics.get_mut(&ticket.topic) else {
            return Err(JobQueueError::ticket_not_found(ticket.id));
        };
        let stored = &mut entry.tickets[position];
        if stored.id != ticket.id {
            return Err(JobQueueError::ticket_not_found(ticket.id));
        }
        if !stored.phase.can_transition_to(ticket.phase) {
            return Err(JobQueueError::InvalidTransition {
                id: ticket.id,
                from: stored.phase,
                to: ticket.phase,
            });
        }

        let created_at_ms = stored.created_at_ms;
        *stored = Ticket {
            created_at_ms,
            updated_at_ms: now_ms().max(created_at_ms),
            ..ticket
        };
        let updated = stored.clone();
        if updated.phase == Phase::Pending {
            entry.pending.push_back(position);
        }
        Ok(updated)
    }

    async fn get(&self, ctx: &Context, id: &TicketId) -> JobResult<Ticket> {
        ctx.check()?;
        let state = self.state.lock();
        state
            .index
            .get(id)
            .and_then(|(topic, position)| state.topics.get(topic)?.tickets.get(*position))
            .filter(|ticket| ticket.id == *id)
            .cloned()
            .ok_or_else(|| JobQueueError::ticket_not_found(id.clone()))
    }

    fn notifier(&self) -> Option<Arc<Notify>> {
        Some(Arc::clone(&self.notify))
    }
}

#[async_trait]
impl Scheduler for InMemoryTicketStore {
    type Job = TicketJob<Self>;

    async fn schedule<T>(&self, ctx: &Context, request: Request<T>) -> JobResult<Self::Job>
    where
        T: Serialize + Send + Sync,
    {
        ctx.check()?;
        let body = Body::encode(&request.body)?;
        let ticket = Ticket::new(request.topic, body, now_ms());
        tracing::debug!(ticket_id = %ticket.id, topic = %ticket.topic, "ticket scheduled");
        let id = self.insert(ticket);
        Ok(TicketJob::new(id, self.clone()))
    }
}
