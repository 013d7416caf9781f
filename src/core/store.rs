//! Capability traits for ticket storage, scheduling, and job observation.
//!
//! A backend implements [`TicketManager`] (claim and write-back) and usually
//! [`Scheduler`] (ticket creation). The worker pool only needs the former;
//! producers only need the latter plus the [`Job`] handles it returns.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::Notify;

use crate::core::context::Context;
use crate::core::error::JobResult;
use crate::core::ticket::{Request, Ticket, TicketId};

/// Atomic claim and write-back over stored tickets.
///
/// Every method must be safe under arbitrary concurrent invocation; a single
/// ticket's state transition is the unit of atomicity.
#[async_trait]
pub trait TicketManager: Send + Sync + 'static {
    /// Claim one `Pending` ticket from any of `topics`.
    ///
    /// The claimed ticket is moved to `Processing` and its `updated_at_ms` is
    /// refreshed. Within a topic the oldest pending ticket wins. Concurrent
    /// callers never receive the same ticket.
    ///
    /// # Errors
    ///
    /// `NotFound` when no topic has a pending ticket; cancellation errors when
    /// `ctx` is done.
    async fn pull(&self, ctx: &Context, topics: &[String]) -> JobResult<Ticket>;

    /// Overwrite the stored ticket with the same ID and topic.
    ///
    /// Immutable fields keep their stored values and `updated_at_ms` is
    /// refreshed. The returned ticket is what was stored.
    ///
    /// # Errors
    ///
    /// `NotFound` when the ID is not present in the ticket's topic,
    /// `InvalidTransition` when the phase change is illegal, cancellation
    /// errors when `ctx` is done.
    async fn update(&self, ctx: &Context, ticket: Ticket) -> JobResult<Ticket>;

    /// Read the current state of a ticket.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown ID; cancellation errors when `ctx` is done.
    async fn get(&self, ctx: &Context, id: &TicketId) -> JobResult<Ticket>;

    /// Signal raised when new work may be available.
    ///
    /// Claim loops wait on it between empty pulls, next to their idle backoff.
    /// Backends without push notification return `None`.
    fn notifier(&self) -> Option<Arc<Notify>> {
        None
    }
}

/// Creates tickets from producer requests.
#[async_trait]
pub trait Scheduler: Send + Sync {
    /// Handle type returned for each scheduled ticket.
    type Job: Job;

    /// Marshal the body, store a new `Pending` ticket, and return its job.
    ///
    /// # Errors
    ///
    /// `Marshal` when the body cannot be serialized; cancellation errors when
    /// `ctx` is done.
    async fn schedule<T>(&self, ctx: &Context, request: Request<T>) -> JobResult<Self::Job>
    where
        T: Serialize + Send + Sync;
}

/// Handle for observing one ticket without owning it.
#[async_trait]
pub trait Job: Send + Sync {
    /// ID of the ticket this job observes.
    fn id(&self) -> &TicketId;

    /// Fetch the latest committed ticket state.
    ///
    /// # Errors
    ///
    /// Store errors and cancellation errors are passed through.
    async fn ticket(&self, ctx: &Context) -> JobResult<Ticket>;
}

/// [`Job`] that re-reads its ticket from a store on every call.
///
/// Holds only the ID and a store handle, never a cached ticket.
#[derive(Debug, Clone)]
pub struct TicketJob<S> {
    id: TicketId,
    store: S,
}

impl<S> TicketJob<S> {
    /// Bind a job to a ticket ID in `store`.
    pub const fn new(id: TicketId, store: S) -> Self {
        Self { id, store }
    }
}

#[async_trait]
impl<S> Job for TicketJob<S>
where
    S: TicketManager,
{
    fn id(&self) -> &TicketId {
        &self.id
    }

    async fn ticket(&self, ctx: &Context) -> JobResult<Ticket> {
        ctx.check()?;
        self.store.get(ctx, &self.id).await
    }
}

#[async_trait]
impl<T> TicketManager for Arc<T>
where
    T: TicketManager + ?Sized,
{
    async fn pull(&self, ctx: &Context, topics: &[String]) -> JobResult<Ticket> {
        (**self).pull(ctx, topics).await
    }

    async fn update(&self, ctx: &Context, ticket: Ticket) -> JobResult<Ticket> {
        (**self).update(ctx, ticket).await
    }

    async fn get(&self, ctx: &Context, id: &TicketId) -> JobResult<Ticket> {
        (**self).get(ctx, id).await
    }

    fn notifier(&self) -> Option<Arc<Notify>> {
        (**self).notifier()
    }
}
