//! Core job-queue abstractions: tickets, store capabilities, workers, and the pool.

pub mod audit;
pub mod context;
pub mod error;
pub mod store;
pub mod ticket;
pub mod wait;
pub mod worker;
pub mod worker_pool;

pub use audit::{build_audit_event, AuditAction, AuditEvent, AuditSink, InMemoryAuditSink};
pub use context::Context;
pub use error::{AppResult, JobQueueError, JobResult};
pub use store::{Job, Scheduler, TicketJob, TicketManager};
pub use ticket::{Body, Phase, Request, Ticket, TicketId};
pub use wait::{wait, wait_ticket, wait_with};
pub use worker::{Typed, TypedWorker, Worker, WorkerFn};
pub use worker_pool::{PoolError, PoolStats, WorkerPool};
