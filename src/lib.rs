//! # Prometheus JobQ
//!
//! A minimal asynchronous job queue: producers schedule **requests** on a
//! topic, a pool of **workers** subscribed to topics claims and executes the
//! resulting **tickets**, and producers poll a **job** handle until the ticket
//! completes.
//!
//! ## Ticket Lifecycle
//!
//! ```text
//! schedule ──► PENDING ──pull──► PROCESSING ──update──► COMPLETE
//! ```
//!
//! - `PENDING → PROCESSING` happens atomically inside the store's `pull`, so
//!   no two consumers ever claim the same ticket.
//! - `COMPLETE` is the only terminal phase. A worker error is stored in
//!   `error_msg`; the ticket still completes.
//! - Delivery is at-most-once: a failed write-back is logged, not retried.
//!
//! ## Key Features
//!
//! - **Capability traits**: `TicketManager`, `Scheduler`, `Job`, and `Worker`
//!   keep the store swappable; `InMemoryTicketStore` is the reference backend
//! - **Single claim loop, many execution loops**: per-topic dispatch queues
//!   provisioned at registration time
//! - **No busy polling**: idle claim loops sleep for a bounded backoff or until
//!   the store signals new work
//! - **Cooperative cancellation**: one `Context` reaches the claim loop, every
//!   execution loop, running work, and waiters
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use std::time::Duration;
//! use prometheus_jobq::builders::WorkerPoolBuilder;
//! use prometheus_jobq::core::{wait, Context, Request, Scheduler, WorkerFn};
//! use prometheus_jobq::infra::InMemoryTicketStore;
//!
//! let store = InMemoryTicketStore::new();
//! let pool = Arc::new(
//!     WorkerPoolBuilder::new(store.clone())
//!         .handle("resize", vec![Arc::new(WorkerFn::new(|_ctx, body| async move {
//!             let path: String = body.decode()?;
//!             resize(&path).await
//!         }))])
//!         .build()?,
//! );
//!
//! let ctx = Context::background();
//! tokio::spawn({
//!     let (pool, ctx) = (Arc::clone(&pool), ctx.clone());
//!     async move { pool.run(&ctx).await }
//! });
//!
//! let job = store.schedule(&ctx, Request::new("resize", "cat.png")).await?;
//! wait(&ctx, Duration::from_millis(50), &job).await?;
//! ```
//!
//! For complete examples, see:
//! - `tests/worker_pool_test.rs` - End-to-end pool scenarios
//! - `tests/store_test.rs` - Store contract tests

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Core job-queue abstractions, the worker pool, and polling helpers.
pub mod core;
/// Configuration models for the pool and job polling.
pub mod config;
/// Builders to construct worker pools from configuration.
pub mod builders;
/// Infrastructure adapters for ticket storage backends.
pub mod infra;
/// Shared utilities.
pub mod util;
