//! Worker pool bridging topic-subscribed workers to a ticket store.
//!
//! A pool runs two kinds of loops on the current tokio runtime:
//!
//! - **Claim loop** (one per pool): pulls pending tickets for every registered
//!   topic whose dispatch queue has room and routes each claimed ticket to
//!   that queue. After an empty pull it waits for the idle backoff or the
//!   store's work notification, whichever comes first.
//! - **Execution loops** (one per registered worker): take tickets from their
//!   topic's queue in arrival order, persist the start time, run the worker,
//!   and persist the completed ticket.
//!
//! Dispatch queues are created by [`WorkerPool::handle`] and owned by the
//! topic's registration, so a registered topic cannot lack a queue.
//!
//! Delivery is at-most-once. A store write that fails after a claim is logged
//! and counted; the ticket is not requeued, and cancelling the pool can leave
//! claimed tickets in `Processing`.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use prometheus_jobq::config::PoolConfig;
//! use prometheus_jobq::core::{Context, Request, Scheduler, WorkerPool, wait};
//! use prometheus_jobq::infra::InMemoryTicketStore;
//!
//! let store = InMemoryTicketStore::new();
//! let pool = Arc::new(WorkerPool::new(store.clone(), PoolConfig::new())?);
//! pool.handle("emails", vec![Arc::new(SendEmail)])?;
//!
//! let ctx = Context::background();
//! let runner = tokio::spawn({
//!     let (pool, ctx) = (Arc::clone(&pool), ctx.clone());
//!     async move { pool.run(&ctx).await }
//! });
//!
//! let job = store.schedule(&ctx, Request::new("emails", payload)).await?;
//! wait(&ctx.with_timeout(Duration::from_secs(30)), Duration::from_millis(100), &job).await?;
//! ctx.cancel();
//! runner.await??;
//! ```

mod dispatch;

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

use crate::config::PoolConfig;
use crate::core::audit::AuditSink;
use crate::core::context::Context;
use crate::core::error::JobQueueError;
use crate::core::store::TicketManager;
use crate::core::ticket::Ticket;
use crate::core::worker::Worker;

use dispatch::{claim_loop, execution_loop, ExecutionLoop};

/// Errors that can occur when configuring or running a `WorkerPool`.
#[derive(Debug)]
pub enum PoolError {
    /// `handle` or `run` was called while the pool is running.
    AlreadyRunning,

    /// `run` was called with no registered workers.
    NoWorkers,

    /// The claim loop received a ticket for a topic with no dispatch queue.
    UnroutableTopic(String),

    /// Configuration validation failed.
    InvalidConfig(String),

    /// The ticket store failed in a way the pool cannot recover from.
    Store(JobQueueError),

    /// Internal error (dispatch queue closed, etc.).
    Internal(String),
}

impl fmt::Display for PoolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyRunning => write!(f, "worker pool is already running"),
            Self::NoWorkers => write!(f, "no workers registered"),
            Self::UnroutableTopic(topic) => {
                write!(f, "claimed ticket for unregistered topic `{topic}`")
            }
            Self::InvalidConfig(msg) => write!(f, "invalid configuration: {msg}"),
            Self::Store(err) => write!(f, "ticket store error: {err}"),
            Self::Internal(msg) => write!(f, "internal error: {msg}"),
        }
    }
}

impl std::error::Error for PoolError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            _ => None,
        }
    }
}

impl From<JobQueueError> for PoolError {
    fn from(err: JobQueueError) -> Self {
        Self::Store(err)
    }
}

/// Statistics about pool activity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Registered workers across all topics.
    pub worker_count: usize,

    /// Registered topics.
    pub topic_count: usize,

    /// Tickets currently inside an execution loop.
    pub active_tickets: u64,

    /// Tickets claimed from the store.
    pub claimed_tickets: u64,

    /// Tickets persisted as `Complete`, with or without a worker error.
    pub completed_tickets: u64,

    /// Worker invocations that returned an error.
    pub failed_tickets: u64,

    /// Store writes that failed inside an execution loop.
    pub update_failures: u64,
}

/// Internal counters for pool statistics (thread-safe).
#[derive(Debug, Default)]
pub(crate) struct PoolCounters {
    pub active_tickets: AtomicU64,
    pub claimed_tickets: AtomicU64,
    pub completed_tickets: AtomicU64,
    pub failed_tickets: AtomicU64,
    pub update_failures: AtomicU64,
}

impl PoolCounters {
    /// Get a snapshot of current statistics.
    pub fn snapshot(&self, worker_count: usize, topic_count: usize) -> PoolStats {
        PoolStats {
            worker_count,
            topic_count,
            active_tickets: self.active_tickets.load(Ordering::Relaxed),
            claimed_tickets: self.claimed_tickets.load(Ordering::Relaxed),
            completed_tickets: self.completed_tickets.load(Ordering::Relaxed),
            failed_tickets: self.failed_tickets.load(Ordering::Relaxed),
            update_failures: self.update_failures.load(Ordering::Relaxed),
        }
    }
}

/// Shared, optional audit sink.
pub(crate) type SharedAudit = Option<Arc<Mutex<Box<dyn AuditSink>>>>;

/// Clears the running flag when `run` returns or its future is dropped.
struct RunningGuard<'a>(&'a AtomicBool);

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// A topic's workers and its dispatch queue.
struct TopicRoute {
    workers: Vec<Arc<dyn Worker>>,
    tx: flume::Sender<Ticket>,
    rx: flume::Receiver<Ticket>,
}

/// Pool of topic-subscribed workers fed by a single claim loop.
pub struct WorkerPool<S: TicketManager> {
    config: PoolConfig,
    store: Arc<S>,
    /// Sorted by topic so the claim loop scans topics in a stable order.
    routes: Mutex<BTreeMap<String, TopicRoute>>,
    running: AtomicBool,
    counters: Arc<PoolCounters>,
    audit: SharedAudit,
}

impl<S: TicketManager> WorkerPool<S> {
    /// Create a pool over `store`.
    ///
    /// # Errors
    ///
    /// Returns `PoolError::InvalidConfig` if the configuration is invalid.
    pub fn new(store: S, config: PoolConfig) -> Result<Self, PoolError> {
        config.validate().map_err(PoolError::InvalidConfig)?;
        Ok(Self {
            config,
            store: Arc::new(store),
            routes: Mutex::new(BTreeMap::new()),
            running: AtomicBool::new(false),
            counters: Arc::new(PoolCounters::default()),
            audit: None,
        })
    }

    /// Attach an audit sink.
    #[must_use]
    pub fn with_audit(mut self, audit: Box<dyn AuditSink>) -> Self {
        self.audit = Some(Arc::new(Mutex::new(audit)));
        self
    }

    /// The store this pool claims from.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// The pool configuration.
    pub const fn config(&self) -> &PoolConfig {
        &self.config
    }

    /// Register workers for a topic and provision its dispatch queue.
    ///
    /// Calling it again for the same topic adds workers to that topic; they
    /// share the existing queue.
    ///
    /// # Errors
    ///
    /// - `PoolError::AlreadyRunning` if `run` is in progress
    /// - `PoolError::InvalidConfig` if `workers` is empty
    pub fn handle(
        &self,
        topic: impl Into<String>,
        workers: Vec<Arc<dyn Worker>>,
    ) -> Result<(), PoolError> {
        let topic = topic.into();
        if self.running.load(Ordering::Acquire) {
            return Err(PoolError::AlreadyRunning);
        }
        if workers.is_empty() {
            return Err(PoolError::InvalidConfig(format!(
                "topic `{topic}` registered with no workers"
            )));
        }

        let mut routes = self.routes.lock();
        let capacity = self.config.dispatch_capacity;
        let route = routes.entry(topic).or_insert_with(|| {
            let (tx, rx) = flume::bounded(capacity);
            TopicRoute {
                workers: Vec::new(),
                tx,
                rx,
            }
        });
        route.workers.extend(workers);
        Ok(())
    }

    /// Registered topics in claim order.
    pub fn topics(&self) -> Vec<String> {
        self.routes.lock().keys().cloned().collect()
    }

    /// Get current pool statistics.
    #[must_use]
    pub fn stats(&self) -> PoolStats {
        let routes = self.routes.lock();
        let worker_count = routes.values().map(|r| r.workers.len()).sum();
        self.counters.snapshot(worker_count, routes.len())
    }

    /// Whether `run` is in progress.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Run the claim loop and all execution loops until `ctx` is done.
    ///
    /// Returns `Ok(())` after cancellation once every loop has exited or the
    /// shutdown grace period has passed. Work still running at that point is
    /// aborted.
    ///
    /// # Errors
    ///
    /// - `PoolError::AlreadyRunning` if another `run` is in progress
    /// - `PoolError::NoWorkers` if nothing is registered
    /// - `PoolError::UnroutableTopic` if the store hands back a ticket for a
    ///   topic this pool never registered
    pub async fn run(&self, ctx: &Context) -> Result<(), PoolError> {
        if self.running.swap(true, Ordering::AcqRel) {
            return Err(PoolError::AlreadyRunning);
        }
        let _running = RunningGuard(&self.running);
        self.run_inner(ctx).await
    }

    async fn run_inner(&self, ctx: &Context) -> Result<(), PoolError> {
        let pool_ctx = ctx.child();
        let mut loops = JoinSet::new();

        let (topics, queues) = {
            let routes = self.routes.lock();
            if routes.is_empty() {
                return Err(PoolError::NoWorkers);
            }

            let mut queues = HashMap::with_capacity(routes.len());
            for (topic, route) in routes.iter() {
                for (index, worker) in route.workers.iter().enumerate() {
                    let exec = ExecutionLoop {
                        topic: topic.clone(),
                        index,
                        worker: Arc::clone(worker),
                        rx: route.rx.clone(),
                        store: Arc::clone(&self.store),
                        counters: Arc::clone(&self.counters),
                        audit: self.audit.clone(),
                        grace: self.config.shutdown_grace(),
                    };
                    loops.spawn(execution_loop(pool_ctx.clone(), exec));
                }
                queues.insert(topic.clone(), route.tx.clone());
            }
            let topics: Vec<String> = routes.keys().cloned().collect();
            (topics, queues)
        };

        info!(
            topics = ?topics,
            workers = loops.len(),
            idle_backoff_ms = self.config.idle_backoff_ms,
            "worker pool started"
        );

        let result = claim_loop(
            &pool_ctx,
            self.store.as_ref(),
            &topics,
            &queues,
            self.config.idle_backoff(),
            &self.counters,
            &self.audit,
        )
        .await;

        pool_ctx.cancel();
        if let Err(err) = &result {
            error!(error = %err, "claim loop stopped with error");
        }

        let drained = tokio::time::timeout(self.config.shutdown_grace(), async {
            while let Some(joined) = loops.join_next().await {
                if let Err(err) = joined {
                    if err.is_panic() {
                        error!(error = %err, "execution loop panicked");
                    }
                }
            }
        })
        .await;
        if drained.is_err() {
            warn!(
                remaining = loops.len(),
                grace_ms = self.config.shutdown_grace_ms,
                "execution loops did not stop within grace period; aborting"
            );
            loops.abort_all();
        }

        info!("worker pool stopped");
        result
    }
}
