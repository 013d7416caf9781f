//! Builders to construct worker pools from configuration.

use std::sync::Arc;

use crate::config::{JobQueueConfig, PoolConfig};
use crate::core::{AuditSink, PoolError, TicketManager, Worker, WorkerPool};

/// Step-by-step construction of a [`WorkerPool`] with its registrations.
pub struct WorkerPoolBuilder<S: TicketManager> {
    store: S,
    config: PoolConfig,
    audit: Option<Box<dyn AuditSink>>,
    registrations: Vec<(String, Vec<Arc<dyn Worker>>)>,
}

impl<S: TicketManager> WorkerPoolBuilder<S> {
    /// Start a builder over `store` with default configuration.
    pub fn new(store: S) -> Self {
        Self {
            store,
            config: PoolConfig::default(),
            audit: None,
            registrations: Vec::new(),
        }
    }

    /// Use the given pool configuration.
    #[must_use]
    pub fn config(mut self, config: PoolConfig) -> Self {
        self.config = config;
        self
    }

    /// Attach an audit sink.
    #[must_use]
    pub fn audit(mut self, sink: Box<dyn AuditSink>) -> Self {
        self.audit = Some(sink);
        self
    }

    /// Register workers for a topic.
    #[must_use]
    pub fn handle(mut self, topic: impl Into<String>, workers: Vec<Arc<dyn Worker>>) -> Self {
        self.registrations.push((topic.into(), workers));
        self
    }

    /// Register `count` handles to the same worker for a topic.
    #[must_use]
    pub fn handle_n(self, topic: impl Into<String>, worker: Arc<dyn Worker>, count: usize) -> Self {
        let workers = (0..count).map(|_| Arc::clone(&worker)).collect();
        self.handle(topic, workers)
    }

    /// The configuration the pool will be built with.
    pub const fn pool_config(&self) -> &PoolConfig {
        &self.config
    }

    /// Validate configuration, create the pool, and apply registrations.
    ///
    /// # Errors
    ///
    /// Returns `PoolError::InvalidConfig` for bad configuration or a topic
    /// registered with no workers.
    pub fn build(self) -> Result<WorkerPool<S>, PoolError> {
        let mut pool = WorkerPool::new(self.store, self.config)?;
        if let Some(sink) = self.audit {
            pool = pool.with_audit(sink);
        }
        for (topic, workers) in self.registrations {
            pool.handle(topic, workers)?;
        }
        Ok(pool)
    }
}

/// Build a pool from root configuration and a list of registrations.
///
/// # Errors
///
/// Returns `PoolError::InvalidConfig` if any section of `cfg` is invalid or a
/// registration has no workers.
pub fn build_pool<S, I>(
    cfg: &JobQueueConfig,
    store: S,
    registrations: I,
) -> Result<WorkerPool<S>, PoolError>
where
    S: TicketManager,
    I: IntoIterator<Item = (String, Vec<Arc<dyn Worker>>)>,
{
    cfg.validate()
        .map_err(|e| PoolError::InvalidConfig(format!("config invalid: {e}")))?;

    let builder = WorkerPoolBuilder::new(store).config(cfg.pool.clone());
    registrations
        .into_iter()
        .fold(builder, |builder, (topic, workers)| builder.handle(topic, workers))
        .build()
}
