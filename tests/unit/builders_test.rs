//! Tests for builder modules

use std::sync::Arc;

use prometheus_jobq::builders::{build_pool, WorkerPoolBuilder};
use prometheus_jobq::config::{JobQueueConfig, PoolConfig};
use prometheus_jobq::core::{Body, Context, InMemoryAuditSink, PoolError, Worker, WorkerFn};
use prometheus_jobq::infra::InMemoryTicketStore;

fn noop() -> Arc<dyn Worker> {
    Arc::new(WorkerFn::new(|_ctx: Context, _body: Body| async {
        Ok::<(), anyhow::Error>(())
    }))
}

#[test]
fn test_pool_builder_defaults() {
    let builder = WorkerPoolBuilder::new(InMemoryTicketStore::new());
    assert_eq!(builder.pool_config(), &PoolConfig::default());

    let pool = builder.build().unwrap();
    assert!(pool.topics().is_empty());
    assert!(!pool.is_running());
}

#[test]
fn test_pool_builder_registers_topics() {
    let pool = WorkerPoolBuilder::new(InMemoryTicketStore::new())
        .config(PoolConfig::new().with_dispatch_capacity(2))
        .audit(Box::new(InMemoryAuditSink::new(16)))
        .handle("a", vec![noop()])
        .handle_n("b", noop(), 3)
        .build()
        .unwrap();

    assert_eq!(pool.topics(), vec!["a".to_string(), "b".to_string()]);
    let stats = pool.stats();
    assert_eq!(stats.topic_count, 2);
    assert_eq!(stats.worker_count, 4);
    assert_eq!(pool.config().dispatch_capacity, 2);
}

#[test]
fn test_pool_builder_rejects_empty_registration() {
    let result = WorkerPoolBuilder::new(InMemoryTicketStore::new())
        .handle("a", Vec::new())
        .build();
    assert!(matches!(result, Err(PoolError::InvalidConfig(_))));
}

#[test]
fn test_pool_builder_rejects_invalid_config() {
    let result = WorkerPoolBuilder::new(InMemoryTicketStore::new())
        .config(PoolConfig::new().with_idle_backoff_ms(0))
        .build();
    assert!(matches!(result, Err(PoolError::InvalidConfig(_))));
}

#[test]
fn test_build_pool_from_config() {
    let cfg = JobQueueConfig::default();
    let pool = build_pool(
        &cfg,
        InMemoryTicketStore::new(),
        vec![("resize".to_string(), vec![noop(), noop()])],
    )
    .unwrap();
    assert_eq!(pool.stats().worker_count, 2);
}

#[test]
fn test_build_pool_rejects_invalid_wait_config() {
    let mut cfg = JobQueueConfig::default();
    cfg.wait.poll_interval_ms = 0;
    let result = build_pool(&cfg, InMemoryTicketStore::new(), Vec::new());
    assert!(matches!(result, Err(PoolError::InvalidConfig(_))));
}
