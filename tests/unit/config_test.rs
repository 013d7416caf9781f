//! Tests for configuration validation

use std::collections::HashMap;
use std::time::Duration;

use prometheus_jobq::config::{JobQueueConfig, PoolConfig, WaitConfig};

#[test]
fn test_pool_config_defaults() {
    let cfg = PoolConfig::default();
    assert_eq!(cfg.idle_backoff_ms, 50);
    assert_eq!(cfg.dispatch_capacity, 1);
    assert_eq!(cfg.shutdown_grace_ms, 5_000);
    assert_eq!(cfg.idle_backoff(), Duration::from_millis(50));
    assert!(cfg.validate().is_ok());
}

#[test]
fn test_pool_config_invalid_backoff() {
    let invalid = PoolConfig::new().with_idle_backoff_ms(0);
    assert!(invalid.validate().is_err());
}

#[test]
fn test_pool_config_invalid_capacity() {
    let invalid = PoolConfig::new().with_dispatch_capacity(0);
    assert!(invalid.validate().is_err());
}

#[test]
fn test_pool_config_invalid_grace() {
    let invalid = PoolConfig::new().with_shutdown_grace_ms(0);
    assert!(invalid.validate().is_err());
}

#[test]
fn test_wait_config_validation() {
    assert!(WaitConfig::default().validate().is_ok());
    assert_eq!(WaitConfig::default().poll_interval(), Duration::from_millis(100));
    let invalid = WaitConfig { poll_interval_ms: 0 };
    assert!(invalid.validate().is_err());
}

#[test]
fn test_config_from_json_with_defaults() {
    let cfg = JobQueueConfig::from_json_str(r#"{"pool": {"dispatch_capacity": 4}}"#).unwrap();
    assert_eq!(cfg.pool.dispatch_capacity, 4);
    assert_eq!(cfg.pool.idle_backoff_ms, 50);
    assert_eq!(cfg.wait, WaitConfig::default());
}

#[test]
fn test_config_from_json_rejects_invalid() {
    let err = JobQueueConfig::from_json_str(r#"{"wait": {"poll_interval_ms": 0}}"#).unwrap_err();
    assert!(err.starts_with("wait invalid"));
    assert!(JobQueueConfig::from_json_str("{not json").is_err());
}

#[test]
fn test_config_from_lookup() {
    let vars: HashMap<&str, &str> = [
        ("JOBQ_IDLE_BACKOFF_MS", "10"),
        ("JOBQ_POLL_INTERVAL_MS", "25"),
    ]
    .into_iter()
    .collect();
    let cfg = JobQueueConfig::from_lookup(|name| vars.get(name).map(|v| (*v).to_string())).unwrap();
    assert_eq!(cfg.pool.idle_backoff_ms, 10);
    assert_eq!(cfg.wait.poll_interval_ms, 25);
    assert_eq!(cfg.pool.dispatch_capacity, 1);
}

#[test]
fn test_config_from_lookup_rejects_garbage() {
    let err = JobQueueConfig::from_lookup(|name| {
        (name == "JOBQ_DISPATCH_CAPACITY").then(|| "many".to_string())
    })
    .unwrap_err();
    assert!(err.contains("JOBQ_DISPATCH_CAPACITY"));
}
