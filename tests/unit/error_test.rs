//! Tests for error types

use prometheus_jobq::core::{Body, JobQueueError, Phase, PoolError, TicketId};

#[test]
fn test_not_found_error() {
    assert_eq!(format!("{}", JobQueueError::not_found()), "ticket not found");
    let err = JobQueueError::ticket_not_found(TicketId::from("t-1"));
    assert_eq!(format!("{}", err), "ticket not found: t-1");
    assert!(err.is_not_found());
}

#[test]
fn test_cancellation_errors() {
    assert_eq!(format!("{}", JobQueueError::Cancelled), "context cancelled");
    assert_eq!(
        format!("{}", JobQueueError::DeadlineExceeded),
        "context deadline exceeded"
    );
    assert!(JobQueueError::Cancelled.is_cancellation());
    assert!(!JobQueueError::not_found().is_cancellation());
}

#[test]
fn test_invalid_transition_error() {
    let err = JobQueueError::InvalidTransition {
        id: TicketId::from("t-1"),
        from: Phase::Complete,
        to: Phase::Pending,
    };
    assert_eq!(
        format!("{}", err),
        "ticket t-1: invalid phase transition COMPLETE -> PENDING"
    );
}

#[test]
fn test_unmarshal_error() {
    let body = Body::from(b"not json".to_vec());
    let err = body.decode::<u32>().unwrap_err();
    assert!(matches!(err, JobQueueError::Unmarshal(_)));
    assert!(format!("{}", err).starts_with("unmarshal ticket body:"));
}

#[test]
fn test_backend_error() {
    let err = JobQueueError::Backend("connection failed".to_string());
    assert_eq!(format!("{}", err), "backend error: connection failed");
}

#[test]
fn test_pool_error_wraps_store_error() {
    let err = PoolError::from(JobQueueError::Backend("down".into()));
    assert!(matches!(err, PoolError::Store(_)));
    assert!(std::error::Error::source(&err).is_some());
    assert!(format!("{}", err).contains("down"));
}
