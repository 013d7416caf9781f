//! Tests for utility functions

use prometheus_jobq::core::{Body, Phase, Ticket, TicketId};
use prometheus_jobq::util::{init_tracing, now_ms};

#[test]
fn test_now_ms_is_epoch_millis() {
    // 2020-01-01T00:00:00Z
    assert!(now_ms() > 1_577_836_800_000);
}

#[test]
fn test_init_tracing_is_idempotent() {
    init_tracing();
    init_tracing();
    tracing::info!("tracing initialized twice");
}

#[test]
fn test_ticket_id_generation() {
    let a = TicketId::generate();
    let b = TicketId::generate();
    assert_ne!(a, b);
    assert_eq!(TicketId::from("abc").as_str(), "abc");
    assert_eq!(TicketId::from("abc").to_string(), "abc");
}

#[test]
fn test_phase_order() {
    assert!(Phase::Pending.can_transition_to(Phase::Processing));
    assert!(Phase::Processing.can_transition_to(Phase::Complete));
    assert!(Phase::Processing.can_transition_to(Phase::Processing));
    assert!(!Phase::Pending.can_transition_to(Phase::Complete));
    assert!(!Phase::Processing.can_transition_to(Phase::Pending));
    assert!(!Phase::Complete.can_transition_to(Phase::Complete));
    assert_eq!(Phase::Processing.to_string(), "PROCESSING");
}

#[test]
fn test_ticket_serializes_phase_in_upper_case() {
    let ticket = Ticket::new("t1", Body::encode(&1).unwrap(), 42);
    let json = serde_json::to_value(&ticket).unwrap();
    assert_eq!(json["phase"], "PENDING");
    assert_eq!(json["topic"], "t1");
}
