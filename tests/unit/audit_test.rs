//! Tests for audit sink

use prometheus_jobq::core::{
    build_audit_event, AuditAction, AuditSink, Body, InMemoryAuditSink, Ticket,
};

fn ticket(topic: &str) -> Ticket {
    Ticket::new(topic, Body::from(b"{}".to_vec()), 1)
}

#[test]
fn test_in_memory_audit_sink() {
    let mut sink = InMemoryAuditSink::new(10);
    let t = ticket("t1");

    sink.record(build_audit_event(&t, AuditAction::Claimed, None));
    sink.record(build_audit_event(&t, AuditAction::Completed, Some("boom".into())));

    let events = sink.events();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].ticket_id, t.id.to_string());
    assert_eq!(events[0].topic, "t1");
    assert_eq!(events[0].action, AuditAction::Claimed);
    assert_eq!(events[1].detail.as_deref(), Some("boom"));
}

#[test]
fn test_audit_sink_overflow() {
    let mut sink = InMemoryAuditSink::new(2);
    let (a, b, c) = (ticket("t1"), ticket("t1"), ticket("t1"));

    sink.record(build_audit_event(&a, AuditAction::Claimed, None));
    sink.record(build_audit_event(&b, AuditAction::Claimed, None));
    sink.record(build_audit_event(&c, AuditAction::Claimed, None));

    let events = sink.events();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].ticket_id, b.id.to_string()); // First one popped
    assert_eq!(events[1].ticket_id, c.id.to_string());
}

#[test]
fn test_audit_sink_zero_capacity_records_nothing() {
    let mut sink = InMemoryAuditSink::new(0);
    sink.record(build_audit_event(&ticket("t1"), AuditAction::Started, None));
    assert!(sink.events().is_empty());
}

#[test]
fn test_events_for_filters_by_ticket() {
    let mut sink = InMemoryAuditSink::new(10);
    let (a, b) = (ticket("t1"), ticket("t2"));
    sink.record(build_audit_event(&a, AuditAction::Claimed, None));
    sink.record(build_audit_event(&b, AuditAction::Claimed, None));
    sink.record(build_audit_event(&a, AuditAction::Started, None));

    let actions: Vec<_> = sink
        .events_for(a.id.as_str())
        .into_iter()
        .map(|e| e.action)
        .collect();
    assert_eq!(actions, vec![AuditAction::Claimed, AuditAction::Started]);
}

#[test]
fn test_audit_action_display() {
    assert_eq!(AuditAction::UpdateFailed.to_string(), "update_failed");
    assert_eq!(AuditAction::Completed.to_string(), "completed");
}
