//! Tests for audit sink

use work_dispatch::core::{build_audit_event, AuditAction, AuditSink, InMemoryAuditSink};

#[test]
fn test_in_memory_audit_sink() {
    let sink = InMemoryAuditSink::new(10);

    let event = build_audit_event(AuditAction::Completed, 7, Some(1), Some(0.25));

    sink.record(event.clone());
    assert_eq!(sink.events().len(), 1);

    let events = sink.events();
    assert_eq!(events[0].event_id, event.event_id);
    assert_eq!(events[0].sequence, 7);
    assert_eq!(events[0].worker_id, Some(1));
    assert_eq!(events[0].action, AuditAction::Completed);
}

#[test]
fn test_audit_sink_overflow() {
    let sink = InMemoryAuditSink::new(2);

    sink.record(build_audit_event(AuditAction::Emitted, 1, None, None));
    sink.record(build_audit_event(AuditAction::Emitted, 2, None, None));
    sink.record(build_audit_event(AuditAction::Emitted, 3, None, None));

    let events = sink.events();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].sequence, 2); // First one popped
    assert_eq!(events[1].sequence, 3);
}

#[test]
fn test_build_audit_event() {
    let event = build_audit_event(AuditAction::Dropped, 4, None, None);

    assert_eq!(event.action, AuditAction::Dropped);
    assert_eq!(event.sequence, 4);
    assert!(event.worker_id.is_none());
    assert!(event.elapsed_secs.is_none());
    assert!(event.created_at_ms > 0);
    assert!(!event.event_id.is_empty());
}

#[test]
fn test_audit_event_serializes_action_snake_case() {
    let event = build_audit_event(AuditAction::Recovered, 1, None, None);
    let json = serde_json::to_string(&event).unwrap();
    assert!(json.contains(r#""action":"recovered""#));
}
