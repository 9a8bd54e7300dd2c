//! Audit sink implementations.
//!
//! Every job lifecycle transition is both logged through `tracing` and handed to
//! an [`AuditSink`], so emissions and completions can be asserted on in tests.

use std::collections::VecDeque;
use std::fmt;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::util::clock::now_ms;

/// Lifecycle action recorded for a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    /// Producer enqueued the job.
    Emitted,
    /// A worker dequeued the job.
    Received,
    /// A worker finished the job.
    Completed,
    /// Processing faulted; the worker carried on.
    Failed,
    /// Removed from the queue on cancellation before any worker took it.
    Dropped,
    /// Found pending in a journal at startup.
    Recovered,
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Emitted => "emitted",
            Self::Received => "received",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Dropped => "dropped",
            Self::Recovered => "recovered",
        };
        f.write_str(s)
    }
}

/// Audit event structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Event identifier.
    pub event_id: String,
    /// Action taken.
    pub action: AuditAction,
    /// Job sequence number.
    pub sequence: u64,
    /// Worker that handled the job, when applicable.
    pub worker_id: Option<usize>,
    /// Seconds spent processing, for completed and failed jobs.
    pub elapsed_secs: Option<f64>,
    /// Timestamp milliseconds.
    pub created_at_ms: u128,
}

/// Audit sink abstraction.
pub trait AuditSink: Send + Sync {
    /// Record an audit event.
    fn record(&self, event: AuditEvent);
}

/// Sink that discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullAuditSink;

impl AuditSink for NullAuditSink {
    fn record(&self, _event: AuditEvent) {}
}

/// In-memory audit sink for testing and dev.
pub struct InMemoryAuditSink {
    events: Mutex<VecDeque<AuditEvent>>,
    max_events: usize,
}

impl InMemoryAuditSink {
    /// Create a new in-memory sink with a bounded buffer.
    #[must_use]
    pub fn new(max_events: usize) -> Self {
        Self {
            events: Mutex::new(VecDeque::with_capacity(max_events.min(1024))),
            max_events,
        }
    }

    /// Retrieve a snapshot of stored events.
    pub fn events(&self) -> Vec<AuditEvent> {
        self.events.lock().iter().cloned().collect()
    }

    /// Sequence numbers of events with the given action, in recording order.
    pub fn sequences(&self, action: AuditAction) -> Vec<u64> {
        self.events
            .lock()
            .iter()
            .filter(|e| e.action == action)
            .map(|e| e.sequence)
            .collect()
    }
}

impl AuditSink for InMemoryAuditSink {
    fn record(&self, event: AuditEvent) {
        let mut events = self.events.lock();
        if events.len() >= self.max_events {
            events.pop_front();
        }
        events.push_back(event);
    }
}

/// Helper to build an audit event from context.
#[must_use]
pub fn build_audit_event(
    action: AuditAction,
    sequence: u64,
    worker_id: Option<usize>,
    elapsed_secs: Option<f64>,
) -> AuditEvent {
    AuditEvent {
        event_id: uuid::Uuid::new_v4().to_string(),
        action,
        sequence,
        worker_id,
        elapsed_secs,
        created_at_ms: now_ms(),
    }
}
