//! Error types for dispatch operations.

use thiserror::Error;

/// Errors raised while constructing a [`Job`](crate::core::Job).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum JobError {
    /// Sequence numbers start at 1.
    #[error("sequence number must be at least 1")]
    ZeroSequence,
    /// Duration is negative, NaN, infinite or beyond what `Duration` holds.
    #[error("invalid duration: {0}")]
    InvalidDuration(f64),
}

/// Errors produced by job queue backends.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueueError {
    /// The queue has been closed. Expected control flow rather than a failure.
    #[error("queue closed")]
    Closed,
    /// Backend-specific failure with context.
    #[error("backend error: {0}")]
    Backend(String),
}

/// Fault raised while processing a single job. Recovered at the worker boundary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("job {sequence} failed: {reason}")]
pub struct JobFault {
    /// Sequence number of the faulting job.
    pub sequence: u64,
    /// Human-readable cause.
    pub reason: String,
}

impl JobFault {
    /// Build a fault for the given job sequence.
    pub fn new(sequence: u64, reason: impl Into<String>) -> Self {
        Self {
            sequence,
            reason: reason.into(),
        }
    }
}

/// Errors that stop a dispatcher from starting or running.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Configuration rejected at startup.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
    /// Queue backend failure outside normal close handling.
    #[error(transparent)]
    Queue(#[from] QueueError),
    /// A worker or producer thread could not be spawned.
    #[error("failed to spawn thread: {0}")]
    ThreadSpawn(String),
}

/// Application-facing result using anyhow for higher-level contexts.
pub type AppResult<T> = Result<T, anyhow::Error>;
