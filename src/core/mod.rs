//! Core dispatch abstractions: jobs, the queue contract, workers, producer and
//! the coordinating dispatcher.

pub mod audit;
pub mod dispatcher;
pub mod error;
pub mod executor;
pub mod job;
pub mod producer;
pub mod queue;
pub mod signal;
pub mod worker_pool;

pub use audit::{
    build_audit_event, AuditAction, AuditEvent, AuditSink, InMemoryAuditSink, NullAuditSink,
};
pub use dispatcher::{DispatchPhase, DispatchReport, Dispatcher, ShutdownHandle};
pub use error::{AppResult, DispatchError, JobError, JobFault, QueueError};
pub use executor::{JobExecutor, SimulatedWork};
pub use job::{DurationSampler, Job};
pub use producer::{Producer, ProducerOutcome, Schedule};
pub use queue::JobQueue;
pub use signal::StopSignal;
pub use worker_pool::{PoolStats, WorkerPool, WorkerState};
