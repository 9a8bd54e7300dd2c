//! Top-level coordinator owning the queue, worker pool and producer.
//!
//! Lifecycle: `Created → Running → Draining → Terminated`. The dispatcher
//! starts the pool, runs the producer on its own thread, and once the producer
//! returns waits for every worker to exit after observing the closed queue.
//!
//! Cancellation policy: [`ShutdownHandle::shutdown`] stops the producer and
//! cancels the queue. Jobs still pending are removed and reported as dropped;
//! jobs already taken by a worker run to completion. When a shutdown grace
//! period is configured it bounds the wait for the drain, starting when the
//! dispatcher enters `Draining` or at the shutdown request if that came
//! first; workers still busy after it are detached and the report is flagged
//! `timed_out`.

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::config::DispatchConfig;

use super::audit::{build_audit_event, AuditAction, AuditSink, NullAuditSink};
use super::{
    DispatchError, DurationSampler, Job, JobExecutor, JobQueue, Producer, ProducerOutcome,
    StopSignal, WorkerPool,
};

/// Slice of an unbounded drain wait.
const DRAIN_WAIT_SLICE: Duration = Duration::from_millis(100);

/// Dispatcher lifecycle phase. Only ever moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchPhase {
    /// Constructed, nothing started.
    Created,
    /// Producer and workers active.
    Running,
    /// Producer finished; workers draining the queue.
    Draining,
    /// All workers stopped. Terminal.
    Terminated,
}

/// Completion accounting returned by [`Dispatcher::run`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchReport {
    /// Jobs the producer enqueued.
    pub produced: u64,
    /// Jobs already pending in the queue at startup (journal recovery).
    pub recovered: u64,
    /// Jobs workers finished successfully.
    pub completed: u64,
    /// Jobs whose processing faulted.
    pub failed: u64,
    /// Jobs removed from the queue by a shutdown request.
    pub dropped: u64,
    /// Whether a shutdown request was raised.
    pub cancelled: bool,
    /// Whether the grace period elapsed with workers still busy.
    pub timed_out: bool,
}

impl DispatchReport {
    /// Every job that entered the queue is accounted for exactly once.
    #[must_use]
    pub const fn is_balanced(&self) -> bool {
        self.produced + self.recovered == self.completed + self.failed + self.dropped
    }
}

struct Shared {
    phase: Mutex<DispatchPhase>,
    stop: StopSignal,
    cancelled_at: Mutex<Option<Instant>>,
    dropped: Mutex<u64>,
    queue: Arc<dyn JobQueue>,
    audit: Arc<dyn AuditSink>,
}

impl Shared {
    fn advance(&self, next: DispatchPhase) {
        let mut phase = self.phase.lock();
        if next > *phase {
            info!(from = ?*phase, to = ?next, "dispatcher phase changed");
            *phase = next;
        }
    }

    fn shutdown(&self) {
        // held until the dropped count is final so a concurrent report sees it
        let mut dropped_total = self.dropped.lock();
        if !self.stop.raise() {
            return;
        }
        *self.cancelled_at.lock() = Some(Instant::now());
        info!("shutdown requested, cancelling queue");
        let dropped = self.queue.cancel();
        for job in &dropped {
            warn!(sequence = job.sequence(), "job dropped on shutdown");
            self.audit
                .record(build_audit_event(AuditAction::Dropped, job.sequence(), None, None));
        }
        *dropped_total += dropped.len() as u64;
    }

    /// Startup failed: cancel the queue so workers that did start find it
    /// closed and empty, then terminate.
    fn abort_startup(&self) {
        self.shutdown();
        self.advance(DispatchPhase::Terminated);
    }
}

/// Cloneable handle for requesting shutdown and observing the lifecycle.
#[derive(Clone)]
pub struct ShutdownHandle {
    shared: Arc<Shared>,
}

impl ShutdownHandle {
    /// Raise the cancellation signal. Idempotent.
    pub fn shutdown(&self) {
        self.shared.shutdown();
    }

    /// Whether shutdown has been requested.
    #[must_use]
    pub fn is_shutdown(&self) -> bool {
        self.shared.stop.is_raised()
    }

    /// Current lifecycle phase.
    #[must_use]
    pub fn phase(&self) -> DispatchPhase {
        *self.shared.phase.lock()
    }
}

/// Coordinates one producer and one worker pool over a shared queue.
pub struct Dispatcher<E: JobExecutor> {
    config: DispatchConfig,
    executor: E,
    sampler: DurationSampler,
    recovered: u64,
    last_recovered: u64,
    shared: Arc<Shared>,
}

impl<E: JobExecutor> Dispatcher<E> {
    /// Create a dispatcher with uniform durations and no audit sink.
    ///
    /// # Errors
    ///
    /// [`DispatchError::InvalidConfiguration`] if `config` fails validation.
    pub fn new(
        config: DispatchConfig,
        queue: Arc<dyn JobQueue>,
        executor: E,
    ) -> Result<Self, DispatchError> {
        let sampler = config.sampler();
        Self::with_parts(config, queue, executor, sampler, Arc::new(NullAuditSink))
    }

    /// Create a dispatcher with an explicit duration sampler and audit sink.
    ///
    /// # Errors
    ///
    /// [`DispatchError::InvalidConfiguration`] if `config` fails validation.
    pub fn with_parts(
        config: DispatchConfig,
        queue: Arc<dyn JobQueue>,
        executor: E,
        sampler: DurationSampler,
        audit: Arc<dyn AuditSink>,
    ) -> Result<Self, DispatchError> {
        config
            .validate()
            .map_err(DispatchError::InvalidConfiguration)?;
        let pending = queue.pending();
        for job in &pending {
            audit.record(build_audit_event(AuditAction::Recovered, job.sequence(), None, None));
        }
        if !pending.is_empty() {
            info!(recovered = pending.len(), "queue holds jobs recovered from a previous run");
        }
        Ok(Self {
            config,
            executor,
            sampler,
            recovered: pending.len() as u64,
            last_recovered: pending.iter().map(Job::sequence).max().unwrap_or(0),
            shared: Arc::new(Shared {
                phase: Mutex::new(DispatchPhase::Created),
                stop: StopSignal::new(),
                cancelled_at: Mutex::new(None),
                dropped: Mutex::new(0),
                queue,
                audit,
            }),
        })
    }

    /// Handle for requesting shutdown from another thread or a signal handler.
    #[must_use]
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            shared: Arc::clone(&self.shared),
        }
    }

    /// Run to completion: produce every job, drain the queue, stop the pool.
    ///
    /// Blocks the calling thread until the dispatcher is terminated.
    ///
    /// # Errors
    ///
    /// [`DispatchError::ThreadSpawn`] if workers or the producer cannot start.
    /// Failures after startup are contained and reflected in the report.
    pub fn run(self) -> Result<DispatchReport, DispatchError> {
        let Self {
            config,
            executor,
            sampler,
            recovered,
            last_recovered,
            shared,
        } = self;
        let queue = Arc::clone(&shared.queue);
        let producer = Arc::new(
            Producer::new(config.job_limit, config.schedule(), sampler)
                .starting_after(last_recovered),
        );

        shared.advance(DispatchPhase::Running);
        let pool = match WorkerPool::start(
            config.worker_count,
            Arc::clone(&queue),
            executor,
            Arc::clone(&shared.audit),
        ) {
            Ok(pool) => pool,
            Err(e) => {
                shared.abort_startup();
                return Err(e);
            }
        };

        let spawned = {
            let (producer, shared) = (Arc::clone(&producer), Arc::clone(&shared));
            thread::Builder::new()
                .name("dispatch-producer".into())
                .spawn(move || {
                    producer.run(shared.queue.as_ref(), &shared.stop, shared.audit.as_ref())
                })
        };
        let producer_thread = match spawned {
            Ok(handle) => handle,
            Err(e) => {
                shared.abort_startup();
                pool.join();
                return Err(DispatchError::ThreadSpawn(format!("producer: {e}")));
            }
        };

        let outcome = producer_thread.join().unwrap_or_else(|_| {
            error!("producer thread panicked");
            ProducerOutcome::Stopped
        });
        // Exhaustion already closed the queue; every other outcome must too.
        queue.close();
        shared.advance(DispatchPhase::Draining);
        let draining_at = Instant::now();
        info!(outcome = ?outcome, produced = producer.produced(), "producer finished");

        let deadline = config.shutdown_grace().and_then(|grace| {
            let started = shared
                .cancelled_at
                .lock()
                .map_or(draining_at, |at| at.min(draining_at));
            started.checked_add(grace)
        });
        let timed_out = await_workers(deadline, &pool);
        if timed_out {
            warn!(
                live_workers = pool.live_workers(),
                "grace period elapsed, detaching remaining workers"
            );
            pool.detach();
        } else {
            pool.join();
        }

        let stats = pool.stats();
        let (dropped, cancelled) = {
            let dropped = shared.dropped.lock();
            (*dropped, shared.stop.is_raised())
        };
        let report = DispatchReport {
            produced: producer.produced(),
            recovered,
            completed: stats.completed_jobs,
            failed: stats.failed_jobs,
            dropped,
            cancelled,
            timed_out,
        };
        shared.advance(DispatchPhase::Terminated);
        info!(
            produced = report.produced,
            recovered = report.recovered,
            completed = report.completed,
            failed = report.failed,
            dropped = report.dropped,
            balanced = report.is_balanced(),
            "dispatcher terminated"
        );
        Ok(report)
    }
}

/// Wait for every worker to exit. Returns `true` if `deadline` passed first;
/// without a deadline the wait is unbounded.
fn await_workers(deadline: Option<Instant>, pool: &WorkerPool) -> bool {
    match deadline {
        Some(deadline) => !pool.wait_exited(deadline),
        None => {
            while !pool.wait_exited(Instant::now() + DRAIN_WAIT_SLICE) {}
            false
        }
    }
}
