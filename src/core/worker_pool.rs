//! Fixed-size worker pool draining a [`JobQueue`].
//!
//! Each worker is a dedicated OS thread owning a single-threaded tokio runtime
//! that drives the [`JobExecutor`]. Workers block on `dequeue`, so an idle pool
//! costs nothing, and exit on their own once the queue reports closed and
//! empty.
//!
//! # Design Principles
//!
//! - **No polling**: workers park on the queue's condition variable
//! - **Fault isolation**: executor errors and panics are contained per job
//! - **Clean shutdown**: closing the queue is the only stop primitive

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;

use parking_lot::{Condvar, Mutex};
use tracing::{debug, error, info, warn};

use super::audit::{build_audit_event, AuditAction, AuditSink};
use super::{DispatchError, Job, JobExecutor, JobQueue, QueueError};

/// What a worker is doing right now.
#[derive(Debug, Clone, PartialEq)]
pub enum WorkerState {
    /// Parked on the queue or not yet started.
    Idle,
    /// Executing the contained job.
    Processing(Job),
}

/// Statistics about pool utilization.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Number of worker threads.
    pub worker_count: usize,
    /// Workers currently executing a job.
    pub active_jobs: u64,
    /// Jobs finished successfully.
    pub completed_jobs: u64,
    /// Jobs whose processing faulted.
    pub failed_jobs: u64,
}

/// Internal counters for pool statistics (thread-safe).
#[derive(Debug, Default)]
pub(crate) struct PoolCounters {
    pub active_jobs: AtomicU64,
    pub completed_jobs: AtomicU64,
    pub failed_jobs: AtomicU64,
}

impl PoolCounters {
    /// Get a snapshot of current statistics.
    pub fn snapshot(&self, worker_count: usize) -> PoolStats {
        PoolStats {
            worker_count,
            active_jobs: self.active_jobs.load(Ordering::Acquire),
            completed_jobs: self.completed_jobs.load(Ordering::Acquire),
            failed_jobs: self.failed_jobs.load(Ordering::Acquire),
        }
    }
}

/// Count of live workers with a condition variable signalled on each exit.
#[derive(Default)]
struct LiveWorkers {
    count: Mutex<usize>,
    exited: Condvar,
}

/// Decrements the live count when a worker thread ends, panicking or not.
struct ExitGuard {
    live: Arc<LiveWorkers>,
    worker_id: usize,
}

impl Drop for ExitGuard {
    fn drop(&mut self) {
        let mut count = self.live.count.lock();
        *count = count.saturating_sub(1);
        self.live.exited.notify_all();
        debug!(worker_id = self.worker_id, remaining = *count, "worker thread exiting");
    }
}

/// Everything a worker thread needs, moved in at spawn.
struct WorkerContext<E> {
    worker_id: usize,
    queue: Arc<dyn JobQueue>,
    executor: E,
    audit: Arc<dyn AuditSink>,
    counters: Arc<PoolCounters>,
    states: Arc<Vec<Mutex<WorkerState>>>,
}

/// Fixed set of worker threads consuming one shared queue.
pub struct WorkerPool {
    worker_count: usize,
    counters: Arc<PoolCounters>,
    states: Arc<Vec<Mutex<WorkerState>>>,
    live: Arc<LiveWorkers>,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

impl WorkerPool {
    /// Spawn `worker_count` workers against `queue`.
    ///
    /// # Errors
    ///
    /// [`DispatchError::InvalidConfiguration`] for zero workers, or
    /// [`DispatchError::ThreadSpawn`] if a runtime or thread cannot be created.
    /// Workers spawned before the failure keep running until the queue is
    /// closed; the dispatcher cancels it on that path.
    pub fn start<E: JobExecutor>(
        worker_count: usize,
        queue: Arc<dyn JobQueue>,
        executor: E,
        audit: Arc<dyn AuditSink>,
    ) -> Result<Self, DispatchError> {
        if worker_count == 0 {
            return Err(DispatchError::InvalidConfiguration(
                "worker_count must be greater than 0".into(),
            ));
        }

        let counters = Arc::new(PoolCounters::default());
        let states: Arc<Vec<Mutex<WorkerState>>> =
            Arc::new((0..worker_count).map(|_| Mutex::new(WorkerState::Idle)).collect());
        let live = Arc::new(LiveWorkers::default());
        let mut workers = Vec::with_capacity(worker_count);

        for worker_id in 0..worker_count {
            let ctx = WorkerContext {
                worker_id,
                queue: Arc::clone(&queue),
                executor: executor.clone(),
                audit: Arc::clone(&audit),
                counters: Arc::clone(&counters),
                states: Arc::clone(&states),
            };
            workers.push(spawn_worker(ctx, Arc::clone(&live))?);
        }

        info!(
            worker_count = worker_count,
            queue_capacity = queue.capacity(),
            "worker pool started"
        );

        Ok(Self {
            worker_count,
            counters,
            states,
            live,
            workers: Mutex::new(workers),
        })
    }

    /// Number of workers in the pool.
    #[must_use]
    pub const fn worker_count(&self) -> usize {
        self.worker_count
    }

    /// Get current pool statistics.
    #[must_use]
    pub fn stats(&self) -> PoolStats {
        self.counters.snapshot(self.worker_count)
    }

    /// Snapshot of each worker's state, indexed by worker id.
    #[must_use]
    pub fn worker_states(&self) -> Vec<WorkerState> {
        self.states.iter().map(|s| s.lock().clone()).collect()
    }

    /// Workers whose thread has not yet exited.
    #[must_use]
    pub fn live_workers(&self) -> usize {
        *self.live.count.lock()
    }

    /// Park until every worker has exited or `deadline` passes.
    /// Returns `true` if all workers have exited.
    pub fn wait_exited(&self, deadline: Instant) -> bool {
        let mut count = self.live.count.lock();
        while *count > 0 {
            if self.live.exited.wait_until(&mut count, deadline).timed_out() {
                return *count == 0;
            }
        }
        true
    }

    /// Join every worker thread. Blocks until the queue closes and drains.
    pub fn join(&self) {
        let mut workers = self.workers.lock();
        for (worker_id, handle) in workers.drain(..).enumerate() {
            if handle.join().is_err() {
                warn!(worker_id = worker_id, "worker thread panicked");
            }
        }
        info!(worker_count = self.worker_count, "worker pool shut down");
    }

    /// Drop the join handles so remaining workers finish in the background.
    pub fn detach(&self) {
        let mut workers = self.workers.lock();
        let remaining = self.live_workers();
        workers.clear();
        warn!(remaining = remaining, "detached workers still processing");
    }
}

fn spawn_worker<E: JobExecutor>(
    ctx: WorkerContext<E>,
    live: Arc<LiveWorkers>,
) -> Result<JoinHandle<()>, DispatchError> {
    let worker_id = ctx.worker_id;
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| DispatchError::ThreadSpawn(format!("worker {worker_id} runtime: {e}")))?;

    *live.count.lock() += 1;
    let guard = ExitGuard {
        live: Arc::clone(&live),
        worker_id,
    };

    thread::Builder::new()
        .name(format!("dispatch-worker-{worker_id}"))
        .spawn(move || {
            let _guard = guard;
            debug!(worker_id = worker_id, "worker thread started");
            worker_loop(&ctx, &rt);
        })
        .map_err(|e| DispatchError::ThreadSpawn(format!("worker {worker_id}: {e}")))
}

fn worker_loop<E: JobExecutor>(ctx: &WorkerContext<E>, rt: &tokio::runtime::Runtime) {
    let worker_id = ctx.worker_id;
    loop {
        let job = match ctx.queue.dequeue() {
            Ok(job) => job,
            Err(QueueError::Closed) => {
                debug!(worker_id = worker_id, "queue closed, worker stopping");
                break;
            }
            Err(e) => {
                error!(worker_id = worker_id, error = %e, "dequeue failed, worker stopping");
                break;
            }
        };

        let sequence = job.sequence();
        *ctx.states[worker_id].lock() = WorkerState::Processing(job.clone());
        ctx.counters.active_jobs.fetch_add(1, Ordering::AcqRel);
        ctx.audit
            .record(build_audit_event(AuditAction::Received, sequence, Some(worker_id), None));
        info!(
            worker_id = worker_id,
            sequence = sequence,
            duration_secs = job.duration_secs(),
            "job received"
        );

        let started = Instant::now();
        let outcome = catch_unwind(AssertUnwindSafe(|| rt.block_on(ctx.executor.execute(&job))));
        let elapsed_secs = started.elapsed().as_secs_f64();

        let action = match outcome {
            Ok(Ok(())) => {
                ctx.counters.completed_jobs.fetch_add(1, Ordering::AcqRel);
                info!(
                    worker_id = worker_id,
                    sequence = sequence,
                    elapsed_secs = elapsed_secs,
                    "job completed"
                );
                AuditAction::Completed
            }
            Ok(Err(fault)) => {
                ctx.counters.failed_jobs.fetch_add(1, Ordering::AcqRel);
                warn!(
                    worker_id = worker_id,
                    sequence = sequence,
                    elapsed_secs = elapsed_secs,
                    error = %fault,
                    "job failed"
                );
                AuditAction::Failed
            }
            Err(panic) => {
                ctx.counters.failed_jobs.fetch_add(1, Ordering::AcqRel);
                error!(
                    worker_id = worker_id,
                    sequence = sequence,
                    elapsed_secs = elapsed_secs,
                    panic = panic_message(panic.as_ref()),
                    "job panicked"
                );
                AuditAction::Failed
            }
        };
        ctx.audit.record(build_audit_event(
            action,
            sequence,
            Some(worker_id),
            Some(elapsed_secs),
        ));

        ctx.counters.active_jobs.fetch_sub(1, Ordering::AcqRel);
        *ctx.states[worker_id].lock() = WorkerState::Idle;
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> &str {
    panic
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| panic.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{JobFault, NullAuditSink, SimulatedWork};
    use crate::infra::queue::InMemoryJobQueue;
    use async_trait::async_trait;
    use std::time::Duration;

    /// Fails every job whose sequence is divisible by three; panics on 5.
    #[derive(Clone)]
    struct FlakyExecutor;

    #[async_trait]
    impl JobExecutor for FlakyExecutor {
        async fn execute(&self, job: &Job) -> Result<(), JobFault> {
            match job.sequence() {
                5 => panic!("boom"),
                s if s % 3 == 0 => Err(JobFault::new(s, "divisible by three")),
                _ => Ok(()),
            }
        }
    }

    fn queue_with(jobs: u64, capacity: usize) -> Arc<dyn JobQueue> {
        let queue = Arc::new(InMemoryJobQueue::new(capacity));
        for seq in 1..=jobs {
            queue.enqueue(Job::new(seq, 0.0).unwrap()).unwrap();
        }
        queue
    }

    #[test]
    fn test_pool_drains_closed_queue() {
        let queue = queue_with(10, 16);
        queue.close();
        let pool = WorkerPool::start(3, Arc::clone(&queue), SimulatedWork, Arc::new(NullAuditSink))
            .unwrap();
        assert!(pool.wait_exited(Instant::now() + Duration::from_secs(5)));
        pool.join();
        let stats = pool.stats();
        assert_eq!(stats.completed_jobs, 10);
        assert_eq!(stats.failed_jobs, 0);
        assert_eq!(stats.active_jobs, 0);
        assert_eq!(pool.live_workers(), 0);
        assert!(pool.worker_states().iter().all(|s| *s == WorkerState::Idle));
    }

    #[test]
    fn test_faults_do_not_stop_pool() {
        let queue = queue_with(9, 16);
        queue.close();
        let pool = WorkerPool::start(1, Arc::clone(&queue), FlakyExecutor, Arc::new(NullAuditSink))
            .unwrap();
        pool.join();
        let stats = pool.stats();
        // 3, 6, 9 fault and 5 panics
        assert_eq!(stats.failed_jobs, 4);
        assert_eq!(stats.completed_jobs, 5);
    }

    #[test]
    fn test_zero_workers_rejected() {
        let queue = queue_with(0, 1);
        let result = WorkerPool::start(0, queue, SimulatedWork, Arc::new(NullAuditSink));
        assert!(matches!(result, Err(DispatchError::InvalidConfiguration(_))));
    }

    #[test]
    fn test_worker_reports_processing_state() {
        let queue: Arc<dyn JobQueue> = Arc::new(InMemoryJobQueue::new(2));
        queue.enqueue(Job::new(1, 0.3).unwrap()).unwrap();
        let pool = WorkerPool::start(1, Arc::clone(&queue), SimulatedWork, Arc::new(NullAuditSink))
            .unwrap();
        thread::sleep(Duration::from_millis(100));
        assert_eq!(
            pool.worker_states(),
            vec![WorkerState::Processing(Job::new(1, 0.3).unwrap())]
        );
        assert_eq!(pool.stats().active_jobs, 1);
        queue.close();
        pool.join();
        assert_eq!(pool.stats().completed_jobs, 1);
    }

    #[test]
    fn test_wait_exited_times_out_while_queue_open() {
        let queue: Arc<dyn JobQueue> = Arc::new(InMemoryJobQueue::new(2));
        let pool = WorkerPool::start(2, Arc::clone(&queue), SimulatedWork, Arc::new(NullAuditSink))
            .unwrap();
        assert!(!pool.wait_exited(Instant::now() + Duration::from_millis(50)));
        assert_eq!(pool.live_workers(), 2);
        queue.close();
        assert!(pool.wait_exited(Instant::now() + Duration::from_secs(5)));
        pool.join();
    }
}
