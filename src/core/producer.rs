//! Fixed-rate job producer.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use tracing::{debug, error, info, warn};

use super::audit::{build_audit_event, AuditAction, AuditSink};
use super::{DurationSampler, Job, JobQueue, QueueError, StopSignal};

/// Emission timing: first job after `initial_delay`, then one every `interval`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Schedule {
    /// Delay before the first emission.
    pub initial_delay: Duration,
    /// Fixed period between emissions.
    pub interval: Duration,
}

/// Why [`Producer::run`] returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProducerOutcome {
    /// All `limit` jobs were enqueued and the queue was closed.
    Exhausted,
    /// The stop signal fired or the queue was closed underneath the producer.
    Stopped,
    /// The queue backend failed; production was abandoned.
    Aborted(QueueError),
}

/// Emits numbered jobs into a queue until its limit is reached.
pub struct Producer {
    limit: u64,
    schedule: Schedule,
    sampler: DurationSampler,
    first_sequence: u64,
    claimed: AtomicU64,
    produced: AtomicU64,
}

impl Producer {
    /// Create a producer that will emit at most `limit` jobs.
    #[must_use]
    pub fn new(limit: u64, schedule: Schedule, sampler: DurationSampler) -> Self {
        Self {
            limit,
            schedule,
            sampler,
            first_sequence: 1,
            claimed: AtomicU64::new(0),
            produced: AtomicU64::new(0),
        }
    }

    /// Number jobs after `last`, so a run that resumes recovered jobs never
    /// reuses one of their sequence numbers.
    #[must_use]
    pub fn starting_after(mut self, last: u64) -> Self {
        self.first_sequence = last.saturating_add(1);
        self
    }

    /// Configured job limit.
    #[must_use]
    pub const fn limit(&self) -> u64 {
        self.limit
    }

    /// Jobs successfully enqueued so far.
    #[must_use]
    pub fn produced(&self) -> u64 {
        self.produced.load(Ordering::Acquire)
    }

    /// Reserve the next 1-based emission ordinal, or `None` once the limit is
    /// claimed.
    fn claim(&self) -> Option<u64> {
        self.claimed
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| {
                (n < self.limit).then_some(n + 1)
            })
            .ok()
            .map(|prev| prev + 1)
    }

    fn make_job(&self, ordinal: u64) -> Option<Job> {
        let sequence = self.first_sequence.saturating_add(ordinal - 1);
        let duration_secs = self.sampler.sample(ordinal);
        match Job::new(sequence, duration_secs) {
            Ok(job) => Some(job),
            Err(e) => {
                warn!(sequence = sequence, error = %e, "sampled duration rejected, using zero");
                Job::new(sequence, 0.0).ok()
            }
        }
    }

    /// Emit jobs on the schedule until the limit is reached or `stop` is raised.
    ///
    /// Enqueue backpressure is propagated: when the queue is full the current
    /// emission waits, and later ticks shift rather than burst. Safe to call
    /// from several threads at once; the total never exceeds the limit.
    pub fn run(
        &self,
        queue: &dyn JobQueue,
        stop: &StopSignal,
        audit: &dyn AuditSink,
    ) -> ProducerOutcome {
        let mut next_tick = Instant::now() + self.schedule.initial_delay;
        loop {
            if stop.wait_until(next_tick) {
                info!(produced = self.produced(), "producer stopped by shutdown signal");
                return ProducerOutcome::Stopped;
            }

            let Some(ordinal) = self.claim() else {
                if self.produced() >= self.limit {
                    queue.close();
                }
                return ProducerOutcome::Exhausted;
            };
            let Some(job) = self.make_job(ordinal) else {
                return ProducerOutcome::Stopped;
            };
            let (sequence, duration_secs) = (job.sequence(), job.duration_secs());

            match queue.enqueue(job) {
                Ok(()) => {
                    audit.record(build_audit_event(AuditAction::Emitted, sequence, None, None));
                    info!(sequence = sequence, duration_secs = duration_secs, "job emitted");
                    let produced = self.produced.fetch_add(1, Ordering::AcqRel) + 1;
                    if produced >= self.limit {
                        queue.close();
                        info!(produced = produced, "job limit reached, queue closed");
                        return ProducerOutcome::Exhausted;
                    }
                }
                Err(QueueError::Closed) => {
                    debug!(sequence = sequence, "queue closed, producer stopping");
                    return ProducerOutcome::Stopped;
                }
                Err(e) => {
                    error!(sequence = sequence, error = %e, "enqueue failed, producer aborting");
                    return ProducerOutcome::Aborted(e);
                }
            }

            next_tick += self.schedule.interval;
            let now = Instant::now();
            if next_tick < now {
                next_tick = now;
            }
        }
    }
}
