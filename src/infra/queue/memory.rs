//! Blocking bounded FIFO shared by every queue backend.
//!
//! The buffer is a `VecDeque` behind a `parking_lot::Mutex` with two condition
//! variables: `not_empty` parks dequeuers, `not_full` parks enqueuers. A
//! [`Journal`] hook runs under the same lock so durable backends see mutations
//! in exactly the order callers do.

use std::collections::VecDeque;

use parking_lot::{Condvar, Mutex};

use crate::core::{Job, JobQueue, QueueError};

/// Persistence hook invoked while the queue lock is held.
pub trait Journal: Send {
    /// A job was appended at the tail.
    ///
    /// # Errors
    ///
    /// A backend error aborts the enqueue; the job is not queued.
    fn appended(&mut self, job: &Job) -> Result<(), QueueError>;

    /// The pending set changed by removal; `pending` is the new state.
    ///
    /// # Errors
    ///
    /// A backend error is logged by the caller; the in-memory state stands.
    fn compacted(&mut self, pending: &VecDeque<Job>) -> Result<(), QueueError>;
}

/// Journal that persists nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoJournal;

impl Journal for NoJournal {
    fn appended(&mut self, _job: &Job) -> Result<(), QueueError> {
        Ok(())
    }

    fn compacted(&mut self, _pending: &VecDeque<Job>) -> Result<(), QueueError> {
        Ok(())
    }
}

struct State<J> {
    jobs: VecDeque<Job>,
    closed: bool,
    journal: J,
}

/// Bounded blocking job queue parameterised over its journal.
pub struct BoundedJobQueue<J = NoJournal> {
    capacity: usize,
    state: Mutex<State<J>>,
    not_empty: Condvar,
    not_full: Condvar,
}

/// Purely in-memory queue.
pub type InMemoryJobQueue = BoundedJobQueue<NoJournal>;

impl InMemoryJobQueue {
    /// Create an empty in-memory queue. A zero capacity is raised to one.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self::with_journal(capacity, NoJournal, VecDeque::new())
    }
}

impl<J: Journal> BoundedJobQueue<J> {
    /// Create a queue seeded with already-pending jobs.
    pub(crate) fn with_journal(capacity: usize, journal: J, pending: VecDeque<Job>) -> Self {
        Self {
            capacity: capacity.max(1),
            state: Mutex::new(State {
                jobs: pending,
                closed: false,
                journal,
            }),
            not_empty: Condvar::new(),
            not_full: Condvar::new(),
        }
    }
}

impl<J: Journal> JobQueue for BoundedJobQueue<J> {
    fn enqueue(&self, job: Job) -> Result<(), QueueError> {
        let mut state = self.state.lock();
        while !state.closed && state.jobs.len() >= self.capacity {
            self.not_full.wait(&mut state);
        }
        if state.closed {
            return Err(QueueError::Closed);
        }
        state.journal.appended(&job)?;
        state.jobs.push_back(job);
        self.not_empty.notify_one();
        Ok(())
    }

    fn dequeue(&self) -> Result<Job, QueueError> {
        let mut state = self.state.lock();
        loop {
            if let Some(job) = state.jobs.pop_front() {
                let State { jobs, journal, .. } = &mut *state;
                if let Err(e) = journal.compacted(jobs) {
                    tracing::error!(sequence = job.sequence(), error = %e, "journal compaction failed");
                }
                self.not_full.notify_one();
                return Ok(job);
            }
            if state.closed {
                return Err(QueueError::Closed);
            }
            self.not_empty.wait(&mut state);
        }
    }

    fn close(&self) {
        let mut state = self.state.lock();
        if state.closed {
            return;
        }
        state.closed = true;
        self.not_empty.notify_all();
        self.not_full.notify_all();
    }

    fn cancel(&self) -> Vec<Job> {
        let mut state = self.state.lock();
        state.closed = true;
        let dropped: Vec<Job> = state.jobs.drain(..).collect();
        if !dropped.is_empty() {
            let State { jobs, journal, .. } = &mut *state;
            if let Err(e) = journal.compacted(jobs) {
                tracing::error!(error = %e, "journal compaction failed on cancel");
            }
        }
        self.not_empty.notify_all();
        self.not_full.notify_all();
        dropped
    }

    fn pending(&self) -> Vec<Job> {
        self.state.lock().jobs.iter().cloned().collect()
    }

    fn len(&self) -> usize {
        self.state.lock().jobs.len()
    }

    fn capacity(&self) -> usize {
        self.capacity
    }

    fn is_closed(&self) -> bool {
        self.state.lock().closed
    }
}
