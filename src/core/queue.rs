//! Job queue capability shared by every backend.

use super::{Job, QueueError};

/// Bounded, thread-safe FIFO of pending jobs.
///
/// All cross-component traffic goes through this contract: the producer only
/// enqueues, workers only dequeue, and closing is the single cancellation
/// primitive. Backends differ only in durability.
pub trait JobQueue: Send + Sync {
    /// Append a job at the tail, blocking while the queue is full and open.
    ///
    /// # Errors
    ///
    /// [`QueueError::Closed`] once [`close`](Self::close) has been called,
    /// including for callers already blocked when the close happens.
    fn enqueue(&self, job: Job) -> Result<(), QueueError>;

    /// Remove the head, blocking while the queue is empty and open.
    ///
    /// # Errors
    ///
    /// [`QueueError::Closed`] once the queue is both closed and empty.
    fn dequeue(&self) -> Result<Job, QueueError>;

    /// Refuse further enqueues and wake every blocked caller. Idempotent.
    fn close(&self);

    /// Close the queue and remove every pending job, returned in FIFO order.
    fn cancel(&self) -> Vec<Job>;

    /// Snapshot of pending jobs in FIFO order.
    fn pending(&self) -> Vec<Job>;

    /// Pending job count.
    fn len(&self) -> usize;

    /// Maximum number of pending jobs.
    fn capacity(&self) -> usize;

    /// Whether [`close`](Self::close) or [`cancel`](Self::cancel) has run.
    fn is_closed(&self) -> bool;

    /// Whether no job is pending.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
