//! Job execution trait and the simulated-work executor.

use async_trait::async_trait;

use super::{Job, JobFault};

/// Abstraction for processing one job on a worker.
///
/// On native platforms each worker thread drives `execute` on its own
/// single-threaded tokio runtime, so executors may freely `.await` timers or
/// I/O without stalling other workers.
///
/// # Example
///
/// ```rust,ignore
/// use async_trait::async_trait;
/// use work_dispatch::core::{Job, JobExecutor, JobFault};
///
/// #[derive(Clone)]
/// struct Grader;
///
/// #[async_trait]
/// impl JobExecutor for Grader {
///     async fn execute(&self, job: &Job) -> Result<(), JobFault> {
///         tokio::time::sleep(job.duration()).await;
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait JobExecutor: Send + Sync + Clone + 'static {
    /// Process a job.
    ///
    /// # Errors
    ///
    /// A [`JobFault`] is logged and counted by the worker, which then moves on
    /// to its next job.
    async fn execute(&self, job: &Job) -> Result<(), JobFault>;
}

/// Default executor: suspends for the job's encoded duration.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimulatedWork;

#[async_trait]
impl JobExecutor for SimulatedWork {
    async fn execute(&self, job: &Job) -> Result<(), JobFault> {
        tokio::time::sleep(job.duration()).await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    #[tokio::test]
    async fn test_simulated_work_sleeps_for_duration() {
        let job = Job::new(1, 0.05).unwrap();
        let start = Instant::now();
        SimulatedWork.execute(&job).await.unwrap();
        assert!(start.elapsed() >= Duration::from_millis(50));
    }
}
