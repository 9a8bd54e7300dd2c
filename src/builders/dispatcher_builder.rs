//! Builders to construct a dispatcher and its queue from configuration.

use std::sync::Arc;

use crate::config::{DispatchConfig, QueueBackendConfig};
use crate::core::{AuditSink, DispatchError, Dispatcher, JobExecutor, JobQueue};
use crate::infra::queue::{FileJobQueue, InMemoryJobQueue};

/// Build the queue backend selected by `cfg`.
///
/// # Errors
///
/// [`DispatchError::InvalidConfiguration`] if `cfg` is invalid, or
/// [`DispatchError::Queue`] if a file journal cannot be opened.
pub fn build_queue(cfg: &DispatchConfig) -> Result<Arc<dyn JobQueue>, DispatchError> {
    cfg.validate().map_err(DispatchError::InvalidConfiguration)?;
    let queue: Arc<dyn JobQueue> = match &cfg.queue {
        QueueBackendConfig::InMemory => Arc::new(InMemoryJobQueue::new(cfg.queue_capacity)),
        QueueBackendConfig::File { dir, stream } => {
            Arc::new(FileJobQueue::open(dir, stream, cfg.queue_capacity)?)
        }
    };
    Ok(queue)
}

/// Build a dispatcher over the configured queue backend.
///
/// # Errors
///
/// Same as [`build_queue`].
pub fn build_dispatcher<E: JobExecutor>(
    cfg: DispatchConfig,
    executor: E,
    audit: Arc<dyn AuditSink>,
) -> Result<Dispatcher<E>, DispatchError> {
    let queue = build_queue(&cfg)?;
    let sampler = cfg.sampler();
    Dispatcher::with_parts(cfg, queue, executor, sampler, audit)
}
