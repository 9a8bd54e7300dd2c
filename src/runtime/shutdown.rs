//! Translate process signals into a dispatcher shutdown request.

use tokio::task::JoinHandle;

use crate::core::ShutdownHandle;

/// Spawn a task on the current tokio runtime that requests shutdown on Ctrl-C.
///
/// Must be called from within a tokio runtime. The returned task finishes
/// after the first signal; abort it once the dispatcher has terminated.
pub fn install_ctrl_c_handler(handle: ShutdownHandle) -> JoinHandle<()> {
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::info!("received Ctrl-C, initiating graceful shutdown");
                handle.shutdown();
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to listen for Ctrl-C");
            }
        }
    })
}
