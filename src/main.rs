//! `work-dispatch` binary: run one dispatcher from environment configuration.
//!
//! Configuration comes from the JSON file named by `DISPATCH_CONFIG` when set,
//! otherwise from `DISPATCH_*` variables (a `.env` file is honoured by
//! [`DispatchConfig::from_env`]). Ctrl-C requests a graceful shutdown.

use std::sync::Arc;

use anyhow::{anyhow, Context};
use tracing::{info, warn};

use work_dispatch::builders::build_dispatcher;
use work_dispatch::config::DispatchConfig;
use work_dispatch::core::{AppResult, NullAuditSink, SimulatedWork};
use work_dispatch::runtime::install_ctrl_c_handler;
use work_dispatch::util::init_tracing;

fn load_config() -> AppResult<DispatchConfig> {
    match std::env::var("DISPATCH_CONFIG") {
        Ok(path) => {
            let raw = std::fs::read_to_string(&path)
                .with_context(|| format!("reading config file {path}"))?;
            DispatchConfig::from_json_str(&raw).map_err(|e| anyhow!("invalid configuration: {e}"))
        }
        Err(_) => DispatchConfig::from_env().map_err(|e| anyhow!("invalid configuration: {e}")),
    }
}

#[tokio::main]
async fn main() -> AppResult<()> {
    init_tracing();

    let config = load_config()?;
    info!(
        job_limit = config.job_limit,
        worker_count = config.worker_count,
        queue_capacity = config.queue_capacity,
        "work-dispatch starting"
    );

    let dispatcher = build_dispatcher(config, SimulatedWork, Arc::new(NullAuditSink))?;
    let ctrl_c = install_ctrl_c_handler(dispatcher.shutdown_handle());

    let report = tokio::task::spawn_blocking(move || dispatcher.run()).await??;
    ctrl_c.abort();

    if !report.is_balanced() {
        warn!(?report, "job accounting is not balanced");
    }
    if report.timed_out {
        return Err(anyhow!("shutdown grace period elapsed with jobs still in flight"));
    }
    info!(
        produced = report.produced,
        completed = report.completed,
        "all jobs accounted for"
    );
    Ok(())
}
