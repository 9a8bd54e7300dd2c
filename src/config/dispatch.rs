//! Dispatcher configuration structures.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::core::{DurationSampler, Schedule};

/// Prefix for environment overrides read by [`DispatchConfig::from_env`].
pub const ENV_PREFIX: &str = "DISPATCH_";

/// Queue backend selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum QueueBackendConfig {
    /// In-memory queue; pending jobs are lost on exit.
    #[default]
    InMemory,
    /// JSON-lines journal at `<dir>/<stream>.jsonl`.
    File {
        /// Directory holding the journal.
        dir: PathBuf,
        /// Journal file stem.
        stream: String,
    },
}

/// Startup configuration, read once and immutable afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Total jobs the producer emits.
    pub job_limit: u64,
    /// Seconds between emissions.
    pub emission_interval_secs: f64,
    /// Seconds before the first emission.
    pub initial_delay_secs: f64,
    /// Concurrent workers.
    pub worker_count: usize,
    /// Maximum pending jobs before the producer blocks.
    pub queue_capacity: usize,
    /// Exclusive upper bound of sampled job durations, in seconds.
    pub max_job_duration_secs: f64,
    /// How long to wait for workers once draining starts or shutdown is
    /// requested, whichever comes first.
    pub shutdown_grace_secs: Option<f64>,
    /// Queue backend selection.
    pub queue: QueueBackendConfig,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            job_limit: 10,
            emission_interval_secs: 1.0,
            initial_delay_secs: 1.0,
            worker_count: 2,
            queue_capacity: 16,
            max_job_duration_secs: 120.0,
            shutdown_grace_secs: None,
            queue: QueueBackendConfig::InMemory,
        }
    }
}

fn positive(name: &str, value: f64) -> Result<(), String> {
    if value > 0.0 {
        representable(name, value)
    } else {
        Err(format!("{name} must be greater than 0"))
    }
}

fn non_negative(name: &str, value: f64) -> Result<(), String> {
    if value >= 0.0 {
        representable(name, value)
    } else {
        Err(format!("{name} must be 0 or greater"))
    }
}

/// The value must convert to a `Duration` and a deadline that far out must fit
/// in an `Instant`.
fn representable(name: &str, value: f64) -> Result<(), String> {
    Duration::try_from_secs_f64(value)
        .ok()
        .and_then(|d| Instant::now().checked_add(d))
        .map(|_| ())
        .ok_or_else(|| format!("{name} is out of range: {value}"))
}

fn seconds(value: f64) -> Duration {
    Duration::try_from_secs_f64(value).unwrap_or_default()
}

fn env_var<T: std::str::FromStr>(key: &str) -> Result<Option<T>, String>
where
    T::Err: std::fmt::Display,
{
    let name = format!("{ENV_PREFIX}{key}");
    match std::env::var(&name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| format!("{name}: {e}")),
        Err(std::env::VarError::NotPresent) => Ok(None),
        Err(e) => Err(format!("{name}: {e}")),
    }
}

impl DispatchConfig {
    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if self.job_limit == 0 {
            return Err("job_limit must be greater than 0".into());
        }
        positive("emission_interval_secs", self.emission_interval_secs)?;
        non_negative("initial_delay_secs", self.initial_delay_secs)?;
        if self.worker_count == 0 {
            return Err("worker_count must be greater than 0".into());
        }
        if self.queue_capacity == 0 {
            return Err("queue_capacity must be greater than 0".into());
        }
        non_negative("max_job_duration_secs", self.max_job_duration_secs)?;
        if let Some(grace) = self.shutdown_grace_secs {
            positive("shutdown_grace_secs", grace)?;
        }
        if let QueueBackendConfig::File { stream, .. } = &self.queue {
            if stream.trim().is_empty() {
                return Err("queue stream name must not be empty".into());
            }
        }
        Ok(())
    }

    /// Parse configuration from a JSON string and validate.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let cfg: Self = serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Build configuration from defaults overridden by `DISPATCH_*` variables,
    /// after loading a `.env` file if one is present.
    ///
    /// Recognised keys: `JOB_LIMIT`, `EMISSION_INTERVAL_SECS`,
    /// `INITIAL_DELAY_SECS`, `WORKER_COUNT`, `QUEUE_CAPACITY`,
    /// `MAX_JOB_DURATION_SECS`, `SHUTDOWN_GRACE_SECS`, `QUEUE_DIR`,
    /// `QUEUE_STREAM`. Setting `QUEUE_DIR` selects the file backend.
    pub fn from_env() -> Result<Self, String> {
        let _ = dotenvy::dotenv();
        let mut cfg = Self::default();
        if let Some(v) = env_var("JOB_LIMIT")? {
            cfg.job_limit = v;
        }
        if let Some(v) = env_var("EMISSION_INTERVAL_SECS")? {
            cfg.emission_interval_secs = v;
        }
        if let Some(v) = env_var("INITIAL_DELAY_SECS")? {
            cfg.initial_delay_secs = v;
        }
        if let Some(v) = env_var("WORKER_COUNT")? {
            cfg.worker_count = v;
        }
        if let Some(v) = env_var("QUEUE_CAPACITY")? {
            cfg.queue_capacity = v;
        }
        if let Some(v) = env_var("MAX_JOB_DURATION_SECS")? {
            cfg.max_job_duration_secs = v;
        }
        cfg.shutdown_grace_secs = env_var("SHUTDOWN_GRACE_SECS")?;
        if let Some(dir) = env_var::<PathBuf>("QUEUE_DIR")? {
            let stream = env_var::<String>("QUEUE_STREAM")?
                .unwrap_or_else(|| "default-queue".to_string());
            cfg.queue = QueueBackendConfig::File { dir, stream };
        }
        cfg.validate()?;
        Ok(cfg)
    }

    /// Emission schedule derived from the interval and initial delay.
    ///
    /// Out-of-range values map to zero; [`validate`](Self::validate) rejects them.
    #[must_use]
    pub fn schedule(&self) -> Schedule {
        Schedule {
            initial_delay: seconds(self.initial_delay_secs),
            interval: seconds(self.emission_interval_secs),
        }
    }

    /// Uniform duration sampler bounded by `max_job_duration_secs`.
    #[must_use]
    pub const fn sampler(&self) -> DurationSampler {
        DurationSampler::Uniform {
            max_secs: self.max_job_duration_secs,
        }
    }

    /// Bound on the drain wait, if configured.
    #[must_use]
    pub fn shutdown_grace(&self) -> Option<Duration> {
        self.shutdown_grace_secs
            .filter(|g| *g > 0.0)
            .and_then(|g| Duration::try_from_secs_f64(g).ok())
    }
}
