//! The unit of work moved from producer to workers.

use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::JobError;

/// One unit of simulated work. Immutable once built.
///
/// Deserialization goes through [`Job::new`], so a journal line can never
/// produce a job that construction would reject.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawJob")]
pub struct Job {
    sequence: u64,
    duration_secs: f64,
}

#[derive(Deserialize)]
struct RawJob {
    sequence: u64,
    duration_secs: f64,
}

impl TryFrom<RawJob> for Job {
    type Error = JobError;

    fn try_from(raw: RawJob) -> Result<Self, Self::Error> {
        Self::new(raw.sequence, raw.duration_secs)
    }
}

impl Job {
    /// Create a job, rejecting a zero sequence or a duration that is negative,
    /// non-finite or too large for [`Duration`].
    ///
    /// # Errors
    ///
    /// Returns [`JobError`] when either field is out of range.
    pub fn new(sequence: u64, duration_secs: f64) -> Result<Self, JobError> {
        if sequence == 0 {
            return Err(JobError::ZeroSequence);
        }
        if duration_secs < 0.0 || Duration::try_from_secs_f64(duration_secs).is_err() {
            return Err(JobError::InvalidDuration(duration_secs));
        }
        Ok(Self {
            sequence,
            duration_secs,
        })
    }

    /// Sequence number assigned by the producer (1-based).
    #[must_use]
    pub const fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Simulated processing time in seconds.
    #[must_use]
    pub const fn duration_secs(&self) -> f64 {
        self.duration_secs
    }

    /// Simulated processing time.
    #[must_use]
    pub fn duration(&self) -> Duration {
        Duration::try_from_secs_f64(self.duration_secs).unwrap_or_default()
    }
}

/// Source of simulated durations for newly produced jobs.
#[derive(Debug, Clone)]
pub enum DurationSampler {
    /// Uniform over `[0, max_secs)`.
    Uniform {
        /// Exclusive upper bound in seconds.
        max_secs: f64,
    },
    /// Every job gets the same duration.
    Fixed(f64),
    /// Cycles through a scripted list; an empty list yields zero.
    Sequence(Vec<f64>),
}

impl Default for DurationSampler {
    fn default() -> Self {
        Self::Uniform { max_secs: 120.0 }
    }
}

impl DurationSampler {
    /// Duration for the `ordinal`-th job a producer emits (1-based).
    #[must_use]
    pub fn sample(&self, ordinal: u64) -> f64 {
        match self {
            Self::Uniform { max_secs } if *max_secs > 0.0 => {
                rand::rng().random_range(0.0..*max_secs)
            }
            Self::Uniform { .. } => 0.0,
            Self::Fixed(secs) => *secs,
            Self::Sequence(values) if values.is_empty() => 0.0,
            Self::Sequence(values) => {
                let len = values.len() as u64;
                let idx = (ordinal.saturating_sub(1) % len) as usize;
                values[idx]
            }
        }
    }
}
