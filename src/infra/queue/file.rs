//! File-journaled queue.
//!
//! Pending jobs are mirrored to a JSON-lines file: one append per enqueue and a
//! full rewrite of the pending set whenever jobs leave the queue. Reopening the
//! same stream recovers whatever was still pending when the previous process
//! stopped.

use std::collections::VecDeque;
use std::fs::{create_dir_all, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::core::{Job, QueueError};

use super::memory::{BoundedJobQueue, Journal};

/// JSON-lines journal backing a [`FileJobQueue`].
#[derive(Debug)]
pub struct JsonlJournal {
    file_path: PathBuf,
}

/// Bounded queue whose pending set survives restarts.
pub type FileJobQueue = BoundedJobQueue<JsonlJournal>;

fn backend(e: impl std::fmt::Display) -> QueueError {
    QueueError::Backend(e.to_string())
}

impl JsonlJournal {
    fn load(&self) -> Result<VecDeque<Job>, QueueError> {
        let mut jobs = VecDeque::new();
        if !self.file_path.exists() {
            return Ok(jobs);
        }
        let file = OpenOptions::new()
            .read(true)
            .open(&self.file_path)
            .map_err(backend)?;
        for line in BufReader::new(file).lines() {
            let line = line.map_err(backend)?;
            if line.trim().is_empty() {
                continue;
            }
            let job: Job = serde_json::from_str(&line).map_err(backend)?;
            jobs.push_back(job);
        }
        Ok(jobs)
    }
}

impl Journal for JsonlJournal {
    fn appended(&mut self, job: &Job) -> Result<(), QueueError> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.file_path)
            .map_err(backend)?;
        let line = serde_json::to_string(job).map_err(backend)?;
        writeln!(file, "{line}").map_err(backend)
    }

    fn compacted(&mut self, pending: &VecDeque<Job>) -> Result<(), QueueError> {
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&self.file_path)
            .map_err(backend)?;
        let mut writer = BufWriter::new(file);
        for job in pending {
            let line = serde_json::to_string(job).map_err(backend)?;
            writeln!(writer, "{line}").map_err(backend)?;
        }
        writer.flush().map_err(backend)
    }
}

impl FileJobQueue {
    /// Open (or create) the journal `<dir>/<stream>.jsonl` and recover pending jobs.
    ///
    /// # Errors
    ///
    /// [`QueueError::Backend`] if the directory or journal cannot be read, a
    /// line fails to parse or holds an invalid job, or more jobs are pending
    /// than `capacity` allows.
    pub fn open(dir: impl AsRef<Path>, stream: &str, capacity: usize) -> Result<Self, QueueError> {
        let dir = dir.as_ref();
        create_dir_all(dir).map_err(backend)?;
        let journal = JsonlJournal {
            file_path: dir.join(format!("{stream}.jsonl")),
        };
        let pending = journal.load()?;
        if pending.len() > capacity.max(1) {
            return Err(QueueError::Backend(format!(
                "journal holds {} pending jobs, capacity is {capacity}",
                pending.len()
            )));
        }
        if !pending.is_empty() {
            tracing::info!(
                stream = stream,
                pending = pending.len(),
                "recovered pending jobs from journal"
            );
        }
        Ok(Self::with_journal(capacity, journal, pending))
    }
}
