//! # Work Dispatch
//!
//! A bounded producer/consumer job dispatch core.
//!
//! A [`Producer`](core::Producer) emits numbered jobs at a fixed rate into a
//! bounded FIFO [`JobQueue`](core::JobQueue); a fixed
//! [`WorkerPool`](core::WorkerPool) drains it, simulating work by suspending
//! for each job's encoded duration; the [`Dispatcher`](core::Dispatcher) owns
//! the lifecycle, waits for a full drain and reports completion accounting.
//!
//! ## Key Features
//!
//! - **Backpressure**: the producer blocks on a full queue instead of dropping work
//! - **Worker Thread Pool**: dedicated OS threads, each driving its own tokio runtime
//! - **Fault Isolation**: a failing or panicking job never takes down its worker
//! - **Cooperative Shutdown**: closing the queue is the single cancellation primitive
//! - **Pluggable Queues**: in-memory or JSON-lines journaled backends behind one trait
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use work_dispatch::config::DispatchConfig;
//! use work_dispatch::core::{Dispatcher, SimulatedWork};
//! use work_dispatch::infra::InMemoryJobQueue;
//!
//! let config = DispatchConfig {
//!     job_limit: 5,
//!     worker_count: 2,
//!     queue_capacity: 2,
//!     ..DispatchConfig::default()
//! };
//! let queue = Arc::new(InMemoryJobQueue::new(config.queue_capacity));
//! let dispatcher = Dispatcher::new(config, queue, SimulatedWork)?;
//! let report = dispatcher.run()?;
//! assert!(report.is_balanced());
//! # Ok::<(), work_dispatch::core::DispatchError>(())
//! ```
//!
//! For complete scenarios, see `tests/dispatcher_test.rs`.

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Core dispatch abstractions and completion accounting.
pub mod core;
/// Configuration models for the dispatcher and queue backends.
pub mod config;
/// Builders to construct dispatch components from configuration.
pub mod builders;
/// Infrastructure adapters for queue storage backends.
pub mod infra;
/// Process-level runtime glue (signal handling).
pub mod runtime;
/// Shared utilities.
pub mod util;
