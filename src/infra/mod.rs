//! Infrastructure adapters for job queue storage backends.

pub mod queue;
pub use queue::{FileJobQueue, InMemoryJobQueue};
