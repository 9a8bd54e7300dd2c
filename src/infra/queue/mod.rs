//! Queue backends.

pub mod file;
pub mod memory;

pub use file::{FileJobQueue, JsonlJournal};
pub use memory::{BoundedJobQueue, InMemoryJobQueue, Journal, NoJournal};
