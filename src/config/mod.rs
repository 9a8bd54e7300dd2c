//! Configuration models for the dispatcher and its queue backend.

pub mod dispatch;

pub use dispatch::{DispatchConfig, QueueBackendConfig};
