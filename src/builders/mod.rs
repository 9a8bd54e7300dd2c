//! Builders to construct dispatch components from configuration.

pub mod dispatcher_builder;

pub use dispatcher_builder::{build_dispatcher, build_queue};
