//! Configuration loading and parsing.
//!
//! This module provides YAML-based configuration for the scheduler.

mod error;
mod loader;
mod types;

pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use types::{DEFAULT_WORKER_THREADS, SchedulerConfig};
