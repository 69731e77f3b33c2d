//! Scheduler type definitions.
//!
//! This module contains the error type and lifecycle state shared by the
//! scheduler facade and the worker pool.

use std::time::Duration;
use thiserror::Error;

use crate::config::ConfigError;

/// Errors that can occur in the scheduler.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// The scheduler has been stopped; it accepts no more work.
    #[error("scheduler is stopped")]
    Stopped,

    /// Workers are already running.
    #[error("scheduler is already started")]
    AlreadyStarted,

    /// Invalid configuration value.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A relative delay that puts the wake time past what `Instant` can hold.
    #[error("wake time {delay:?} from now is out of range")]
    WakeTimeOverflow { delay: Duration },

    /// The OS refused to create a worker thread.
    #[error("failed to spawn worker thread")]
    Spawn(#[source] std::io::Error),

    /// Configuration loading error.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Lifecycle state of the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    /// Constructed; tasks may be queued but no worker is running.
    Created,
    /// Workers are running.
    Running,
    /// Workers have been joined. Terminal.
    Stopped,
}
