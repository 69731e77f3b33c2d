//! Configuration type definitions.

use serde::{Deserialize, Serialize};

use crate::queue::QueueKind;

use super::error::ConfigError;

/// Number of worker threads used when none is configured.
pub const DEFAULT_WORKER_THREADS: usize = 4;

/// Scheduler configuration (jobclock.yaml).
///
/// ```yaml
/// worker_threads: 8
/// queue: hand-over-hand
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SchedulerConfig {
    /// Number of worker threads; each runs at most one job at a time.
    pub worker_threads: usize,
    /// Queue realization backing the pool.
    pub queue: QueueKind,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            worker_threads: DEFAULT_WORKER_THREADS,
            queue: QueueKind::default(),
        }
    }
}

impl SchedulerConfig {
    /// Set the number of worker threads.
    pub fn with_worker_threads(mut self, worker_threads: usize) -> Self {
        self.worker_threads = worker_threads;
        self
    }

    /// Set the queue realization.
    pub fn with_queue(mut self, queue: QueueKind) -> Self {
        self.queue = queue;
        self
    }

    /// Check that the configuration can build a working pool.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.worker_threads == 0 {
            return Err(ConfigError::InvalidConfig(
                "worker_threads must be at least 1".into(),
            ));
        }
        Ok(())
    }
}
