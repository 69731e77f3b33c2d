//! Scheduler facade.
//!
//! [`Scheduler`] is the type applications hold. It owns one
//! [`WorkerPool`] and forwards `submit`, `start` and `stop` to it.

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::{ConfigLoader, SchedulerConfig};
use crate::core::task::Task;
use crate::core::types::TaskId;
use crate::events::{EventBus, EventHandler};
use crate::pool::{PoolStatsSnapshot, WorkerPool};
use crate::queue::QueueKind;

use super::types::{SchedulerError, SchedulerState};

/// In-process job scheduler.
///
/// Jobs can be submitted from any thread, in any order, before or after
/// [`start`](Self::start). Each job runs once, on one of the pool's worker
/// threads, as soon as possible after its wake time. Jobs whose wake time is
/// already in the past run immediately.
///
/// # Example
///
/// ```
/// use jobclock::Scheduler;
/// use std::sync::mpsc;
/// use std::time::{Duration, Instant};
///
/// let scheduler = Scheduler::new();
/// let (tx, rx) = mpsc::channel();
///
/// scheduler
///     .submit(Instant::now() + Duration::from_millis(10), move || {
///         tx.send("ran").unwrap();
///     })
///     .unwrap();
///
/// scheduler.start().unwrap();
/// assert_eq!(rx.recv_timeout(Duration::from_secs(1)).unwrap(), "ran");
/// scheduler.stop();
/// ```
pub struct Scheduler {
    config: SchedulerConfig,
    pool: WorkerPool,
}

impl Scheduler {
    /// Create a scheduler with the default configuration (4 workers).
    pub fn new() -> Self {
        Self::from_parts(SchedulerConfig::default(), Arc::new(EventBus::new()))
    }

    /// Create a scheduler from a configuration.
    pub fn with_config(config: SchedulerConfig) -> Result<Self, SchedulerError> {
        config.validate()?;
        Ok(Self::from_parts(config, Arc::new(EventBus::new())))
    }

    /// Create a scheduler from a YAML configuration file.
    pub fn from_config_file(path: impl AsRef<Path>) -> Result<Self, SchedulerError> {
        let config = ConfigLoader::load(path)?;
        Ok(Self::from_parts(config, Arc::new(EventBus::new())))
    }

    /// Start building a scheduler.
    pub fn builder() -> SchedulerBuilder {
        SchedulerBuilder::new()
    }

    fn from_parts(config: SchedulerConfig, events: Arc<EventBus>) -> Self {
        let pool = WorkerPool::with_event_bus(config.queue, events);
        Self { config, pool }
    }

    /// Queue `job` to run at `run_at`.
    pub fn submit<F>(&self, run_at: Instant, job: F) -> Result<TaskId, SchedulerError>
    where
        F: FnOnce() + Send + 'static,
    {
        self.pool.insert(run_at, Task::new(job))
    }

    /// Queue a prebuilt task, which may be empty.
    pub fn submit_task(&self, run_at: Instant, task: Task) -> Result<TaskId, SchedulerError> {
        self.pool.insert(run_at, task)
    }

    /// Queue `job` to run `delay` from now.
    ///
    /// Fails with [`SchedulerError::WakeTimeOverflow`] if `delay` is too large
    /// for the monotonic clock.
    pub fn submit_after<F>(&self, delay: Duration, job: F) -> Result<TaskId, SchedulerError>
    where
        F: FnOnce() + Send + 'static,
    {
        let run_at = Instant::now()
            .checked_add(delay)
            .ok_or(SchedulerError::WakeTimeOverflow { delay })?;
        self.submit(run_at, job)
    }

    /// Spawn the configured number of worker threads.
    pub fn start(&self) -> Result<(), SchedulerError> {
        self.pool.start(self.config.worker_threads)
    }

    /// Stop the workers, discarding queued jobs. Idempotent.
    pub fn stop(&self) {
        self.pool.stop();
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SchedulerState {
        self.pool.state()
    }

    /// Returns true while workers are running.
    pub fn is_running(&self) -> bool {
        self.state() == SchedulerState::Running
    }

    /// Number of queued jobs.
    pub fn pending(&self) -> usize {
        self.pool.pending()
    }

    /// Snapshot of the pool counters.
    pub fn stats(&self) -> PoolStatsSnapshot {
        self.pool.stats()
    }

    /// The configuration this scheduler was built with.
    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Event bus for registering lifecycle handlers.
    pub fn event_bus(&self) -> &EventBus {
        self.pool.event_bus()
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for [`Scheduler`].
pub struct SchedulerBuilder {
    config: SchedulerConfig,
    events: Arc<EventBus>,
}

impl SchedulerBuilder {
    /// Create a builder with the default configuration.
    pub fn new() -> Self {
        Self {
            config: SchedulerConfig::default(),
            events: Arc::new(EventBus::new()),
        }
    }

    /// Replace the whole configuration.
    pub fn config(mut self, config: SchedulerConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the number of worker threads.
    pub fn worker_threads(mut self, worker_threads: usize) -> Self {
        self.config.worker_threads = worker_threads;
        self
    }

    /// Set the queue realization.
    pub fn queue(mut self, queue: QueueKind) -> Self {
        self.config.queue = queue;
        self
    }

    /// Use a shared event bus.
    pub fn event_bus(mut self, events: Arc<EventBus>) -> Self {
        self.events = events;
        self
    }

    /// Register an event handler on the builder's event bus.
    pub fn event_handler(self, handler: Arc<dyn EventHandler>) -> Self {
        self.events.register(handler);
        self
    }

    /// Validate the configuration and build the scheduler.
    pub fn build(self) -> Result<Scheduler, SchedulerError> {
        self.config.validate()?;
        Ok(Scheduler::from_parts(self.config, self.events))
    }
}

impl Default for SchedulerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
