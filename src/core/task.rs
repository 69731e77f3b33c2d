//! Task and scheduled task types.
//!
//! A [`Task`] is the unit of work the scheduler runs: an optional closure
//! that is invoked at most once. A [`ScheduledTask`] attaches the timing
//! metadata the queue orders by.

use std::cmp::Ordering;
use std::fmt;
use std::time::{Duration, Instant};

use super::types::{QueueKey, TaskId};

/// Boxed job body.
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// A no-argument unit of work.
///
/// Invoking a task consumes it, so a body can never run twice. A task built
/// without a body is accepted and does nothing when invoked.
///
/// # Example
///
/// ```
/// use jobclock::Task;
///
/// let task = Task::new(|| println!("hello"));
/// task.invoke();
///
/// // An empty task is a no-op, not an error.
/// Task::empty().invoke();
/// ```
#[derive(Default)]
pub struct Task {
    body: Option<Job>,
}

impl Task {
    /// Create a task from a closure.
    pub fn new<F>(f: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self {
            body: Some(Box::new(f)),
        }
    }

    /// Create a task with no body.
    pub fn empty() -> Self {
        Self { body: None }
    }

    /// Returns true if the task has no body.
    pub fn is_empty(&self) -> bool {
        self.body.is_none()
    }

    /// Run the body, if any.
    ///
    /// Panics raised by the body propagate to the caller.
    pub fn invoke(self) {
        if let Some(body) = self.body {
            body();
        }
    }
}

impl<F> From<Option<F>> for Task
where
    F: FnOnce() + Send + 'static,
{
    fn from(body: Option<F>) -> Self {
        match body {
            Some(f) => Self::new(f),
            None => Self::empty(),
        }
    }
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("empty", &self.is_empty())
            .finish()
    }
}

/// A task together with the time it should run.
///
/// Comparison operators look at `run_at` only. Queues additionally use the
/// task id to keep equal wake times in submission order; see [`QueueKey`].
pub struct ScheduledTask {
    id: TaskId,
    run_at: Instant,
    enqueued_at: Instant,
    task: Task,
}

impl ScheduledTask {
    /// Wrap a task, allocating a fresh id and stamping the enqueue time.
    pub fn new(run_at: Instant, task: Task) -> Self {
        Self::with_id(TaskId::next(), run_at, task)
    }

    /// Wrap a task with an explicit id.
    pub fn with_id(id: TaskId, run_at: Instant, task: Task) -> Self {
        Self {
            id,
            run_at,
            enqueued_at: Instant::now(),
            task,
        }
    }

    /// Get the task id.
    pub fn id(&self) -> TaskId {
        self.id
    }

    /// When the task should run.
    pub fn run_at(&self) -> Instant {
        self.run_at
    }

    /// When the task was constructed.
    pub fn enqueued_at(&self) -> Instant {
        self.enqueued_at
    }

    /// Ordering key inside a queue.
    pub fn key(&self) -> QueueKey {
        QueueKey::new(self.run_at, self.id)
    }

    /// Returns true if the task may run at `now`.
    pub fn is_due(&self, now: Instant) -> bool {
        self.run_at <= now
    }

    /// Time between submission and the requested wake time.
    ///
    /// Zero for tasks submitted with a wake time in the past.
    pub fn scheduling_delay(&self) -> Duration {
        self.run_at.saturating_duration_since(self.enqueued_at)
    }

    /// Returns true if the wrapped task has no body.
    pub fn is_empty(&self) -> bool {
        self.task.is_empty()
    }

    /// Run the wrapped task.
    pub fn invoke(self) {
        self.task.invoke();
    }
}

impl PartialEq for ScheduledTask {
    fn eq(&self, other: &Self) -> bool {
        self.run_at == other.run_at
    }
}

impl PartialOrd for ScheduledTask {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.run_at.cmp(&other.run_at))
    }
}

impl fmt::Debug for ScheduledTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScheduledTask")
            .field("id", &self.id)
            .field("run_at", &self.run_at)
            .field("enqueued_at", &self.enqueued_at)
            .field("task", &self.task)
            .finish()
    }
}
