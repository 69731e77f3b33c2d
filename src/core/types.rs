//! Core identifier types for the scheduler.
//!
//! Every queued task gets a `TaskId` drawn from a process-wide monotonic
//! counter. Besides identifying the task in logs and events, the id is the
//! tie-break between tasks that share the same wake time.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Next id handed out by [`TaskId::next`].
static NEXT_TASK_ID: AtomicU64 = AtomicU64::new(1);

/// Unique, monotonically increasing identifier for a scheduled task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskId(u64);

impl TaskId {
    /// Allocate the next id in submission order.
    pub fn next() -> Self {
        Self(NEXT_TASK_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Create a TaskId from a raw sequence number.
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Get the underlying sequence number.
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "task-{}", self.0)
    }
}

/// Position of a task inside an ordered queue.
///
/// Sorting by `(run_at, seq)` keeps tasks with the same wake time in
/// submission order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct QueueKey {
    /// When the task becomes due.
    pub run_at: Instant,
    /// Submission sequence number.
    pub seq: TaskId,
}

impl QueueKey {
    /// Create a new key.
    pub fn new(run_at: Instant, seq: TaskId) -> Self {
        Self { run_at, seq }
    }
}
