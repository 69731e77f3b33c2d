//! Time-ordered concurrent task queues.
//!
//! Workers pull due tasks from a [`TaskQueue`] while any number of caller
//! threads insert into it. Two realizations are provided:
//!
//! - [`LockedQueue`]: a single mutex around a sorted map.
//! - [`HandOverHandQueue`]: a sorted linked list with per-node locks.
//!
//! Both keep tasks ascending by `(run_at, id)`, so tasks sharing a wake time
//! come out in submission order.

mod hand_over_hand;
mod locked;

pub use hand_over_hand::HandOverHandQueue;
pub use locked::LockedQueue;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::config::ConfigError;
use crate::core::task::ScheduledTask;

/// Outcome of inserting a task, used to decide whether to wake a worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Insertion {
    /// The task became the new head of the queue.
    pub earliest: bool,
    /// The task was already due when it was inserted.
    pub due: bool,
}

impl Insertion {
    /// Returns true if a waiting worker has to re-evaluate its deadline.
    pub fn should_wake(&self) -> bool {
        self.earliest || self.due
    }
}

/// A concurrency-safe holding area for scheduled tasks, sorted by wake time.
pub trait TaskQueue: Send + Sync {
    /// Insert a task, keeping the queue sorted.
    fn insert(&self, task: ScheduledTask) -> Insertion;

    /// Wake time of the head, without removing it.
    fn peek_earliest(&self) -> Option<Instant>;

    /// Remove and return the head if it is due at `now`.
    ///
    /// Two concurrent callers never receive the same task.
    fn pop_if_due(&self, now: Instant) -> Option<ScheduledTask>;

    /// Returns true if no task is queued.
    fn is_empty(&self) -> bool;

    /// Number of queued tasks.
    fn len(&self) -> usize;

    /// Drop every queued task, returning how many were discarded.
    fn clear(&self) -> usize;
}

/// Which queue realization a pool uses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QueueKind {
    /// [`LockedQueue`].
    #[default]
    Locked,
    /// [`HandOverHandQueue`].
    HandOverHand,
}

impl QueueKind {
    /// All available realizations.
    pub const ALL: [QueueKind; 2] = [QueueKind::Locked, QueueKind::HandOverHand];

    /// Name used in configuration files and on the command line.
    pub fn as_str(&self) -> &'static str {
        match self {
            QueueKind::Locked => "locked",
            QueueKind::HandOverHand => "hand-over-hand",
        }
    }
}

impl fmt::Display for QueueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QueueKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "locked" => Ok(QueueKind::Locked),
            "hand-over-hand" => Ok(QueueKind::HandOverHand),
            other => Err(ConfigError::InvalidConfig(format!(
                "unknown queue kind '{}' (expected 'locked' or 'hand-over-hand')",
                other
            ))),
        }
    }
}

/// Build an empty queue of the given kind.
pub fn build(kind: QueueKind) -> Arc<dyn TaskQueue> {
    match kind {
        QueueKind::Locked => Arc::new(LockedQueue::new()),
        QueueKind::HandOverHand => Arc::new(HandOverHandQueue::new()),
    }
}
