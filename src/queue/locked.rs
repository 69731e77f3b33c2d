//! Coarse-grained queue: one mutex around a sorted map.

use std::collections::BTreeMap;
use std::time::Instant;

use parking_lot::Mutex;

use crate::core::task::ScheduledTask;
use crate::core::types::QueueKey;

use super::{Insertion, TaskQueue};

/// Ordered task queue guarded by a single lock.
///
/// Every operation holds the lock for its whole duration, which makes the
/// ordering invariant trivially hold at every quiescent point. Tasks removed
/// by [`TaskQueue::clear`] are dropped after the lock is released.
#[derive(Default)]
pub struct LockedQueue {
    entries: Mutex<BTreeMap<QueueKey, ScheduledTask>>,
}

impl LockedQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self::default()
    }
}

impl TaskQueue for LockedQueue {
    fn insert(&self, task: ScheduledTask) -> Insertion {
        let due = task.is_due(Instant::now());
        let key = task.key();

        let mut entries = self.entries.lock();
        let earliest = entries
            .first_key_value()
            .is_none_or(|(head, _)| key < *head);
        entries.insert(key, task);

        Insertion { earliest, due }
    }

    fn peek_earliest(&self) -> Option<Instant> {
        self.entries
            .lock()
            .first_key_value()
            .map(|(key, _)| key.run_at)
    }

    fn pop_if_due(&self, now: Instant) -> Option<ScheduledTask> {
        let mut entries = self.entries.lock();
        match entries.first_entry() {
            Some(head) if head.key().run_at <= now => Some(head.remove()),
            _ => None,
        }
    }

    fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    fn len(&self) -> usize {
        self.entries.lock().len()
    }

    fn clear(&self) -> usize {
        let drained = std::mem::take(&mut *self.entries.lock());
        drained.len()
    }
}
