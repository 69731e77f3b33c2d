//! Fine-grained queue: a sorted linked list with one lock per node.
//!
//! Inserters walk the list holding two adjacent node locks at a time and only
//! release the trailing node once the next one is held, so inserts aimed at
//! different regions of the list proceed in parallel. Removal always happens
//! at the head under the sentinel lock plus the first node's lock.
//!
//! Nodes are only ever locked in list order, from the sentinel towards the
//! tail, which rules out lock-order deadlocks. A node can only be locked by a
//! thread that already holds its predecessor, so once the head node has been
//! unlinked by a pop nobody can reach it again.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use parking_lot::Mutex;

use crate::core::task::ScheduledTask;

use super::{Insertion, TaskQueue};

type Link = Option<Arc<Mutex<Node>>>;

/// A list node. The sentinel head carries no task.
#[derive(Default)]
struct Node {
    task: Option<ScheduledTask>,
    next: Link,
}

/// Ordered task queue using hand-over-hand locking.
///
/// `pop_if_due` never spins or retries on the head lock; a pop that finds the
/// head not yet due simply returns. `parking_lot` mutexes are eventually fair,
/// which bounds how long frequent pops can keep inserters away from the head.
pub struct HandOverHandQueue {
    head: Arc<Mutex<Node>>,
    len: AtomicUsize,
}

impl HandOverHandQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self {
            head: Arc::new(Mutex::new(Node::default())),
            len: AtomicUsize::new(0),
        }
    }

    /// Detach the whole chain and drop it node by node.
    fn unlink_all(&self) -> usize {
        let mut chain = self.head.lock().next.take();
        let mut discarded = 0;

        while let Some(node) = chain {
            let mut guard = node.lock();
            chain = guard.next.take();
            if guard.task.take().is_some() {
                discarded += 1;
            }
        }

        discarded
    }
}

impl Default for HandOverHandQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskQueue for HandOverHandQueue {
    fn insert(&self, task: ScheduledTask) -> Insertion {
        let due = task.is_due(Instant::now());
        let key = task.key();

        let mut current = self.head.lock_arc();
        let mut earliest = true;

        loop {
            let Some(next) = current.next.clone() else {
                break;
            };
            let next_guard = next.lock_arc();
            let belongs_before = next_guard
                .task
                .as_ref()
                .is_some_and(|queued| key < queued.key());
            if belongs_before {
                break;
            }
            // Dropping the old guard here releases N only after N+1 is held.
            current = next_guard;
            earliest = false;
        }

        let node = Arc::new(Mutex::new(Node {
            task: Some(task),
            next: current.next.take(),
        }));
        current.next = Some(node);
        self.len.fetch_add(1, Ordering::Relaxed);

        Insertion { earliest, due }
    }

    fn peek_earliest(&self) -> Option<Instant> {
        let head = self.head.lock();
        let first = head.next.clone()?;
        let first = first.lock();
        first.task.as_ref().map(ScheduledTask::run_at)
    }

    fn pop_if_due(&self, now: Instant) -> Option<ScheduledTask> {
        let mut head = self.head.lock();
        let first = head.next.clone()?;
        let mut first_guard = first.lock();

        if !first_guard.task.as_ref().is_some_and(|t| t.is_due(now)) {
            return None;
        }

        head.next = first_guard.next.take();
        let task = first_guard.task.take();
        drop(first_guard);
        drop(head);

        if task.is_some() {
            self.len.fetch_sub(1, Ordering::Relaxed);
        }
        task
    }

    fn is_empty(&self) -> bool {
        self.head.lock().next.is_none()
    }

    fn len(&self) -> usize {
        self.len.load(Ordering::Relaxed)
    }

    fn clear(&self) -> usize {
        let discarded = self.unlink_all();
        self.len.fetch_sub(discarded, Ordering::Relaxed);
        discarded
    }
}

impl Drop for HandOverHandQueue {
    fn drop(&mut self) {
        // Iterative unlink; the default recursive drop can overflow the stack
        // on long lists.
        self.unlink_all();
    }
}
