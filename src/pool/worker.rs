//! Worker thread loop and the state it shares with the pool.
//!
//! Each worker cycles through the same steps:
//!
//! 1. Idle: block on the condvar while the queue is empty.
//! 2. Peek the earliest deadline; if it is in the future, block until it
//!    passes or an insert/shutdown wakes the worker early.
//! 3. Drain: pop and run every task that is due, with no lock held while a
//!    body runs. Each pop that leaves work behind wakes one more worker, so
//!    the next deadline is never left unwatched behind a long task body.
//!
//! Shutdown is checked under the wake mutex before every wait, and
//! [`Shared::signal_shutdown`] notifies under the same mutex, so a worker can
//! never miss it. A start that fails halfway retires the workers it already
//! spawned through a separate flag, leaving the shutdown flag (which callers
//! inserting tasks observe) untouched.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use parking_lot::{Condvar, Mutex};

use crate::core::task::ScheduledTask;
use crate::events::{Event, EventBus};
use crate::queue::TaskQueue;

use super::stats::PoolStats;

/// State shared between the pool handle, callers and every worker.
pub(crate) struct Shared {
    pub(crate) queue: Arc<dyn TaskQueue>,
    pub(crate) stats: PoolStats,
    pub(crate) events: Arc<EventBus>,
    shutdown: AtomicBool,
    retire: AtomicBool,
    wake: Mutex<()>,
    condvar: Condvar,
}

impl Shared {
    pub(crate) fn new(queue: Arc<dyn TaskQueue>, events: Arc<EventBus>) -> Self {
        Self {
            queue,
            stats: PoolStats::default(),
            events,
            shutdown: AtomicBool::new(false),
            retire: AtomicBool::new(false),
            wake: Mutex::new(()),
            condvar: Condvar::new(),
        }
    }

    pub(crate) fn is_shutting_down(&self) -> bool {
        self.shutdown.load(Ordering::Acquire)
    }

    fn should_exit(&self) -> bool {
        self.is_shutting_down() || self.retire.load(Ordering::Acquire)
    }

    /// Wake one waiting worker so it re-reads the earliest deadline.
    pub(crate) fn notify_one(&self) {
        let _guard = self.wake.lock();
        self.condvar.notify_one();
    }

    /// Set the shutdown flag and wake every worker.
    pub(crate) fn signal_shutdown(&self) {
        self.shutdown.store(true, Ordering::Release);
        let _guard = self.wake.lock();
        self.condvar.notify_all();
    }

    /// Make every running worker exit without shutting the pool down.
    pub(crate) fn retire_workers(&self) {
        self.retire.store(true, Ordering::Release);
        let _guard = self.wake.lock();
        self.condvar.notify_all();
    }

    /// Allow workers to run again once the retired ones are joined.
    pub(crate) fn clear_retire(&self) {
        self.retire.store(false, Ordering::Release);
    }

    /// Block until the head of the queue is due.
    ///
    /// Returns false once shutdown has been signalled or the worker retired.
    fn wait_for_due_task(&self, worker: usize) -> bool {
        let mut guard = self.wake.lock();
        loop {
            if self.should_exit() {
                return false;
            }

            match self.queue.peek_earliest() {
                None => {
                    tracing::trace!(worker, "Queue empty, idling");
                    self.condvar.wait(&mut guard);
                }
                Some(deadline) if deadline <= Instant::now() => return true,
                Some(deadline) => {
                    tracing::trace!(
                        worker,
                        wait_ms = deadline.saturating_duration_since(Instant::now()).as_millis() as u64,
                        "Waiting for next deadline"
                    );
                    self.condvar.wait_until(&mut guard, deadline);
                }
            }
        }
    }

    /// Pop and run every task that is currently due.
    fn drain(&self, worker: usize) {
        while !self.should_exit() {
            let now = Instant::now();
            let Some(task) = self.queue.pop_if_due(now) else {
                break;
            };

            // While this body runs another worker has to watch the next
            // deadline, or drain it right away if it is already due.
            if !self.queue.is_empty() {
                self.notify_one();
            }

            self.execute(task, worker);
        }
    }

    fn execute(&self, task: ScheduledTask, worker: usize) {
        let started = Instant::now();
        let task_id = task.id();
        let lateness = started.saturating_duration_since(task.run_at());
        let scheduling_delay = task.scheduling_delay();

        tracing::debug!(
            worker,
            task_id = %task_id,
            lateness_ms = lateness.as_millis() as u64,
            "Running task"
        );
        self.events
            .emit_with(|| Event::task_started(task_id, worker, lateness, scheduling_delay));

        task.invoke();

        let duration = started.elapsed();
        self.stats.record_executed();
        self.events
            .emit_with(|| Event::task_completed(task_id, worker, duration));
    }
}

/// Body of a worker thread.
pub(crate) fn run(shared: Arc<Shared>, worker: usize) {
    tracing::debug!(worker, "Worker started");

    while shared.wait_for_due_task(worker) {
        shared.drain(worker);
    }

    tracing::debug!(worker, "Worker exiting");
}
