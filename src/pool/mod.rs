//! Fixed-size worker pool driving the task queue.
//!
//! The pool owns the queue and its worker threads. Callers insert from any
//! thread; workers wait on a condvar for the earliest deadline and run due
//! tasks on their own threads, so at most `thread_count` task bodies execute
//! at once and no extra thread or timer is ever created per task.

mod stats;
mod worker;

pub use stats::PoolStatsSnapshot;

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;

use parking_lot::Mutex;

use crate::core::task::{ScheduledTask, Task};
use crate::core::types::TaskId;
use crate::events::{Event, EventBus};
use crate::queue::{self, QueueKind, TaskQueue};
use crate::scheduler::{SchedulerError, SchedulerState};

use worker::Shared;

/// Prefix for worker thread names.
const WORKER_THREAD_PREFIX: &str = "jobclock-worker";

/// Lifecycle bookkeeping guarded by one mutex.
struct Lifecycle {
    state: SchedulerState,
    workers: Vec<JoinHandle<()>>,
}

/// A bounded pool of worker threads executing time-ordered tasks.
///
/// Lifecycle: `Created` → `Running` (after [`start`](Self::start)) →
/// `Stopped` (after [`stop`](Self::stop), terminal). Tasks may be inserted
/// while `Created`; they wait in the queue until workers exist.
pub struct WorkerPool {
    shared: Arc<Shared>,
    lifecycle: Mutex<Lifecycle>,
}

impl WorkerPool {
    /// Create a pool backed by the given queue realization.
    pub fn new(kind: QueueKind) -> Self {
        Self::with_event_bus(kind, Arc::new(EventBus::new()))
    }

    /// Create a pool that emits lifecycle events on `events`.
    pub fn with_event_bus(kind: QueueKind, events: Arc<EventBus>) -> Self {
        Self::with_queue(queue::build(kind), events)
    }

    /// Create a pool around an existing queue.
    pub fn with_queue(queue: Arc<dyn TaskQueue>, events: Arc<EventBus>) -> Self {
        Self {
            shared: Arc::new(Shared::new(queue, events)),
            lifecycle: Mutex::new(Lifecycle {
                state: SchedulerState::Created,
                workers: Vec::new(),
            }),
        }
    }

    /// Spawn exactly `thread_count` worker threads.
    pub fn start(&self, thread_count: usize) -> Result<(), SchedulerError> {
        if thread_count == 0 {
            return Err(SchedulerError::InvalidConfig(
                "worker thread count must be at least 1".into(),
            ));
        }

        let mut lifecycle = self.lifecycle.lock();
        match lifecycle.state {
            SchedulerState::Created => {}
            SchedulerState::Running => return Err(SchedulerError::AlreadyStarted),
            SchedulerState::Stopped => return Err(SchedulerError::Stopped),
        }

        let mut workers = Vec::with_capacity(thread_count);
        for index in 0..thread_count {
            let shared = Arc::clone(&self.shared);
            let spawned = thread::Builder::new()
                .name(format!("{}-{}", WORKER_THREAD_PREFIX, index))
                .spawn(move || worker::run(shared, index));

            match spawned {
                Ok(handle) => workers.push(handle),
                Err(e) => {
                    tracing::error!(worker = index, error = %e, "Failed to spawn worker thread");
                    self.shared.retire_workers();
                    join_workers(workers);
                    self.shared.clear_retire();
                    return Err(SchedulerError::Spawn(e));
                }
            }
        }

        lifecycle.workers = workers;
        lifecycle.state = SchedulerState::Running;
        drop(lifecycle);

        tracing::info!(
            workers = thread_count,
            pending = self.shared.queue.len(),
            "Worker pool started"
        );
        self.shared
            .events
            .emit_with(|| Event::pool_started(thread_count));
        Ok(())
    }

    /// Queue `task` to run at `run_at`.
    ///
    /// The task is visible to workers before this returns. A `run_at` in the
    /// past makes the task due immediately. A task accepted while
    /// [`stop`](Self::stop) is in progress is discarded with the rest of the
    /// queue, exactly as if it had been queued just before the stop.
    pub fn insert(&self, run_at: Instant, task: Task) -> Result<TaskId, SchedulerError> {
        if self.shared.is_shutting_down() {
            return Err(SchedulerError::Stopped);
        }

        let scheduled = ScheduledTask::new(run_at, task);
        let task_id = scheduled.id();
        let insertion = self.shared.queue.insert(scheduled);

        self.shared.stats.record_submitted();
        tracing::trace!(
            task_id = %task_id,
            earliest = insertion.earliest,
            due = insertion.due,
            "Task queued"
        );
        self.shared
            .events
            .emit_with(|| Event::task_queued(task_id, run_at));

        // stop() may have cleared the queue before this task landed in it.
        if self.shared.is_shutting_down() {
            self.discard_pending();
            return Ok(task_id);
        }

        if insertion.should_wake() {
            self.shared.notify_one();
        }
        Ok(task_id)
    }

    /// Signal shutdown, discard queued tasks and join every worker.
    ///
    /// Tasks already running finish; nothing starts after this returns.
    /// Calling it again is a no-op. Must not be called from inside a task
    /// body expecting to wait for that same task.
    pub fn stop(&self) {
        let workers = {
            let mut lifecycle = self.lifecycle.lock();
            if lifecycle.state == SchedulerState::Stopped {
                return;
            }
            lifecycle.state = SchedulerState::Stopped;
            std::mem::take(&mut lifecycle.workers)
        };

        tracing::info!(workers = workers.len(), "Stopping worker pool");
        self.shared.signal_shutdown();

        self.discard_pending();
        join_workers(workers);

        tracing::info!("Worker pool stopped");
        self.shared.events.emit_with(Event::pool_stopped);
    }

    /// Drop everything still queued, reporting it as discarded.
    fn discard_pending(&self) {
        let discarded = self.shared.queue.clear();
        if discarded > 0 {
            self.shared.stats.record_discarded(discarded);
            tracing::warn!(discarded, "Discarded queued tasks on shutdown");
            self.shared
                .events
                .emit_with(|| Event::tasks_discarded(discarded));
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SchedulerState {
        self.lifecycle.lock().state
    }

    /// Number of live worker handles.
    pub fn worker_count(&self) -> usize {
        self.lifecycle.lock().workers.len()
    }

    /// Number of queued tasks.
    pub fn pending(&self) -> usize {
        self.shared.queue.len()
    }

    /// Snapshot of the pool counters.
    pub fn stats(&self) -> PoolStatsSnapshot {
        self.shared.stats.snapshot(self.shared.queue.len())
    }

    /// Event bus the pool emits on.
    pub fn event_bus(&self) -> &EventBus {
        &self.shared.events
    }
}

impl Default for WorkerPool {
    fn default() -> Self {
        Self::new(QueueKind::default())
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Join worker threads, reporting any that died from a panicking task.
fn join_workers(workers: Vec<JoinHandle<()>>) {
    let current = thread::current().id();
    for handle in workers {
        let name = handle.thread().name().unwrap_or("unnamed").to_string();
        if handle.thread().id() == current {
            // stop() called from a task body: this thread exits on its own
            // once the body returns.
            tracing::warn!(worker = %name, "Not joining the calling worker thread");
            continue;
        }
        if handle.join().is_err() {
            tracing::error!(worker = %name, "Worker thread terminated by a panicking task");
        }
    }
}
