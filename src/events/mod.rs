//! Lifecycle events and event handling.
//!
//! The worker pool emits events as tasks are queued, started, completed and
//! discarded. Handlers run synchronously on the emitting thread (a caller
//! thread for `TaskQueued`, a worker thread for execution events), so they
//! should be quick and must not block on the scheduler itself.

use parking_lot::RwLock;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::core::types::TaskId;

/// Lifecycle events emitted by the worker pool.
#[derive(Debug, Clone)]
pub enum Event {
    /// A task was inserted into the queue.
    TaskQueued {
        task_id: TaskId,
        run_at: Instant,
        timestamp: Instant,
    },

    /// A worker popped a due task and is about to run it.
    TaskStarted {
        task_id: TaskId,
        /// Index of the worker running the task.
        worker: usize,
        /// How far past its wake time the task started.
        lateness: Duration,
        /// Requested wait between submission and wake time.
        scheduling_delay: Duration,
        timestamp: Instant,
    },

    /// A task body returned.
    TaskCompleted {
        task_id: TaskId,
        worker: usize,
        duration: Duration,
        timestamp: Instant,
    },

    /// Queued tasks were dropped during shutdown without running.
    TasksDiscarded { count: usize, timestamp: Instant },

    /// Worker threads were spawned.
    PoolStarted { workers: usize, timestamp: Instant },

    /// All worker threads were joined.
    PoolStopped { timestamp: Instant },
}

impl Event {
    /// Get the timestamp of the event.
    pub fn timestamp(&self) -> Instant {
        match self {
            Event::TaskQueued { timestamp, .. } => *timestamp,
            Event::TaskStarted { timestamp, .. } => *timestamp,
            Event::TaskCompleted { timestamp, .. } => *timestamp,
            Event::TasksDiscarded { timestamp, .. } => *timestamp,
            Event::PoolStarted { timestamp, .. } => *timestamp,
            Event::PoolStopped { timestamp } => *timestamp,
        }
    }

    /// Get the task id, for task-level events.
    pub fn task_id(&self) -> Option<TaskId> {
        match self {
            Event::TaskQueued { task_id, .. }
            | Event::TaskStarted { task_id, .. }
            | Event::TaskCompleted { task_id, .. } => Some(*task_id),
            _ => None,
        }
    }

    /// Create a TaskQueued event.
    pub fn task_queued(task_id: TaskId, run_at: Instant) -> Self {
        Event::TaskQueued {
            task_id,
            run_at,
            timestamp: Instant::now(),
        }
    }

    /// Create a TaskStarted event.
    pub fn task_started(
        task_id: TaskId,
        worker: usize,
        lateness: Duration,
        scheduling_delay: Duration,
    ) -> Self {
        Event::TaskStarted {
            task_id,
            worker,
            lateness,
            scheduling_delay,
            timestamp: Instant::now(),
        }
    }

    /// Create a TaskCompleted event.
    pub fn task_completed(task_id: TaskId, worker: usize, duration: Duration) -> Self {
        Event::TaskCompleted {
            task_id,
            worker,
            duration,
            timestamp: Instant::now(),
        }
    }

    /// Create a TasksDiscarded event.
    pub fn tasks_discarded(count: usize) -> Self {
        Event::TasksDiscarded {
            count,
            timestamp: Instant::now(),
        }
    }

    /// Create a PoolStarted event.
    pub fn pool_started(workers: usize) -> Self {
        Event::PoolStarted {
            workers,
            timestamp: Instant::now(),
        }
    }

    /// Create a PoolStopped event.
    pub fn pool_stopped() -> Self {
        Event::PoolStopped {
            timestamp: Instant::now(),
        }
    }
}

/// Handler for receiving lifecycle events.
pub trait EventHandler: Send + Sync {
    /// Handle an event.
    fn handle(&self, event: &Event);
}

/// Event bus for distributing events to registered handlers.
pub struct EventBus {
    handlers: RwLock<Vec<Arc<dyn EventHandler>>>,
}

impl EventBus {
    /// Create a new event bus with no handlers.
    pub fn new() -> Self {
        Self {
            handlers: RwLock::new(Vec::new()),
        }
    }

    /// Register an event handler.
    pub fn register(&self, handler: Arc<dyn EventHandler>) {
        self.handlers.write().push(handler);
    }

    /// Emit an event to all registered handlers.
    pub fn emit(&self, event: Event) {
        let handlers = self.handlers.read();
        for handler in handlers.iter() {
            handler.handle(&event);
        }
    }

    /// Emit a lazily built event, skipping construction when nobody listens.
    pub fn emit_with(&self, build: impl FnOnce() -> Event) {
        let handlers = self.handlers.read();
        if handlers.is_empty() {
            return;
        }
        let event = build();
        for handler in handlers.iter() {
            handler.handle(&event);
        }
    }

    /// Get the number of registered handlers.
    pub fn handler_count(&self) -> usize {
        self.handlers.read().len()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
