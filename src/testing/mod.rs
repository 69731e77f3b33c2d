//! Testing utilities for users of the jobclock library.
//!
//! This module provides helpers for instrumenting jobs in tests:
//!
//! - [`ExecutionLog`]: records which jobs ran, in what order, and lets a test
//!   block until a number of jobs have run
//! - [`ConcurrencyProbe`]: tracks how many job bodies run at once
//! - [`RecordingHandler`]: an [`EventHandler`] that keeps every event

use parking_lot::{Condvar, Mutex};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use crate::events::{Event, EventHandler};

/// One recorded job execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Execution<L> {
    /// Caller-chosen label.
    pub label: L,
    /// When the job body started.
    pub started_at: Instant,
}

/// Shared, ordered record of job executions.
///
/// # Example
///
/// ```
/// use jobclock::Scheduler;
/// use jobclock::testing::ExecutionLog;
/// use std::time::{Duration, Instant};
///
/// let log = ExecutionLog::new();
/// let scheduler = Scheduler::new();
///
/// for label in [2, 1] {
///     let log = log.clone();
///     let run_at = Instant::now() + Duration::from_millis(label * 5);
///     scheduler.submit(run_at, move || log.record(label)).unwrap();
/// }
///
/// scheduler.start().unwrap();
/// assert!(log.wait_for(2, Duration::from_secs(1)));
/// scheduler.stop();
///
/// assert_eq!(log.labels(), vec![1, 2]);
/// ```
pub struct ExecutionLog<L> {
    inner: Arc<LogInner<L>>,
}

struct LogInner<L> {
    entries: Mutex<Vec<Execution<L>>>,
    changed: Condvar,
}

impl<L: Clone> ExecutionLog<L> {
    /// Create an empty log.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(LogInner {
                entries: Mutex::new(Vec::new()),
                changed: Condvar::new(),
            }),
        }
    }

    /// Record that the job labelled `label` started now.
    pub fn record(&self, label: L) {
        let mut entries = self.inner.entries.lock();
        entries.push(Execution {
            label,
            started_at: Instant::now(),
        });
        self.inner.changed.notify_all();
    }

    /// Block until at least `count` executions are recorded.
    ///
    /// Returns false if `timeout` elapses first. A timeout too large for the
    /// clock waits without a deadline.
    pub fn wait_for(&self, count: usize, timeout: Duration) -> bool {
        let deadline = Instant::now().checked_add(timeout);
        let mut entries = self.inner.entries.lock();
        while entries.len() < count {
            match deadline {
                Some(deadline) => {
                    if self
                        .inner
                        .changed
                        .wait_until(&mut entries, deadline)
                        .timed_out()
                    {
                        return entries.len() >= count;
                    }
                }
                None => self.inner.changed.wait(&mut entries),
            }
        }
        true
    }

    /// Number of recorded executions.
    pub fn len(&self) -> usize {
        self.inner.entries.lock().len()
    }

    /// Returns true if nothing has run.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Labels in execution order.
    pub fn labels(&self) -> Vec<L> {
        self.inner
            .entries
            .lock()
            .iter()
            .map(|e| e.label.clone())
            .collect()
    }

    /// All recorded executions in order.
    pub fn executions(&self) -> Vec<Execution<L>> {
        self.inner.entries.lock().clone()
    }
}

impl<L> Clone for ExecutionLog<L> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<L: Clone> Default for ExecutionLog<L> {
    fn default() -> Self {
        Self::new()
    }
}

/// Measures how many job bodies are inside [`ConcurrencyProbe::enter`] at
/// the same time.
#[derive(Clone, Default)]
pub struct ConcurrencyProbe {
    inner: Arc<ProbeInner>,
}

#[derive(Default)]
struct ProbeInner {
    current: AtomicUsize,
    max: AtomicUsize,
}

/// Guard returned by [`ConcurrencyProbe::enter`]; leaving decrements.
pub struct ProbeGuard {
    inner: Arc<ProbeInner>,
}

impl ConcurrencyProbe {
    /// Create a probe.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a body as running until the guard is dropped.
    pub fn enter(&self) -> ProbeGuard {
        let now = self.inner.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.inner.max.fetch_max(now, Ordering::SeqCst);
        ProbeGuard {
            inner: Arc::clone(&self.inner),
        }
    }

    /// Bodies running right now.
    pub fn current(&self) -> usize {
        self.inner.current.load(Ordering::SeqCst)
    }

    /// Highest concurrency observed.
    pub fn max(&self) -> usize {
        self.inner.max.load(Ordering::SeqCst)
    }
}

impl Drop for ProbeGuard {
    fn drop(&mut self) {
        self.inner.current.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Event handler that keeps every event it receives.
#[derive(Default)]
pub struct RecordingHandler {
    events: Mutex<Vec<Event>>,
}

impl RecordingHandler {
    /// Create a handler ready to register on an event bus.
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// All events received so far.
    pub fn events(&self) -> Vec<Event> {
        self.events.lock().clone()
    }

    fn count(&self, predicate: impl Fn(&Event) -> bool) -> usize {
        self.events.lock().iter().filter(|e| predicate(e)).count()
    }

    /// Number of `TaskQueued` events.
    pub fn queued_count(&self) -> usize {
        self.count(|e| matches!(e, Event::TaskQueued { .. }))
    }

    /// Number of `TaskStarted` events.
    pub fn started_count(&self) -> usize {
        self.count(|e| matches!(e, Event::TaskStarted { .. }))
    }

    /// Number of `TaskCompleted` events.
    pub fn completed_count(&self) -> usize {
        self.count(|e| matches!(e, Event::TaskCompleted { .. }))
    }

    /// Total tasks reported by `TasksDiscarded` events.
    pub fn discarded_total(&self) -> usize {
        self.events
            .lock()
            .iter()
            .map(|e| match e {
                Event::TasksDiscarded { count, .. } => *count,
                _ => 0,
            })
            .sum()
    }

    /// Number of `PoolStarted` events.
    pub fn pool_started_count(&self) -> usize {
        self.count(|e| matches!(e, Event::PoolStarted { .. }))
    }

    /// Number of `PoolStopped` events.
    pub fn pool_stopped_count(&self) -> usize {
        self.count(|e| matches!(e, Event::PoolStopped { .. }))
    }

    /// Lateness of every started task, in start order.
    pub fn latenesses(&self) -> Vec<Duration> {
        self.events
            .lock()
            .iter()
            .filter_map(|e| match e {
                Event::TaskStarted { lateness, .. } => Some(*lateness),
                _ => None,
            })
            .collect()
    }
}

impl EventHandler for RecordingHandler {
    fn handle(&self, event: &Event) {
        self.events.lock().push(event.clone());
    }
}
