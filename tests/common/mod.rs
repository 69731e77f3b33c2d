//! Common test utilities shared across integration tests.

#![allow(dead_code)]

use jobclock::{QueueKind, Scheduler};
use std::time::{Duration, Instant};

/// Upper bound for waiting on jobs that should run within milliseconds.
///
/// Generous so loaded CI machines do not produce false failures.
pub const WAIT: Duration = Duration::from_secs(5);

/// `base` shifted by a signed millisecond offset.
pub fn offset_ms(base: Instant, offset: i64) -> Instant {
    let magnitude = Duration::from_millis(offset.unsigned_abs());
    if offset >= 0 {
        base + magnitude
    } else {
        base.checked_sub(magnitude).unwrap_or(base)
    }
}

/// An instant `ms` milliseconds from now.
pub fn after_ms(ms: u64) -> Instant {
    Instant::now() + Duration::from_millis(ms)
}

/// Build a scheduler without starting it.
pub fn scheduler(threads: usize, queue: QueueKind) -> Scheduler {
    Scheduler::builder()
        .worker_threads(threads)
        .queue(queue)
        .build()
        .unwrap()
}

/// Build and start a scheduler.
pub fn started_scheduler(threads: usize, queue: QueueKind) -> Scheduler {
    let scheduler = scheduler(threads, queue);
    scheduler.start().unwrap();
    scheduler
}

/// Assert that `values` never decreases.
pub fn assert_non_decreasing<T: PartialOrd + std::fmt::Debug>(values: &[T]) {
    for pair in values.windows(2) {
        assert!(
            pair[0] <= pair[1],
            "sequence decreases at {:?} -> {:?}: {:?}",
            pair[0],
            pair[1],
            values
        );
    }
}
