//! Shutdown integration tests.
//!
//! Tests that verify stop waits for running bodies, discards everything
//! still queued, and that nothing runs once stop has returned.

use crate::common::{WAIT, after_ms, scheduler, started_scheduler};
use jobclock::testing::{ExecutionLog, RecordingHandler};
use jobclock::{QueueKind, Scheduler, SchedulerError, SchedulerState};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

#[test]
fn test_stop_waits_for_running_body() {
    for kind in QueueKind::ALL {
        let scheduler = started_scheduler(2, kind);
        let completed = Arc::new(AtomicBool::new(false));
        let (started_tx, started_rx) = mpsc::channel();

        {
            let completed = Arc::clone(&completed);
            scheduler
                .submit(Instant::now(), move || {
                    started_tx.send(()).unwrap();
                    thread::sleep(Duration::from_millis(100));
                    completed.store(true, Ordering::SeqCst);
                })
                .unwrap();
        }

        started_rx.recv_timeout(WAIT).unwrap();
        scheduler.stop();

        assert!(
            completed.load(Ordering::SeqCst),
            "stop returned before the running body finished"
        );
        assert_eq!(scheduler.stats().executed, 1);
    }
}

#[test]
fn test_stop_discards_queued_jobs() {
    for kind in QueueKind::ALL {
        let handler = RecordingHandler::new();
        let scheduler = Scheduler::builder()
            .worker_threads(2)
            .queue(kind)
            .event_handler(handler.clone())
            .build()
            .unwrap();
        let log = ExecutionLog::new();

        for label in 0..5 {
            let log = log.clone();
            scheduler
                .submit(after_ms(60_000), move || log.record(label))
                .unwrap();
        }
        scheduler.start().unwrap();
        scheduler.stop();

        assert_eq!(scheduler.pending(), 0);
        assert_eq!(scheduler.stats().discarded, 5);
        assert_eq!(handler.discarded_total(), 5);
        assert!(log.is_empty());
    }
}

#[test]
fn test_nothing_runs_after_stop_returns() {
    let scheduler = started_scheduler(4, QueueKind::Locked);
    let log = ExecutionLog::new();

    for label in 0..20 {
        let log = log.clone();
        scheduler
            .submit(after_ms(30 + label), move || log.record(label))
            .unwrap();
    }
    scheduler.stop();
    let ran_before_stop = log.len();

    thread::sleep(Duration::from_millis(100));
    assert_eq!(log.len(), ran_before_stop);
}

#[test]
fn test_stop_wakes_idle_workers_promptly() {
    let scheduler = started_scheduler(8, QueueKind::HandOverHand);
    scheduler.submit(after_ms(60_000), || {}).unwrap();

    let began = Instant::now();
    scheduler.stop();

    assert!(began.elapsed() < Duration::from_secs(2));
    assert_eq!(scheduler.state(), SchedulerState::Stopped);
}

#[test]
fn test_stop_is_idempotent() {
    let handler = RecordingHandler::new();
    let scheduler = Scheduler::builder()
        .worker_threads(1)
        .event_handler(handler.clone())
        .build()
        .unwrap();
    scheduler.start().unwrap();

    scheduler.stop();
    scheduler.stop();

    assert_eq!(scheduler.state(), SchedulerState::Stopped);
    assert_eq!(handler.pool_stopped_count(), 1);
}

#[test]
fn test_stop_without_start_discards_queue() {
    let scheduler = scheduler(2, QueueKind::Locked);
    scheduler.submit(Instant::now(), || {}).unwrap();

    scheduler.stop();

    assert_eq!(scheduler.state(), SchedulerState::Stopped);
    assert_eq!(scheduler.stats().discarded, 1);
    assert!(matches!(scheduler.start(), Err(SchedulerError::Stopped)));
}

#[test]
fn test_submit_racing_stop_never_strands_jobs() {
    let scheduler = Arc::new(started_scheduler(2, QueueKind::Locked));

    let submitter = {
        let scheduler = Arc::clone(&scheduler);
        thread::spawn(move || {
            let mut accepted = 0u64;
            loop {
                match scheduler.submit(after_ms(60_000), || {}) {
                    Ok(_) => accepted += 1,
                    Err(SchedulerError::Stopped) => return accepted,
                    Err(e) => panic!("unexpected error: {}", e),
                }
            }
        })
    };

    thread::sleep(Duration::from_millis(20));
    scheduler.stop();
    let accepted = submitter.join().unwrap();

    let stats = scheduler.stats();
    assert_eq!(stats.pending, 0);
    assert_eq!(stats.submitted, accepted);
    assert_eq!(stats.discarded, accepted);
}

#[test]
fn test_drop_stops_workers() {
    let log = ExecutionLog::new();
    {
        let scheduler = started_scheduler(2, QueueKind::HandOverHand);
        let log = log.clone();
        scheduler
            .submit(after_ms(30), move || log.record("dropped"))
            .unwrap();
    }

    thread::sleep(Duration::from_millis(80));
    assert!(log.is_empty());
}
