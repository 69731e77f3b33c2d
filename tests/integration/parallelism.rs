//! Worker pool parallelism integration tests.

use crate::common::{WAIT, after_ms, started_scheduler};
use jobclock::QueueKind;
use jobclock::testing::{ConcurrencyProbe, ExecutionLog};
use std::sync::mpsc;
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::{Duration, Instant};

#[test]
fn test_every_job_runs_exactly_once() {
    for kind in QueueKind::ALL {
        let scheduler = Arc::new(started_scheduler(4, kind));
        let log = ExecutionLog::new();
        let submitters = 8;
        let per_submitter = 25;
        let barrier = Arc::new(Barrier::new(submitters));

        let handles: Vec<_> = (0..submitters)
            .map(|s| {
                let scheduler = Arc::clone(&scheduler);
                let log = log.clone();
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    for i in 0..per_submitter {
                        let label = s * per_submitter + i;
                        let run_at = after_ms((label % 20) as u64);
                        let log = log.clone();
                        scheduler.submit(run_at, move || log.record(label)).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let total = submitters * per_submitter;
        assert!(log.wait_for(total, WAIT), "{} queue stalled", kind);

        // Give any duplicate a chance to show up.
        thread::sleep(Duration::from_millis(50));
        scheduler.stop();

        let mut labels = log.labels();
        labels.sort_unstable();
        assert_eq!(labels, (0..total).collect::<Vec<_>>());

        let stats = scheduler.stats();
        assert_eq!(stats.submitted, total as u64);
        assert_eq!(stats.executed, total as u64);
        assert_eq!(stats.pending, 0);
    }
}

#[test]
fn test_concurrent_bodies_bounded_by_thread_count() {
    for kind in QueueKind::ALL {
        let threads = 3;
        let scheduler = started_scheduler(threads, kind);
        let probe = ConcurrencyProbe::new();
        let log = ExecutionLog::new();

        for label in 0..12 {
            let probe = probe.clone();
            let log = log.clone();
            scheduler
                .submit(Instant::now(), move || {
                    let _guard = probe.enter();
                    thread::sleep(Duration::from_millis(20));
                    log.record(label);
                })
                .unwrap();
        }

        assert!(log.wait_for(12, WAIT));
        scheduler.stop();

        assert!(probe.max() <= threads, "max concurrency {}", probe.max());
        assert!(probe.max() >= 2, "due jobs ran serially");
        assert_eq!(probe.current(), 0);
    }
}

#[test]
fn test_submit_does_not_block_behind_running_body() {
    for kind in QueueKind::ALL {
        let scheduler = started_scheduler(1, kind);
        let (started_tx, started_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel::<()>();

        scheduler
            .submit(Instant::now(), move || {
                started_tx.send(()).unwrap();
                release_rx.recv_timeout(WAIT).ok();
            })
            .unwrap();
        started_rx.recv_timeout(WAIT).unwrap();

        let began = Instant::now();
        for _ in 0..100 {
            scheduler.submit(after_ms(10), || {}).unwrap();
        }
        let elapsed = began.elapsed();

        release_tx.send(()).unwrap();
        scheduler.stop();

        assert!(
            elapsed < Duration::from_secs(1),
            "{} queue: submits blocked for {:?}",
            kind,
            elapsed
        );
    }
}

#[test]
fn test_idle_worker_runs_job_while_another_is_busy() {
    for kind in QueueKind::ALL {
        let scheduler = started_scheduler(2, kind);
        let (release_tx, release_rx) = mpsc::channel::<()>();
        let (started_tx, started_rx) = mpsc::channel();
        let log = ExecutionLog::new();

        scheduler
            .submit(Instant::now(), move || {
                started_tx.send(()).unwrap();
                release_rx.recv_timeout(WAIT).ok();
            })
            .unwrap();
        started_rx.recv_timeout(WAIT).unwrap();

        {
            let log = log.clone();
            scheduler
                .submit(after_ms(20), move || log.record("second"))
                .unwrap();
        }

        assert!(
            log.wait_for(1, WAIT),
            "{} queue: future job waited for busy worker",
            kind
        );
        release_tx.send(()).unwrap();
        scheduler.stop();
    }
}

#[test]
fn test_future_deadline_watched_while_sole_drainer_is_busy() {
    // Two jobs already queued when the pool starts: one long-running and
    // due now, one due shortly after. The second must not wait for the
    // first body to return.
    let scheduler = crate::common::scheduler(2, QueueKind::Locked);
    let (release_tx, release_rx) = mpsc::channel::<()>();
    let log = ExecutionLog::new();

    scheduler
        .submit(Instant::now(), move || {
            release_rx.recv_timeout(WAIT).ok();
        })
        .unwrap();
    {
        let log = log.clone();
        scheduler
            .submit(after_ms(30), move || log.record("watched"))
            .unwrap();
    }

    scheduler.start().unwrap();
    assert!(log.wait_for(1, WAIT));
    release_tx.send(()).unwrap();
    scheduler.stop();
}
