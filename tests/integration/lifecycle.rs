//! Lifecycle, configuration and event integration tests.

use crate::common::{WAIT, after_ms, scheduler};
use jobclock::testing::{ExecutionLog, RecordingHandler};
use jobclock::{
    ConfigError, Event, EventBus, QueueKind, Scheduler, SchedulerError, SchedulerState,
};
use std::io::Write;
use std::sync::Arc;
use std::time::{Duration, Instant};

#[test]
fn test_state_transitions() {
    let scheduler = scheduler(2, QueueKind::Locked);
    assert_eq!(scheduler.state(), SchedulerState::Created);

    scheduler.start().unwrap();
    assert_eq!(scheduler.state(), SchedulerState::Running);
    assert!(scheduler.is_running());

    scheduler.stop();
    assert_eq!(scheduler.state(), SchedulerState::Stopped);
    assert!(!scheduler.is_running());
}

#[test]
fn test_start_twice_fails() {
    let scheduler = scheduler(1, QueueKind::Locked);
    scheduler.start().unwrap();

    assert!(matches!(
        scheduler.start(),
        Err(SchedulerError::AlreadyStarted)
    ));
    scheduler.stop();
}

#[test]
fn test_start_after_stop_fails() {
    let scheduler = scheduler(1, QueueKind::HandOverHand);
    scheduler.start().unwrap();
    scheduler.stop();

    assert!(matches!(scheduler.start(), Err(SchedulerError::Stopped)));
}

#[test]
fn test_zero_worker_threads_rejected() {
    let result = Scheduler::builder().worker_threads(0).build();
    assert!(matches!(
        result,
        Err(SchedulerError::Config(ConfigError::InvalidConfig(_)))
    ));
}

#[test]
fn test_empty_task_is_consumed_silently() {
    let scheduler = scheduler(1, QueueKind::Locked);
    let log = ExecutionLog::new();

    scheduler
        .submit_task(Instant::now(), jobclock::Task::empty())
        .unwrap();
    {
        let log = log.clone();
        scheduler
            .submit(after_ms(5), move || log.record("after-empty"))
            .unwrap();
    }

    scheduler.start().unwrap();
    assert!(log.wait_for(1, WAIT));
    scheduler.stop();

    assert_eq!(scheduler.stats().executed, 2);
}

#[test]
fn test_scheduler_from_config_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "worker_threads: 3").unwrap();
    writeln!(file, "queue: hand-over-hand").unwrap();

    let scheduler = Scheduler::from_config_file(file.path()).unwrap();
    assert_eq!(scheduler.config().worker_threads, 3);
    assert_eq!(scheduler.config().queue, QueueKind::HandOverHand);

    let log = ExecutionLog::new();
    {
        let log = log.clone();
        scheduler.submit(Instant::now(), move || log.record(1)).unwrap();
    }
    scheduler.start().unwrap();
    assert!(log.wait_for(1, WAIT));
    scheduler.stop();
}

#[test]
fn test_config_file_with_unknown_field_rejected() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "worker_threads: 3").unwrap();
    writeln!(file, "priority: high").unwrap();

    let result = Scheduler::from_config_file(file.path());
    assert!(matches!(
        result,
        Err(SchedulerError::Config(ConfigError::YamlFileError { .. }))
    ));
}

#[test]
fn test_missing_config_file_reports_path() {
    let result = Scheduler::from_config_file("/nonexistent/jobclock.yaml");
    match result {
        Err(SchedulerError::Config(ConfigError::FileReadError { path, .. })) => {
            assert!(path.ends_with("jobclock.yaml"));
        }
        Err(e) => panic!("unexpected error: {}", e),
        Ok(_) => panic!("expected an error"),
    }
}

#[test]
fn test_events_cover_task_lifecycle() {
    let handler = RecordingHandler::new();
    let events = Arc::new(EventBus::new());
    events.register(handler.clone());

    let scheduler = Scheduler::builder()
        .worker_threads(2)
        .event_bus(Arc::clone(&events))
        .build()
        .unwrap();
    let log = ExecutionLog::new();

    scheduler.start().unwrap();
    for label in 0..3 {
        let log = log.clone();
        scheduler
            .submit(after_ms(5), move || log.record(label))
            .unwrap();
    }
    {
        let log = log.clone();
        scheduler
            .submit(after_ms(60_000), move || log.record(99))
            .unwrap();
    }

    assert!(log.wait_for(3, WAIT));
    scheduler.stop();

    assert_eq!(handler.pool_started_count(), 1);
    assert_eq!(handler.queued_count(), 4);
    assert_eq!(handler.started_count(), 3);
    assert_eq!(handler.completed_count(), 3);
    assert_eq!(handler.discarded_total(), 1);
    assert_eq!(handler.pool_stopped_count(), 1);

    let recorded = handler.events();
    assert!(matches!(recorded.first(), Some(Event::PoolStarted { workers: 2, .. })));
    assert!(matches!(recorded.last(), Some(Event::PoolStopped { .. })));
}

#[test]
fn test_overdue_job_reports_lateness() {
    let handler = RecordingHandler::new();
    let scheduler = Scheduler::builder()
        .worker_threads(1)
        .event_handler(handler.clone())
        .build()
        .unwrap();
    let log = ExecutionLog::new();

    let Some(overdue) = Instant::now().checked_sub(Duration::from_millis(200)) else {
        return;
    };
    {
        let log = log.clone();
        scheduler.submit(overdue, move || log.record(())).unwrap();
    }
    scheduler.start().unwrap();
    assert!(log.wait_for(1, WAIT));
    scheduler.stop();

    let latenesses = handler.latenesses();
    assert_eq!(latenesses.len(), 1);
    assert!(latenesses[0] >= Duration::from_millis(200));
}
