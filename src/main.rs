//! jobclock - drive the in-process job scheduler from the command line.
//!
//! Usage:
//!   jobclock demo [options]        Submit jobs in random order from many threads
//!   jobclock validate <config>     Validate a scheduler configuration file

use clap::{Parser, Subcommand};
use jobclock::{
    ConfigLoader, Event, EventHandler, QueueKind, Scheduler, SchedulerConfig, SchedulerError,
};
use rand::seq::SliceRandom;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

/// jobclock - run closures at absolute wake times on a bounded worker pool
#[derive(Parser)]
#[command(name = "jobclock")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Submit jobs in shuffled order from separate threads and watch them run
    Demo {
        /// Scheduler configuration file (YAML)
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Number of worker threads (overrides the config file)
        #[arg(short = 't', long)]
        threads: Option<usize>,

        /// Queue realization: locked or hand-over-hand (overrides the config file)
        #[arg(short, long)]
        queue: Option<QueueKind>,

        /// Offsets in milliseconds for jobs submitted before the pool starts
        #[arg(
            long,
            value_delimiter = ',',
            allow_negative_numbers = true,
            default_values_t = [10, 20, 25, 30]
        )]
        offsets_ms: Vec<i64>,

        /// Offsets in milliseconds for jobs submitted after the pool starts;
        /// negative offsets are already overdue
        #[arg(
            long,
            value_delimiter = ',',
            allow_negative_numbers = true,
            default_values_t = [-10, -20, 45]
        )]
        late_offsets_ms: Vec<i64>,

        /// How long to let the pool run before stopping it
        #[arg(long, default_value = "200")]
        run_for_ms: u64,
    },

    /// Validate a scheduler configuration file
    Validate {
        /// Path to the YAML configuration file
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
}

/// Logs task execution with its lateness.
struct LoggingHandler;

impl EventHandler for LoggingHandler {
    fn handle(&self, event: &Event) {
        match event {
            Event::TaskStarted {
                task_id,
                worker,
                lateness,
                scheduling_delay,
                ..
            } => {
                info!(
                    "  {} started on worker {} ({}ms after submit, {}ms late)",
                    task_id,
                    worker,
                    scheduling_delay.as_millis(),
                    lateness.as_millis()
                );
            }
            Event::TaskCompleted {
                task_id, duration, ..
            } => {
                info!("  {} completed in {:?}", task_id, duration);
            }
            Event::TasksDiscarded { count, .. } => {
                warn!("Discarded {} job(s) that had not run", count);
            }
            Event::PoolStarted { workers, .. } => {
                info!("Pool started with {} worker(s)", workers);
            }
            Event::PoolStopped { .. } => {
                info!("Pool stopped");
            }
            Event::TaskQueued { .. } => {}
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Demo {
            config,
            threads,
            queue,
            offsets_ms,
            late_offsets_ms,
            run_for_ms,
        } => {
            let mut scheduler_config = match config {
                Some(path) => ConfigLoader::load(path)?,
                None => SchedulerConfig::default(),
            };
            if let Some(threads) = threads {
                scheduler_config.worker_threads = threads;
            }
            if let Some(queue) = queue {
                scheduler_config.queue = queue;
            }
            run_demo(
                scheduler_config,
                &offsets_ms,
                &late_offsets_ms,
                Duration::from_millis(run_for_ms),
            )?;
        }
        Commands::Validate { file } => {
            validate_config(file)?;
        }
    }

    Ok(())
}

/// Submit two shuffled batches around `start` and report what ran.
fn run_demo(
    config: SchedulerConfig,
    offsets_ms: &[i64],
    late_offsets_ms: &[i64],
    run_for: Duration,
) -> Result<(), Box<dyn std::error::Error>> {
    let scheduler = Arc::new(
        Scheduler::builder()
            .config(config)
            .event_handler(Arc::new(LoggingHandler))
            .build()?,
    );

    info!(
        "Submitting {} job(s) before start ({} workers, {} queue)",
        offsets_ms.len(),
        scheduler.config().worker_threads,
        scheduler.config().queue
    );
    submit_shuffled(&scheduler, offsets_ms)?;

    thread::sleep(Duration::from_millis(20));
    scheduler.start()?;

    info!("Submitting {} job(s) after start", late_offsets_ms.len());
    submit_shuffled(&scheduler, late_offsets_ms)?;

    thread::sleep(run_for);
    scheduler.stop();

    let stats = scheduler.stats();
    info!(
        "Done: {} submitted, {} executed, {} discarded",
        stats.submitted, stats.executed, stats.discarded
    );
    Ok(())
}

/// Submit one job per offset, each from its own thread, in random order.
fn submit_shuffled(scheduler: &Arc<Scheduler>, offsets_ms: &[i64]) -> Result<(), SchedulerError> {
    let mut offsets = offsets_ms.to_vec();
    offsets.shuffle(&mut rand::thread_rng());

    let base = Instant::now();
    let submitters: Vec<_> = offsets
        .into_iter()
        .map(|offset| {
            let scheduler = Arc::clone(scheduler);
            thread::spawn(move || {
                let run_at = offset_from(base, offset)?;
                scheduler.submit(run_at, move || {
                    info!("  job for offset {}ms running", offset);
                })
            })
        })
        .collect();

    for submitter in submitters {
        match submitter.join() {
            Ok(result) => {
                result?;
            }
            Err(_) => error!("Submitter thread panicked"),
        }
    }
    Ok(())
}

/// `base` shifted by a signed millisecond offset.
///
/// Offsets reaching before the clock's origin clamp to `base`, which is
/// already overdue by the time the job is queued.
fn offset_from(base: Instant, offset_ms: i64) -> Result<Instant, SchedulerError> {
    let magnitude = Duration::from_millis(offset_ms.unsigned_abs());
    if offset_ms >= 0 {
        base.checked_add(magnitude)
            .ok_or(SchedulerError::WakeTimeOverflow { delay: magnitude })
    } else {
        Ok(base.checked_sub(magnitude).unwrap_or(base))
    }
}

/// Validate a configuration file.
fn validate_config(file: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    info!("Validating configuration: {}", file.display());

    match ConfigLoader::load(&file) {
        Ok(config) => {
            info!(
                "Configuration is valid: {} worker thread(s), {} queue",
                config.worker_threads, config.queue
            );
            Ok(())
        }
        Err(e) => {
            error!("Validation failed: {}", e);
            Err(e.into())
        }
    }
}
