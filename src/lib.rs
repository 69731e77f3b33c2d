//! jobclock - an in-process job scheduler.
//!
//! Callers submit closures tagged with an absolute wake time; a fixed pool of
//! worker threads runs each one exactly once, as close as possible to its
//! wake time, without blocking the submitting thread.
//!
//! ```
//! use jobclock::Scheduler;
//! use std::time::{Duration, Instant};
//!
//! let scheduler = Scheduler::builder().worker_threads(2).build().unwrap();
//! scheduler.start().unwrap();
//! scheduler
//!     .submit(Instant::now() + Duration::from_millis(5), || println!("tick"))
//!     .unwrap();
//! scheduler.stop();
//! ```

pub mod config;
pub mod core;
pub mod events;
pub mod pool;
pub mod queue;
pub mod scheduler;
pub mod testing;

pub use config::{ConfigError, ConfigLoader, DEFAULT_WORKER_THREADS, SchedulerConfig};
pub use crate::core::task::{Job, ScheduledTask, Task};
pub use crate::core::types::{QueueKey, TaskId};
pub use events::{Event, EventBus, EventHandler};
pub use pool::{PoolStatsSnapshot, WorkerPool};
pub use queue::{HandOverHandQueue, Insertion, LockedQueue, QueueKind, TaskQueue};
pub use scheduler::{Scheduler, SchedulerBuilder, SchedulerError, SchedulerState};
