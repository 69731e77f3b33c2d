//! Scheduler facade.
//!
//! This module provides the application-facing `Scheduler`, which owns a
//! worker pool and exposes submit/start/stop.

mod engine;
mod types;

pub use engine::{Scheduler, SchedulerBuilder};
pub use types::{SchedulerError, SchedulerState};
