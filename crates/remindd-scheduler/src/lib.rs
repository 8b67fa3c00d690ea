//! `remindd-scheduler` — in-process recurring task facility.
//!
//! # Overview
//!
//! Jobs are registered by id in a table and driven by a single engine loop
//! that polls every second, spawning any job whose `next_run` has arrived.
//! Each job is single-flight: a run still in progress when the next window
//! opens makes the engine skip that window rather than stack a second run.
//!
//! # Schedule variants
//!
//! | Variant    | Behaviour                              |
//! |------------|----------------------------------------|
//! | `Interval` | Repeat every N seconds                 |
//! | `Daily`    | Fire at HH:MM UTC every day            |

pub mod error;
pub mod schedule;
pub mod scheduler;
pub mod types;

pub use error::{Result, SchedulerError};
pub use schedule::compute_next_run;
pub use scheduler::Scheduler;
pub use types::{JobInfo, Schedule, SchedulerStatus};
