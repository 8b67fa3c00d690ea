//! `remindd-dispatch` — the delivery engine.
//!
//! [`Dispatcher::run_cycle`] drains the due set through a [`Notifier`],
//! marking successes sent and deactivating users the channel reports as
//! permanently unreachable. The maintenance module holds the other two
//! recurring jobs (purge, stats refresh) that share the scheduler.
//!
//! [`Notifier`]: remindd_core::Notifier

pub mod dispatcher;
pub mod maintenance;

pub use dispatcher::{CycleOutcome, Dispatcher};
