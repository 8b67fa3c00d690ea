//! `remindd-store` — SQLite persistence for reminders, users, and the
//! statistics snapshot.
//!
//! Query functions live in per-table modules and operate on a plain
//! `&Connection`; the [`ReminderStore`] handle wraps a shared connection
//! behind a mutex and is what the rest of the engine talks to.

pub mod db;
pub mod error;
pub mod reminder;
pub mod stats;
pub mod store;
pub mod user;

pub use error::{Result, StoreError};
pub use stats::StatsSnapshot;
pub use store::ReminderStore;
