//! `remindd-core` — shared domain types and contracts for the reminder engine.
//!
//! Everything the other crates agree on lives here: the [`Reminder`] and
//! [`User`] records, tier/quota bounds, the [`Notifier`] delivery seam
//! consumed by the dispatch loop and implemented by channel adapters, and
//! the TOML + env configuration.

pub mod config;
pub mod error;
pub mod notify;
pub mod reminder;
pub mod types;

pub use config::RemindConfig;
pub use error::{CoreError, Result, ValidationError};
pub use notify::{DeliveryFailure, Notifier};
pub use reminder::{NewReminder, Reminder};
pub use types::{Bound, Category, ReminderState, Tier, User};
