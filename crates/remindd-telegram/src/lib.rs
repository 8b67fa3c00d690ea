//! `remindd-telegram` — Telegram delivery channel.
//!
//! Implements the engine's [`Notifier`] seam over a teloxide `Bot`:
//! formats the reminder alert, sends it (MarkdownV2 with a plain-text
//! fallback), and classifies Telegram errors into permanent vs transient
//! so the dispatch loop can react.
//!
//! [`Notifier`]: remindd_core::Notifier

pub mod error;
pub mod format;
pub mod notifier;

pub use error::{classify, TelegramError};
pub use notifier::TelegramNotifier;
