//! The delivery seam between the dispatch loop and channel adapters.

use async_trait::async_trait;
use thiserror::Error;

use crate::reminder::Reminder;

/// A classified delivery failure.
///
/// `Permanent` means the destination will never succeed without external
/// intervention (blocked, chat deleted) — the dispatch loop deactivates the
/// owner and stops retrying. `Transient` is everything else; the reminder
/// stays due and is retried on the next cycle. Adapters must classify
/// unrecognised errors as `Transient` — retrying is safer than dropping.
#[derive(Debug, Error)]
pub enum DeliveryFailure {
    #[error("permanent delivery failure: {0}")]
    Permanent(String),

    #[error("transient delivery failure: {0}")]
    Transient(String),
}

impl DeliveryFailure {
    pub fn is_permanent(&self) -> bool {
        matches!(self, DeliveryFailure::Permanent(_))
    }
}

/// Delivers one reminder to its owner's external channel.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn deliver(&self, reminder: &Reminder) -> Result<(), DeliveryFailure>;
}
