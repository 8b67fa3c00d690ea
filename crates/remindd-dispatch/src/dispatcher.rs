use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use remindd_core::config::DispatchConfig;
use remindd_core::Notifier;
use remindd_store::{ReminderStore, Result};

/// Aggregate counts for one dispatch cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleOutcome {
    /// Deliveries actually attempted.
    pub attempted: u32,
    pub sent: u32,
    pub transient_failures: u32,
    pub permanent_failures: u32,
    /// Reminders passed over because their owner was deactivated earlier in
    /// the same cycle.
    pub skipped: u32,
}

/// Drives due reminders through the notifier, one bounded batch per cycle.
///
/// A cycle is single-flight: `run_cycle` refuses to overlap a still-running
/// predecessor, so two cycles can never race a delivery on the same row.
pub struct Dispatcher<N: Notifier> {
    store: ReminderStore,
    notifier: Arc<N>,
    config: DispatchConfig,
    cycle_gate: Mutex<()>,
}

impl<N: Notifier> Dispatcher<N> {
    pub fn new(store: ReminderStore, notifier: Arc<N>, config: DispatchConfig) -> Self {
        Self {
            store,
            notifier,
            config,
            cycle_gate: Mutex::new(()),
        }
    }

    /// Process one batch of due reminders.
    ///
    /// Per-item failures are classified and absorbed here; only a store
    /// failure aborts the cycle (the next scheduled cycle starts fresh).
    pub async fn run_cycle(&self) -> Result<CycleOutcome> {
        let Ok(_guard) = self.cycle_gate.try_lock() else {
            debug!("previous dispatch cycle still running — skipping this window");
            return Ok(CycleOutcome::default());
        };

        let due = self.store.find_due(Utc::now(), self.config.batch_cap)?;
        if due.is_empty() {
            // Quiet cycles stay quiet: nothing due, nothing logged.
            return Ok(CycleOutcome::default());
        }
        info!(count = due.len(), "processing due reminders");

        let mut outcome = CycleOutcome::default();
        // Owners that hit a permanent failure in this batch; their remaining
        // reminders are pointless to attempt until reactivation.
        let mut deactivated: HashSet<i64> = HashSet::new();
        let spacing = std::time::Duration::from_millis(self.config.send_spacing_ms);

        for (i, reminder) in due.iter().enumerate() {
            if i > 0 && !spacing.is_zero() {
                // Keeps the send rate under the channel's limits.
                tokio::time::sleep(spacing).await;
            }

            if deactivated.contains(&reminder.user_id) {
                outcome.skipped += 1;
                continue;
            }

            outcome.attempted += 1;
            match self.notifier.deliver(reminder).await {
                Ok(()) => match self.store.mark_sent(&reminder.id) {
                    Ok(_) => outcome.sent += 1,
                    Err(e) => {
                        // Delivered but not recorded; the next cycle
                        // re-attempts and mark_sent stays idempotent.
                        error!(reminder_id = %reminder.id, error = %e, "mark_sent failed after delivery");
                        outcome.transient_failures += 1;
                    }
                },
                Err(failure) if failure.is_permanent() => {
                    warn!(
                        reminder_id = %reminder.id,
                        user_id = reminder.user_id,
                        error = %failure,
                        "permanent delivery failure — deactivating user"
                    );
                    if let Err(e) = self.store.set_user_active(reminder.user_id, false) {
                        error!(user_id = reminder.user_id, error = %e, "failed to deactivate user");
                    }
                    deactivated.insert(reminder.user_id);
                    outcome.permanent_failures += 1;
                }
                Err(failure) => {
                    warn!(
                        reminder_id = %reminder.id,
                        error = %failure,
                        "transient delivery failure — will retry next cycle"
                    );
                    outcome.transient_failures += 1;
                }
            }
        }

        info!(
            sent = outcome.sent,
            failed = outcome.transient_failures + outcome.permanent_failures,
            skipped = outcome.skipped,
            "dispatch cycle complete"
        );
        Ok(outcome)
    }
}
