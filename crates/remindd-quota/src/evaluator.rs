use chrono::{Duration, Utc};
use tracing::{debug, warn};

use remindd_core::config::PlansConfig;
use remindd_core::Tier;
use remindd_store::{ReminderStore, Result};

/// Outcome of a quota evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuotaDecision {
    Approved,
    Rejected(QuotaDenial),
}

impl QuotaDecision {
    /// The boolean gate the creation flow acts on.
    pub fn is_approved(&self) -> bool {
        matches!(self, QuotaDecision::Approved)
    }
}

/// Why a creation request was turned down.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuotaDenial {
    /// The user has never been provisioned; registration comes first.
    NoSuchUser,
    /// The tier's cap on simultaneously active reminders is reached.
    TotalLimitReached { limit: u32 },
    /// The tier's cap on reminders created today (UTC) is reached.
    DailyLimitReached { limit: u32 },
}

/// Decides whether a user may create another reminder, given their tier and
/// current usage. Tier definitions are injected at construction; nothing is
/// read from ambient state.
pub struct QuotaEvaluator {
    store: ReminderStore,
    plans: PlansConfig,
}

impl QuotaEvaluator {
    pub fn new(store: ReminderStore, plans: PlansConfig) -> Self {
        Self { store, plans }
    }

    /// Evaluate a creation request for `telegram_id`.
    ///
    /// An expired paid tier is evaluated as Free, and the downgrade is
    /// written back fire-and-forget: a failed write is logged and the
    /// evaluation still proceeds on the in-memory Free limits — a
    /// bookkeeping hiccup must not block creation.
    pub fn can_create(&self, telegram_id: i64) -> Result<QuotaDecision> {
        let now = Utc::now();

        let Some(user) = self.store.user(telegram_id)? else {
            return Ok(QuotaDecision::Rejected(QuotaDenial::NoSuchUser));
        };

        let effective = user.effective_tier(now);
        if effective != user.tier {
            debug!(telegram_id, expired_tier = %user.tier, "tier expired; evaluating as free");
            if let Err(e) = self.store.set_user_tier(
                telegram_id,
                Tier::Free,
                // Free never expires; push the horizon far out.
                now + Duration::days(365 * 100),
            ) {
                warn!(telegram_id, error = %e, "tier downgrade write failed; continuing with free limits");
            }
        }

        let limits = self.plans.limits_for(effective);

        if let Some(limit) = limits.max_total.limit() {
            let active = self.store.count_active_for_user(telegram_id)?;
            if active >= limit {
                return Ok(QuotaDecision::Rejected(QuotaDenial::TotalLimitReached {
                    limit,
                }));
            }
        }

        if let Some(limit) = limits.max_daily.limit() {
            let today = self.store.count_created_today_for_user(telegram_id, now)?;
            if today >= limit {
                return Ok(QuotaDecision::Rejected(QuotaDenial::DailyLimitReached {
                    limit,
                }));
            }
        }

        Ok(QuotaDecision::Approved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    use remindd_core::{Category, NewReminder};
    use rusqlite::Connection;

    fn setup() -> (Arc<Mutex<Connection>>, ReminderStore, QuotaEvaluator) {
        let conn = Arc::new(Mutex::new(Connection::open_in_memory().unwrap()));
        let store = ReminderStore::new(Arc::clone(&conn)).unwrap();
        let eval = QuotaEvaluator::new(store.clone(), PlansConfig::default());
        (conn, store, eval)
    }

    fn add_reminders(store: &ReminderStore, user: i64, n: usize) {
        let due = Utc::now() + Duration::hours(2);
        for i in 0..n {
            store
                .create_reminder(&NewReminder {
                    user_id: user,
                    title: format!("r{i}"),
                    description: None,
                    due_at: due,
                    category: Category::Task,
                    recurrence: None,
                })
                .unwrap();
        }
    }

    /// Backdate every creation timestamp so the daily window sees nothing.
    fn age_creations(conn: &Arc<Mutex<Connection>>) {
        let yesterday = (Utc::now() - Duration::days(1)).to_rfc3339();
        conn.lock()
            .unwrap()
            .execute("UPDATE reminders SET created_at = ?1", [&yesterday])
            .unwrap();
    }

    #[test]
    fn unknown_user_is_rejected() {
        let (_, _, eval) = setup();
        assert_eq!(
            eval.can_create(404).unwrap(),
            QuotaDecision::Rejected(QuotaDenial::NoSuchUser)
        );
    }

    #[test]
    fn free_tier_total_cap_binds_regardless_of_daily_count() {
        let (conn, store, eval) = setup();
        store.create_user(1, None).unwrap();
        add_reminders(&store, 1, 3);
        age_creations(&conn);
        add_reminders(&store, 1, 2);
        age_creations(&conn);

        // 5 active, 0 created today: the total cap alone rejects.
        assert_eq!(
            eval.can_create(1).unwrap(),
            QuotaDecision::Rejected(QuotaDenial::TotalLimitReached { limit: 5 })
        );
    }

    #[test]
    fn free_tier_daily_boundary() {
        let (_conn, store, eval) = setup();
        store.create_user(1, None).unwrap();

        add_reminders(&store, 1, 2);
        // 2 active, 2 created today: a third creation is still allowed.
        assert!(eval.can_create(1).unwrap().is_approved());

        add_reminders(&store, 1, 1);
        // 3 created today: the daily cap now rejects.
        assert_eq!(
            eval.can_create(1).unwrap(),
            QuotaDecision::Rejected(QuotaDenial::DailyLimitReached { limit: 3 })
        );
    }

    #[test]
    fn expired_premium_is_evaluated_as_free_and_downgraded() {
        let (_conn, store, eval) = setup();
        store.create_user(1, None).unwrap();
        store
            .set_user_tier(1, Tier::Premium, Utc::now() - Duration::days(1))
            .unwrap();
        add_reminders(&store, 1, 3);

        // Premium would allow 50/day; the expired tier is held to free's 3.
        assert_eq!(
            eval.can_create(1).unwrap(),
            QuotaDecision::Rejected(QuotaDenial::DailyLimitReached { limit: 3 })
        );

        // The downgrade side effect was persisted.
        let user = store.user(1).unwrap().unwrap();
        assert_eq!(user.tier, Tier::Free);
        assert!(user.tier_expires_at > Utc::now());
    }

    #[test]
    fn unlimited_tier_never_rejects_on_volume() {
        let (_conn, store, eval) = setup();
        store.create_user(1, None).unwrap();
        store
            .set_user_tier(1, Tier::Unlimited, Utc::now() + Duration::days(30))
            .unwrap();
        add_reminders(&store, 1, 60);
        assert!(eval.can_create(1).unwrap().is_approved());
    }

    #[test]
    fn premium_allows_past_free_caps() {
        let (_conn, store, eval) = setup();
        store.create_user(1, None).unwrap();
        store
            .set_user_tier(1, Tier::Premium, Utc::now() + Duration::days(30))
            .unwrap();
        add_reminders(&store, 1, 10);
        assert!(eval.can_create(1).unwrap().is_approved());
    }

    #[test]
    fn deleting_a_reminder_refunds_quota() {
        let (_conn, store, eval) = setup();
        store.create_user(1, None).unwrap();
        add_reminders(&store, 1, 3);
        assert!(!eval.can_create(1).unwrap().is_approved());

        let victim = &store.reminders_for_user(1).unwrap()[0];
        assert!(store.soft_delete(&victim.id, 1).unwrap());
        assert!(eval.can_create(1).unwrap().is_approved());
    }
}
