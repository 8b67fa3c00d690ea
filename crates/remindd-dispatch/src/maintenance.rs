//! The two maintenance jobs sharing the scheduler with the dispatch loop.

use chrono::{Duration, Utc};
use tracing::{debug, info};

use remindd_store::{ReminderStore, Result, StatsSnapshot};

/// Daily cleanup: hard-purge delivered reminders older than the retention
/// window, then refresh the statistics snapshot while we are at it.
///
/// Unsent reminders are never purged here, however old.
pub fn run_cleanup(store: &ReminderStore, retention_days: u32) -> Result<usize> {
    let cutoff = Utc::now() - Duration::days(retention_days as i64);
    let purged = store.purge_sent_older_than(cutoff)?;
    if purged > 0 {
        info!(purged, retention_days, "cleaned up old sent reminders");
    }
    store.refresh_stats()?;
    Ok(purged)
}

/// Hourly statistics refresh. Readers tolerate staleness up to the refresh
/// interval; admin-facing reads recompute on demand when no snapshot exists.
pub fn run_stats_refresh(store: &ReminderStore) -> Result<StatsSnapshot> {
    let snapshot = store.refresh_stats()?;
    debug!(
        total_users = snapshot.total_users,
        active_reminders = snapshot.active_reminders,
        "statistics refreshed"
    );
    Ok(snapshot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    use rusqlite::Connection;
    use uuid::Uuid;

    fn fixture() -> (Arc<Mutex<Connection>>, ReminderStore) {
        let conn = Arc::new(Mutex::new(Connection::open_in_memory().unwrap()));
        let store = ReminderStore::new(Arc::clone(&conn)).unwrap();
        store.create_user(1, None).unwrap();
        (conn, store)
    }

    fn insert_aged(
        conn: &Arc<Mutex<Connection>>,
        days_overdue: i64,
        is_sent: bool,
    ) -> String {
        let id = Uuid::new_v4().to_string();
        conn.lock()
            .unwrap()
            .execute(
                "INSERT INTO reminders
                 (id, user_id, title, description, due_at, category, recurrence,
                  is_sent, state, created_at)
                 VALUES (?1,1,'t',NULL,?2,'task',NULL,?3,'active',?4)",
                rusqlite::params![
                    id,
                    (Utc::now() - Duration::days(days_overdue)).to_rfc3339(),
                    is_sent as i64,
                    Utc::now().to_rfc3339()
                ],
            )
            .unwrap();
        id
    }

    #[test]
    fn cleanup_purges_only_old_sent_rows() {
        let (conn, store) = fixture();
        insert_aged(&conn, 31, true); // purged
        let recent = insert_aged(&conn, 29, true); // kept: inside retention
        let unsent = insert_aged(&conn, 60, false); // kept: never delivered

        let purged = run_cleanup(&store, 30).unwrap();
        assert_eq!(purged, 1);
        assert!(store.reminder(&recent, 1).unwrap().is_some());
        assert!(store.reminder(&unsent, 1).unwrap().is_some());
    }

    #[test]
    fn cleanup_refreshes_stats_snapshot() {
        let (conn, store) = fixture();
        insert_aged(&conn, 1, false);
        run_cleanup(&store, 30).unwrap();
        let stats = store.stats().unwrap();
        assert_eq!(stats.total_users, 1);
        assert_eq!(stats.active_reminders, 1);
    }

    #[test]
    fn stats_refresh_rewrites_snapshot() {
        let (_conn, store) = fixture();
        let before = run_stats_refresh(&store).unwrap();
        assert_eq!(before.total_users, 1);

        store.create_user(2, None).unwrap();
        let after = run_stats_refresh(&store).unwrap();
        assert_eq!(after.total_users, 2);
        assert!(after.refreshed_at >= before.refreshed_at);
    }
}
