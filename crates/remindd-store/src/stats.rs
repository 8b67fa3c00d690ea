//! Aggregate statistics snapshot, recomputed hourly by the maintenance job
//! and opportunistically on demand by admin-facing reads.

use chrono::{DateTime, Utc};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::db::utc_midnight;
use crate::error::Result;

/// Process-wide aggregate counts. Staleness up to the refresh interval is
/// acceptable for readers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub total_users: u32,
    pub active_users: u32,
    /// Active (not soft-deleted) reminders, sent or not.
    pub active_reminders: u32,
    /// Reminders delivered whose due time fell on the current UTC day.
    pub sent_today: u32,
    pub refreshed_at: DateTime<Utc>,
}

/// Recompute the aggregates and upsert the single snapshot row.
pub fn refresh(conn: &Connection, now: DateTime<Utc>) -> Result<StatsSnapshot> {
    let sent_today = conn.query_row(
        "SELECT COUNT(*) FROM reminders WHERE is_sent = 1 AND due_at >= ?1",
        [utc_midnight(now).to_rfc3339()],
        |row| row.get(0),
    )?;
    let active_reminders = conn.query_row(
        "SELECT COUNT(*) FROM reminders WHERE state = 'active'",
        [],
        |row| row.get(0),
    )?;

    let snapshot = StatsSnapshot {
        total_users: crate::user::count_all(conn)?,
        active_users: crate::user::count_active(conn)?,
        active_reminders,
        sent_today,
        refreshed_at: now,
    };

    conn.execute(
        "INSERT OR REPLACE INTO bot_stats
         (id, total_users, active_users, active_reminders, sent_today, refreshed_at)
         VALUES (1,?1,?2,?3,?4,?5)",
        rusqlite::params![
            snapshot.total_users,
            snapshot.active_users,
            snapshot.active_reminders,
            snapshot.sent_today,
            snapshot.refreshed_at.to_rfc3339(),
        ],
    )?;
    Ok(snapshot)
}

/// Read the current snapshot; recompute on the spot if none has been
/// written yet, so readers always see something.
pub fn get(conn: &Connection, now: DateTime<Utc>) -> Result<StatsSnapshot> {
    let mut stmt = conn.prepare(
        "SELECT total_users, active_users, active_reminders, sent_today, refreshed_at
         FROM bot_stats WHERE id = 1",
    )?;
    let mut rows = stmt.query_map([], |row| {
        Ok(StatsSnapshot {
            total_users: row.get(0)?,
            active_users: row.get(1)?,
            active_reminders: row.get(2)?,
            sent_today: row.get(3)?,
            refreshed_at: crate::db::parse_ts(&row.get::<_, String>(4)?)?,
        })
    })?;

    match rows.next().transpose()? {
        Some(snapshot) => Ok(snapshot),
        None => refresh(conn, now),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn test_conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::init_db(&conn).unwrap();
        conn
    }

    fn insert_reminder(conn: &Connection, due_at: DateTime<Utc>, is_sent: bool, state: &str) {
        conn.execute(
            "INSERT INTO reminders
             (id, user_id, title, description, due_at, category, recurrence,
              is_sent, state, created_at)
             VALUES (?1,1,'t',NULL,?2,'task',NULL,?3,?4,?5)",
            rusqlite::params![
                uuid::Uuid::new_v4().to_string(),
                due_at.to_rfc3339(),
                is_sent as i64,
                state,
                Utc::now().to_rfc3339()
            ],
        )
        .unwrap();
    }

    #[test]
    fn refresh_counts_users_and_reminders() {
        let conn = test_conn();
        let now = Utc::now();
        crate::user::create(&conn, 1, None).unwrap();
        crate::user::create(&conn, 2, None).unwrap();
        crate::user::set_active(&conn, 2, false).unwrap();

        insert_reminder(&conn, now, true, "active"); // sent today
        insert_reminder(&conn, now - Duration::days(2), true, "active"); // sent, older day
        insert_reminder(&conn, now + Duration::hours(1), false, "active");
        insert_reminder(&conn, now + Duration::hours(1), false, "deleted");

        let s = refresh(&conn, now).unwrap();
        assert_eq!(s.total_users, 2);
        assert_eq!(s.active_users, 1);
        assert_eq!(s.active_reminders, 3);
        assert_eq!(s.sent_today, 1);
    }

    #[test]
    fn get_recomputes_when_no_snapshot_exists() {
        let conn = test_conn();
        let now = Utc::now();
        crate::user::create(&conn, 1, None).unwrap();

        let fresh = get(&conn, now).unwrap();
        assert_eq!(fresh.total_users, 1);

        // A stored snapshot is returned as-is, not recomputed.
        crate::user::create(&conn, 2, None).unwrap();
        let cached = get(&conn, now).unwrap();
        assert_eq!(cached.total_users, 1);

        let refreshed = refresh(&conn, now).unwrap();
        assert_eq!(refreshed.total_users, 2);
    }
}
