//! Reminder table queries. All functions take a plain `&Connection`; the
//! [`crate::store::ReminderStore`] handle provides the locked wrapper.

use chrono::{DateTime, Utc};
use rusqlite::Connection;
use tracing::info;
use uuid::Uuid;

use remindd_core::{NewReminder, Reminder, ReminderState};

use crate::db::utc_midnight;
use crate::error::{Result, StoreError};

/// Column order shared by every SELECT in this module.
const REMINDER_COLS: &str =
    "id, user_id, title, description, due_at, category, recurrence, is_sent, state, created_at";

/// Map a SELECT row (column order from REMINDER_COLS) to a Reminder.
pub(crate) fn row_to_reminder(row: &rusqlite::Row<'_>) -> rusqlite::Result<Reminder> {
    Ok(Reminder {
        id: row.get(0)?,
        user_id: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        due_at: crate::db::parse_ts(&row.get::<_, String>(4)?)?,
        category: row
            .get::<_, String>(5)?
            .parse()
            .unwrap_or_default(),
        recurrence: row.get(6)?,
        is_sent: row.get::<_, i64>(7)? != 0,
        state: row
            .get::<_, String>(8)?
            .parse()
            .unwrap_or(ReminderState::Active),
        created_at: crate::db::parse_ts(&row.get::<_, String>(9)?)?,
    })
}

/// Validate and insert a new reminder. The owner must already be
/// provisioned; validation failures never touch the table.
pub fn create(conn: &Connection, new: &NewReminder) -> Result<Reminder> {
    let now = Utc::now();
    new.validate(now)?;
    if crate::user::get(conn, new.user_id)?.is_none() {
        return Err(StoreError::UserNotFound {
            telegram_id: new.user_id,
        });
    }

    let reminder = Reminder {
        id: Uuid::new_v4().to_string(),
        user_id: new.user_id,
        title: new.title.trim().to_string(),
        description: new.description.clone(),
        due_at: new.due_at,
        category: new.category,
        recurrence: new.recurrence.clone(),
        is_sent: false,
        state: ReminderState::Active,
        created_at: now,
    };

    conn.execute(
        "INSERT INTO reminders
         (id, user_id, title, description, due_at, category, recurrence,
          is_sent, state, created_at)
         VALUES (?1,?2,?3,?4,?5,?6,?7,0,'active',?8)",
        rusqlite::params![
            reminder.id,
            reminder.user_id,
            reminder.title,
            reminder.description,
            reminder.due_at.to_rfc3339(),
            reminder.category.to_string(),
            reminder.recurrence,
            reminder.created_at.to_rfc3339(),
        ],
    )?;

    info!(reminder_id = %reminder.id, user_id = reminder.user_id, "reminder created");
    Ok(reminder)
}

/// Active reminders for one user, soonest first.
pub fn for_user(conn: &Connection, telegram_id: i64) -> Result<Vec<Reminder>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {REMINDER_COLS} FROM reminders
         WHERE user_id = ?1 AND state = 'active'
         ORDER BY due_at"
    ))?;
    let reminders = stmt
        .query_map([telegram_id], row_to_reminder)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(reminders)
}

/// Fetch one reminder, scoped to its owner.
pub fn get(conn: &Connection, id: &str, owner: i64) -> Result<Option<Reminder>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {REMINDER_COLS} FROM reminders WHERE id = ?1 AND user_id = ?2"
    ))?;
    let mut rows = stmt.query_map(rusqlite::params![id, owner], row_to_reminder)?;
    rows.next().transpose().map_err(StoreError::from)
}

/// The due set: active, unsent, due at or before `now`, owned by a user the
/// channel can still reach. Capped at `cap` rows; the remainder is picked up
/// by the next cycle.
pub fn find_due(conn: &Connection, now: DateTime<Utc>, cap: u32) -> Result<Vec<Reminder>> {
    let mut stmt = conn.prepare_cached(
        "SELECT r.id, r.user_id, r.title, r.description, r.due_at, r.category,
                r.recurrence, r.is_sent, r.state, r.created_at
         FROM reminders r
         JOIN users u ON u.telegram_id = r.user_id
         WHERE r.state = 'active' AND r.is_sent = 0 AND r.due_at <= ?1
           AND u.is_active = 1
         ORDER BY r.due_at
         LIMIT ?2",
    )?;
    let due = stmt
        .query_map(rusqlite::params![now.to_rfc3339(), cap], row_to_reminder)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(due)
}

/// Record a successful delivery. Idempotent — marking an already-sent
/// reminder changes nothing. Returns false when no such row exists.
pub fn mark_sent(conn: &Connection, id: &str) -> Result<bool> {
    let n = conn.execute("UPDATE reminders SET is_sent = 1 WHERE id = ?1", [id])?;
    Ok(n > 0)
}

/// Soft-delete: Active → Deleted, owner-scoped. The row stays for audit
/// until the cleanup job purges it. Returns false when the reminder does
/// not exist, belongs to someone else, or is already deleted.
pub fn soft_delete(conn: &Connection, id: &str, owner: i64) -> Result<bool> {
    let n = conn.execute(
        "UPDATE reminders SET state = 'deleted'
         WHERE id = ?1 AND user_id = ?2 AND state = 'active'",
        rusqlite::params![id, owner],
    )?;
    if n > 0 {
        info!(reminder_id = %id, user_id = owner, "reminder soft-deleted");
    }
    Ok(n > 0)
}

/// Hard-purge delivered reminders whose due time is before `cutoff`.
/// Unsent rows are never purged here, regardless of age.
pub fn purge_sent_older_than(conn: &Connection, cutoff: DateTime<Utc>) -> Result<usize> {
    let n = conn.execute(
        "DELETE FROM reminders WHERE is_sent = 1 AND due_at < ?1",
        [cutoff.to_rfc3339()],
    )?;
    Ok(n)
}

/// Count of active reminders for the total quota bound.
pub fn count_active_for_user(conn: &Connection, telegram_id: i64) -> Result<u32> {
    let n = conn.query_row(
        "SELECT COUNT(*) FROM reminders WHERE user_id = ?1 AND state = 'active'",
        [telegram_id],
        |row| row.get(0),
    )?;
    Ok(n)
}

/// Count of active reminders created since UTC midnight, for the daily
/// quota bound. Deleting a reminder refunds the daily allowance.
pub fn count_created_today_for_user(
    conn: &Connection,
    telegram_id: i64,
    now: DateTime<Utc>,
) -> Result<u32> {
    let n = conn.query_row(
        "SELECT COUNT(*) FROM reminders
         WHERE user_id = ?1 AND state = 'active' AND created_at >= ?2",
        rusqlite::params![telegram_id, utc_midnight(now).to_rfc3339()],
        |row| row.get(0),
    )?;
    Ok(n)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use remindd_core::Category;

    fn test_conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::init_db(&conn).unwrap();
        crate::user::create(&conn, 100, Some("alice")).unwrap();
        conn
    }

    fn new_reminder(user_id: i64, due_at: DateTime<Utc>) -> NewReminder {
        NewReminder {
            user_id,
            title: "Water the plants".to_string(),
            description: None,
            due_at,
            category: Category::Task,
            recurrence: None,
        }
    }

    /// Insert a row directly, bypassing `create`'s future-due validation, so
    /// tests can construct already-due and aged reminders.
    fn insert_raw(
        conn: &Connection,
        user_id: i64,
        due_at: DateTime<Utc>,
        is_sent: bool,
        state: &str,
    ) -> String {
        let id = Uuid::new_v4().to_string();
        conn.execute(
            "INSERT INTO reminders
             (id, user_id, title, description, due_at, category, recurrence,
              is_sent, state, created_at)
             VALUES (?1,?2,'t',NULL,?3,'task',NULL,?4,?5,?6)",
            rusqlite::params![
                id,
                user_id,
                due_at.to_rfc3339(),
                is_sent as i64,
                state,
                Utc::now().to_rfc3339()
            ],
        )
        .unwrap();
        id
    }

    #[test]
    fn create_rejects_unknown_user() {
        let conn = test_conn();
        let now = Utc::now();
        let err = create(&conn, &new_reminder(999, now + Duration::hours(1))).unwrap_err();
        assert!(matches!(err, StoreError::UserNotFound { telegram_id: 999 }));
    }

    #[test]
    fn create_rejects_past_due_without_writing() {
        let conn = test_conn();
        let now = Utc::now();
        let err = create(&conn, &new_reminder(100, now - Duration::minutes(1))).unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));
        assert_eq!(count_active_for_user(&conn, 100).unwrap(), 0);
    }

    #[test]
    fn find_due_filters_eligibility() {
        let conn = test_conn();
        let now = Utc::now();

        let due = insert_raw(&conn, 100, now - Duration::minutes(5), false, "active");
        insert_raw(&conn, 100, now + Duration::hours(1), false, "active"); // future
        insert_raw(&conn, 100, now - Duration::minutes(5), true, "active"); // already sent
        insert_raw(&conn, 100, now - Duration::minutes(5), false, "deleted"); // tombstoned

        let found = find_due(&conn, now, 500).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, due);
    }

    #[test]
    fn find_due_skips_deactivated_owners() {
        let conn = test_conn();
        let now = Utc::now();
        insert_raw(&conn, 100, now - Duration::minutes(5), false, "active");
        crate::user::set_active(&conn, 100, false).unwrap();
        assert!(find_due(&conn, now, 500).unwrap().is_empty());
    }

    #[test]
    fn find_due_caps_batch_and_orders_by_due() {
        let conn = test_conn();
        let now = Utc::now();
        for i in 0..5 {
            insert_raw(&conn, 100, now - Duration::minutes(10 - i), false, "active");
        }
        let found = find_due(&conn, now, 3).unwrap();
        assert_eq!(found.len(), 3);
        assert!(found.windows(2).all(|w| w[0].due_at <= w[1].due_at));
    }

    #[test]
    fn mark_sent_is_idempotent() {
        let conn = test_conn();
        let now = Utc::now();
        let id = insert_raw(&conn, 100, now - Duration::minutes(1), false, "active");

        assert!(mark_sent(&conn, &id).unwrap());
        let after_first = get(&conn, &id, 100).unwrap().unwrap();
        assert!(after_first.is_sent);

        // Second call: still true, state unchanged.
        assert!(mark_sent(&conn, &id).unwrap());
        let after_second = get(&conn, &id, 100).unwrap().unwrap();
        assert!(after_second.is_sent);
        assert_eq!(after_second.state, ReminderState::Active);

        assert!(!mark_sent(&conn, "no-such-id").unwrap());
    }

    #[test]
    fn soft_delete_is_owner_scoped_and_monotonic() {
        let conn = test_conn();
        let now = Utc::now();
        let id = insert_raw(&conn, 100, now + Duration::hours(1), false, "active");

        assert!(!soft_delete(&conn, &id, 999).unwrap()); // wrong owner
        assert!(soft_delete(&conn, &id, 100).unwrap());
        assert!(!soft_delete(&conn, &id, 100).unwrap()); // already deleted

        let r = get(&conn, &id, 100).unwrap().unwrap();
        assert_eq!(r.state, ReminderState::Deleted);
        assert!(for_user(&conn, 100).unwrap().is_empty());
    }

    #[test]
    fn purge_respects_retention_and_never_touches_unsent() {
        let conn = test_conn();
        let now = Utc::now();
        let cutoff = now - Duration::days(30);

        let old_sent = insert_raw(&conn, 100, now - Duration::days(31), true, "active");
        let recent_sent = insert_raw(&conn, 100, now - Duration::days(29), true, "active");
        let ancient_unsent = insert_raw(&conn, 100, now - Duration::days(60), false, "active");

        assert_eq!(purge_sent_older_than(&conn, cutoff).unwrap(), 1);
        assert!(get(&conn, &old_sent, 100).unwrap().is_none());
        assert!(get(&conn, &recent_sent, 100).unwrap().is_some());
        assert!(get(&conn, &ancient_unsent, 100).unwrap().is_some());
    }

    #[test]
    fn daily_count_sees_only_todays_active_rows() {
        let conn = test_conn();
        let now = Utc::now();

        let today = create(&conn, &new_reminder(100, now + Duration::hours(1))).unwrap();
        create(&conn, &new_reminder(100, now + Duration::hours(2))).unwrap();

        // A row created yesterday.
        conn.execute(
            "UPDATE reminders SET created_at = ?1 WHERE id = ?2",
            rusqlite::params![(now - Duration::days(1)).to_rfc3339(), today.id],
        )
        .unwrap();

        assert_eq!(count_created_today_for_user(&conn, 100, now).unwrap(), 1);
        assert_eq!(count_active_for_user(&conn, 100).unwrap(), 2);
    }
}
