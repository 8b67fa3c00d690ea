use chrono::{DateTime, NaiveTime, Utc};
use rusqlite::Connection;

use crate::error::Result;

/// Initialise the reminder schema in `conn`.
///
/// Idempotent — safe to run on every startup. Indexes cover the dispatch
/// poll (state, is_sent, due_at) and the per-user listing/quota queries.
pub fn init_db(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS users (
            telegram_id     INTEGER NOT NULL PRIMARY KEY,
            username        TEXT,
            tier            TEXT    NOT NULL DEFAULT 'free',
            tier_expires_at TEXT    NOT NULL,   -- ISO-8601
            is_active       INTEGER NOT NULL DEFAULT 1,
            created_at      TEXT    NOT NULL
        );

        CREATE TABLE IF NOT EXISTS reminders (
            id          TEXT    NOT NULL PRIMARY KEY,
            user_id     INTEGER NOT NULL REFERENCES users(telegram_id),
            title       TEXT    NOT NULL,
            description TEXT,
            due_at      TEXT    NOT NULL,       -- ISO-8601
            category    TEXT    NOT NULL DEFAULT 'task',
            recurrence  TEXT,                   -- pattern, unused by dispatch
            is_sent     INTEGER NOT NULL DEFAULT 0,
            state       TEXT    NOT NULL DEFAULT 'active',
            created_at  TEXT    NOT NULL
        ) STRICT;

        -- Efficient polling: SELECT … WHERE state='active' AND is_sent=0 AND due_at <= ?
        CREATE INDEX IF NOT EXISTS idx_reminders_due_poll
            ON reminders (state, is_sent, due_at);
        CREATE INDEX IF NOT EXISTS idx_reminders_user_due
            ON reminders (user_id, due_at);

        -- Single process-wide snapshot row, upserted by the stats job.
        CREATE TABLE IF NOT EXISTS bot_stats (
            id               INTEGER NOT NULL PRIMARY KEY CHECK (id = 1),
            total_users      INTEGER NOT NULL,
            active_users     INTEGER NOT NULL,
            active_reminders INTEGER NOT NULL,
            sent_today       INTEGER NOT NULL,
            refreshed_at     TEXT    NOT NULL
        );
        ",
    )?;
    Ok(())
}

/// Parse a stored ISO-8601 timestamp back into UTC.
pub(crate) fn parse_ts(raw: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
        })
}

/// Start of the current UTC day — the window boundary for daily quotas and
/// the sent-today statistic.
pub(crate) fn utc_midnight(now: DateTime<Utc>) -> DateTime<Utc> {
    now.date_naive().and_time(NaiveTime::MIN).and_utc()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        init_db(&conn).unwrap();
        init_db(&conn).unwrap();
    }

    #[test]
    fn midnight_is_start_of_day() {
        let now = DateTime::parse_from_rfc3339("2025-03-14T15:09:26+00:00")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(
            utc_midnight(now).to_rfc3339(),
            "2025-03-14T00:00:00+00:00"
        );
    }
}
