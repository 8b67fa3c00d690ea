//! User table queries.

use chrono::{DateTime, Duration, Utc};
use rusqlite::Connection;
use tracing::info;

use remindd_core::{Tier, User};

use crate::error::Result;

/// Free trial window granted to newly provisioned users.
const TRIAL_DAYS: i64 = 30;

/// Map a SELECT row (telegram_id, username, tier, tier_expires_at,
/// is_active, created_at) to a User.
pub(crate) fn row_to_user(row: &rusqlite::Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        telegram_id: row.get(0)?,
        username: row.get(1)?,
        tier: row.get::<_, String>(2)?.parse().unwrap_or_default(),
        tier_expires_at: crate::db::parse_ts(&row.get::<_, String>(3)?)?,
        is_active: row.get::<_, i64>(4)? != 0,
        created_at: crate::db::parse_ts(&row.get::<_, String>(5)?)?,
    })
}

/// Provision a user on the free tier with the introductory window.
/// Returns the existing record unchanged if the id is already known.
pub fn create(conn: &Connection, telegram_id: i64, username: Option<&str>) -> Result<User> {
    if let Some(existing) = get(conn, telegram_id)? {
        return Ok(existing);
    }

    let now = Utc::now();
    let user = User {
        telegram_id,
        username: username.map(String::from),
        tier: Tier::Free,
        tier_expires_at: now + Duration::days(TRIAL_DAYS),
        is_active: true,
        created_at: now,
    };
    conn.execute(
        "INSERT INTO users (telegram_id, username, tier, tier_expires_at, is_active, created_at)
         VALUES (?1,?2,?3,?4,1,?5)",
        rusqlite::params![
            user.telegram_id,
            user.username,
            user.tier.to_string(),
            user.tier_expires_at.to_rfc3339(),
            user.created_at.to_rfc3339(),
        ],
    )?;
    info!(telegram_id, "user provisioned");
    Ok(user)
}

pub fn get(conn: &Connection, telegram_id: i64) -> Result<Option<User>> {
    let mut stmt = conn.prepare(
        "SELECT telegram_id, username, tier, tier_expires_at, is_active, created_at
         FROM users WHERE telegram_id = ?1",
    )?;
    let mut rows = stmt.query_map([telegram_id], row_to_user)?;
    rows.next().transpose().map_err(crate::error::StoreError::from)
}

/// Flip the reachability flag. The dispatch loop calls this with `false`
/// after a permanent delivery failure.
pub fn set_active(conn: &Connection, telegram_id: i64, active: bool) -> Result<bool> {
    let n = conn.execute(
        "UPDATE users SET is_active = ?2 WHERE telegram_id = ?1",
        rusqlite::params![telegram_id, active as i64],
    )?;
    Ok(n > 0)
}

/// Move a user to `tier` until `expires_at`. Used by the subscription flow
/// and by the quota evaluator's expiry downgrade.
pub fn set_tier(
    conn: &Connection,
    telegram_id: i64,
    tier: Tier,
    expires_at: DateTime<Utc>,
) -> Result<bool> {
    let n = conn.execute(
        "UPDATE users SET tier = ?2, tier_expires_at = ?3 WHERE telegram_id = ?1",
        rusqlite::params![telegram_id, tier.to_string(), expires_at.to_rfc3339()],
    )?;
    Ok(n > 0)
}

pub fn count_all(conn: &Connection) -> Result<u32> {
    let n = conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?;
    Ok(n)
}

pub fn count_active(conn: &Connection) -> Result<u32> {
    let n = conn.query_row(
        "SELECT COUNT(*) FROM users WHERE is_active = 1",
        [],
        |row| row.get(0),
    )?;
    Ok(n)
}
