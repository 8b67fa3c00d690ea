use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use rusqlite::Connection;

use remindd_core::{NewReminder, Reminder, Tier, User};

use crate::error::Result;
use crate::stats::StatsSnapshot;

/// Shared store handle. Wraps one connection behind a mutex so the dispatch
/// loop, the quota evaluator, and the maintenance jobs can all hold it;
/// cloning is cheap.
///
/// Every statement runs and commits on its own, which is all the
/// consistency the engine needs — cross-cycle exclusion comes from the
/// dispatcher's single-flight gate, not from store-level locking.
#[derive(Clone)]
pub struct ReminderStore {
    conn: Arc<Mutex<Connection>>,
}

impl ReminderStore {
    /// Wrap a shared connection, initialising the schema if needed.
    pub fn new(conn: Arc<Mutex<Connection>>) -> Result<Self> {
        crate::db::init_db(&conn.lock().unwrap())?;
        Ok(Self { conn })
    }

    /// Convenience for a store over its own private connection.
    pub fn open(conn: Connection) -> Result<Self> {
        Self::new(Arc::new(Mutex::new(conn)))
    }

    // ── reminders ───────────────────────────────────────────────────────────

    /// Validate and persist a new reminder for a provisioned user.
    pub fn create_reminder(&self, new: &NewReminder) -> Result<Reminder> {
        let conn = self.conn.lock().unwrap();
        crate::reminder::create(&conn, new)
    }

    /// Active reminders for one user, soonest first.
    pub fn reminders_for_user(&self, telegram_id: i64) -> Result<Vec<Reminder>> {
        let conn = self.conn.lock().unwrap();
        crate::reminder::for_user(&conn, telegram_id)
    }

    /// One reminder, scoped to its owner.
    pub fn reminder(&self, id: &str, owner: i64) -> Result<Option<Reminder>> {
        let conn = self.conn.lock().unwrap();
        crate::reminder::get(&conn, id, owner)
    }

    /// The due set at `now`, capped at `cap` rows.
    pub fn find_due(&self, now: DateTime<Utc>, cap: u32) -> Result<Vec<Reminder>> {
        let conn = self.conn.lock().unwrap();
        crate::reminder::find_due(&conn, now, cap)
    }

    /// Record a successful delivery (idempotent).
    pub fn mark_sent(&self, id: &str) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        crate::reminder::mark_sent(&conn, id)
    }

    /// Tombstone a reminder on behalf of its owner.
    pub fn soft_delete(&self, id: &str, owner: i64) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        crate::reminder::soft_delete(&conn, id, owner)
    }

    /// Hard-purge delivered reminders due before `cutoff`.
    pub fn purge_sent_older_than(&self, cutoff: DateTime<Utc>) -> Result<usize> {
        let conn = self.conn.lock().unwrap();
        crate::reminder::purge_sent_older_than(&conn, cutoff)
    }

    pub fn count_active_for_user(&self, telegram_id: i64) -> Result<u32> {
        let conn = self.conn.lock().unwrap();
        crate::reminder::count_active_for_user(&conn, telegram_id)
    }

    pub fn count_created_today_for_user(&self, telegram_id: i64, now: DateTime<Utc>) -> Result<u32> {
        let conn = self.conn.lock().unwrap();
        crate::reminder::count_created_today_for_user(&conn, telegram_id, now)
    }

    // ── users ───────────────────────────────────────────────────────────────

    /// Provision a user (no-op when the id is already known).
    pub fn create_user(&self, telegram_id: i64, username: Option<&str>) -> Result<User> {
        let conn = self.conn.lock().unwrap();
        crate::user::create(&conn, telegram_id, username)
    }

    pub fn user(&self, telegram_id: i64) -> Result<Option<User>> {
        let conn = self.conn.lock().unwrap();
        crate::user::get(&conn, telegram_id)
    }

    /// Flip a user's reachability flag.
    pub fn set_user_active(&self, telegram_id: i64, active: bool) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        crate::user::set_active(&conn, telegram_id, active)
    }

    /// Change a user's tier and its expiry.
    pub fn set_user_tier(
        &self,
        telegram_id: i64,
        tier: Tier,
        expires_at: DateTime<Utc>,
    ) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        crate::user::set_tier(&conn, telegram_id, tier, expires_at)
    }

    // ── statistics ──────────────────────────────────────────────────────────

    /// Recompute and persist the aggregate snapshot.
    pub fn refresh_stats(&self) -> Result<StatsSnapshot> {
        let conn = self.conn.lock().unwrap();
        crate::stats::refresh(&conn, Utc::now())
    }

    /// Current snapshot; computed on the spot when none exists yet.
    pub fn stats(&self) -> Result<StatsSnapshot> {
        let conn = self.conn.lock().unwrap();
        crate::stats::get(&conn, Utc::now())
    }
}
