//! Reminder records — shared between the store, the dispatch loop, and all
//! channel notifiers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::types::{Category, ReminderState};

pub const MAX_TITLE_LEN: usize = 200;
pub const MAX_DESCRIPTION_LEN: usize = 1000;

/// A persisted reminder.
///
/// Deliverable iff `state == Active && !is_sent && due_at <= now`.
/// `is_sent` only ever flips false → true; `state` only Active → Deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reminder {
    /// UUID v4 string — assigned at creation, immutable.
    pub id: String,
    /// Owning user's Telegram chat id. A reference, not ownership — the
    /// store owns the row, the user is looked up by id.
    pub user_id: i64,
    pub title: String,
    pub description: Option<String>,
    /// Absolute due instant (UTC). Strictly in the future at creation time.
    pub due_at: DateTime<Utc>,
    pub category: Category,
    /// Recurrence pattern kept in the schema for the creation flow's use.
    /// Dispatch never reads it — recurring reminders arrive as independent
    /// single-shot rows.
    pub recurrence: Option<String>,
    pub is_sent: bool,
    pub state: ReminderState,
    pub created_at: DateTime<Utc>,
}

impl Reminder {
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.state == ReminderState::Active && !self.is_sent && self.due_at <= now
    }
}

/// Creation payload handed to the store by the (external) creation flow.
#[derive(Debug, Clone)]
pub struct NewReminder {
    pub user_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub due_at: DateTime<Utc>,
    pub category: Category,
    pub recurrence: Option<String>,
}

impl NewReminder {
    /// Check the payload against the creation rules. Runs before any insert;
    /// a failed validation never touches the database.
    pub fn validate(&self, now: DateTime<Utc>) -> std::result::Result<(), ValidationError> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(ValidationError::EmptyTitle);
        }
        if title.chars().count() > MAX_TITLE_LEN {
            return Err(ValidationError::TitleTooLong {
                len: title.chars().count(),
            });
        }
        if let Some(desc) = &self.description {
            if desc.chars().count() > MAX_DESCRIPTION_LEN {
                return Err(ValidationError::DescriptionTooLong {
                    len: desc.chars().count(),
                });
            }
        }
        if self.due_at <= now {
            return Err(ValidationError::DueInPast);
        }
        Ok(())
    }
}
