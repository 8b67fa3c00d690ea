use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Subscription tier. Quota limits per tier come from
/// [`crate::config::PlansConfig`], never from the tier itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    #[default]
    Free,
    Premium,
    Unlimited,
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Tier::Free => "free",
            Tier::Premium => "premium",
            Tier::Unlimited => "unlimited",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for Tier {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "free" => Ok(Tier::Free),
            "premium" => Ok(Tier::Premium),
            "unlimited" => Ok(Tier::Unlimited),
            other => Err(format!("unknown tier: {other}")),
        }
    }
}

/// A quota bound. `Unlimited` is a distinct variant rather than a sentinel
/// number, so no arithmetic can accidentally treat it as a count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Bound {
    Unlimited,
    Finite(u32),
}

impl Bound {
    /// True if a user currently holding `current` items may add one more.
    pub fn admits(self, current: u32) -> bool {
        match self {
            Bound::Unlimited => true,
            Bound::Finite(max) => current < max,
        }
    }

    /// The finite limit, if there is one.
    pub fn limit(self) -> Option<u32> {
        match self {
            Bound::Unlimited => None,
            Bound::Finite(max) => Some(max),
        }
    }
}

/// What kind of reminder this is. Drives the emoji and whether a follow-up
/// sticker is sent after delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    #[default]
    Task,
    Event,
    Meeting,
    Appointment,
    Birthday,
    Deadline,
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Category::Task => "task",
            Category::Event => "event",
            Category::Meeting => "meeting",
            Category::Appointment => "appointment",
            Category::Birthday => "birthday",
            Category::Deadline => "deadline",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "task" => Ok(Category::Task),
            "event" => Ok(Category::Event),
            "meeting" => Ok(Category::Meeting),
            "appointment" => Ok(Category::Appointment),
            "birthday" => Ok(Category::Birthday),
            "deadline" => Ok(Category::Deadline),
            other => Err(format!("unknown category: {other}")),
        }
    }
}

/// Lifecycle state of a reminder row.
///
/// `Deleted` is a tombstone: the row stays for audit until the cleanup job
/// hard-purges it, but it is invisible to user-facing and due-set queries.
/// The only transition is Active → Deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReminderState {
    Active,
    Deleted,
}

impl std::fmt::Display for ReminderState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ReminderState::Active => "active",
            ReminderState::Deleted => "deleted",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for ReminderState {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "active" => Ok(ReminderState::Active),
            "deleted" => Ok(ReminderState::Deleted),
            other => Err(format!("unknown reminder state: {other}")),
        }
    }
}

/// A registered user. Provisioned by the external registration flow before
/// any reminder can be created for them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Telegram chat id — externally issued, primary key.
    pub telegram_id: i64,
    pub username: Option<String>,
    pub tier: Tier,
    /// Past this instant the effective tier is Free; the quota evaluator
    /// persists the downgrade on its next evaluation.
    pub tier_expires_at: DateTime<Utc>,
    /// Cleared when the notification channel reports a permanent delivery
    /// failure (user blocked the bot, chat deleted). Never set back to true
    /// by this engine.
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// The tier quota evaluation should use at `now`, ignoring any
    /// not-yet-persisted downgrade.
    pub fn effective_tier(&self, now: DateTime<Utc>) -> Tier {
        if self.tier_expires_at <= now {
            Tier::Free
        } else {
            self.tier
        }
    }
}
