use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::types::{Bound, Tier};

/// Top-level config (remindd.toml + REMINDD_* env overrides).
///
/// Passed into constructors at startup; nothing reads it from ambient
/// global state.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RemindConfig {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub telegram: TelegramConfig,
    #[serde(default)]
    pub dispatch: DispatchConfig,
    #[serde(default)]
    pub maintenance: MaintenanceConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub plans: PlansConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TelegramConfig {
    /// Bot API token. The daemon refuses to start without one.
    #[serde(default)]
    pub bot_token: String,
    /// Chat id of the operator; used by the (out-of-process) admin surface.
    pub admin_chat_id: Option<i64>,
    /// Sticker file id sent after high-urgency reminders. None disables the
    /// follow-up sticker entirely.
    pub alert_sticker: Option<String>,
}

/// Dispatch loop tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// Poll period for due reminders.
    #[serde(default = "default_dispatch_interval")]
    pub interval_secs: u64,
    /// Max reminders processed per cycle; the remainder is picked up on the
    /// next cycle. Bounds cycle latency for large due-sets.
    #[serde(default = "default_batch_cap")]
    pub batch_cap: u32,
    /// Pause between consecutive sends, to stay under channel rate limits.
    #[serde(default = "default_send_spacing")]
    pub send_spacing_ms: u64,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_dispatch_interval(),
            batch_cap: default_batch_cap(),
            send_spacing_ms: default_send_spacing(),
        }
    }
}

/// Maintenance job tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaintenanceConfig {
    /// UTC time-of-day for the daily cleanup run.
    #[serde(default)]
    pub cleanup_hour: u8,
    #[serde(default)]
    pub cleanup_minute: u8,
    /// Sent reminders older than this (measured from their due time) are
    /// hard-purged by the cleanup job.
    #[serde(default = "default_retention_days")]
    pub retention_days: u32,
    /// Statistics snapshot refresh period.
    #[serde(default = "default_stats_interval")]
    pub stats_interval_secs: u64,
}

impl Default for MaintenanceConfig {
    fn default() -> Self {
        Self {
            cleanup_hour: 0,
            cleanup_minute: 0,
            retention_days: default_retention_days(),
            stats_interval_secs: default_stats_interval(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// How long shutdown waits for in-flight job runs before abandoning them.
    #[serde(default = "default_shutdown_grace")]
    pub shutdown_grace_secs: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            shutdown_grace_secs: default_shutdown_grace(),
        }
    }
}

/// Creation quota limits for one tier.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PlanLimits {
    /// Cap on simultaneously active reminders.
    pub max_total: Bound,
    /// Cap on reminders created since UTC midnight.
    pub max_daily: Bound,
}

/// Per-tier quota table. Defaults match the shipped plans; override any
/// tier in remindd.toml.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlansConfig {
    #[serde(default = "default_free_limits")]
    pub free: PlanLimits,
    #[serde(default = "default_premium_limits")]
    pub premium: PlanLimits,
    #[serde(default = "default_unlimited_limits")]
    pub unlimited: PlanLimits,
}

impl PlansConfig {
    pub fn limits_for(&self, tier: Tier) -> PlanLimits {
        match tier {
            Tier::Free => self.free,
            Tier::Premium => self.premium,
            Tier::Unlimited => self.unlimited,
        }
    }
}

impl Default for PlansConfig {
    fn default() -> Self {
        Self {
            free: default_free_limits(),
            premium: default_premium_limits(),
            unlimited: default_unlimited_limits(),
        }
    }
}

fn default_free_limits() -> PlanLimits {
    PlanLimits {
        max_total: Bound::Finite(5),
        max_daily: Bound::Finite(3),
    }
}
fn default_premium_limits() -> PlanLimits {
    PlanLimits {
        max_total: Bound::Finite(100),
        max_daily: Bound::Finite(50),
    }
}
fn default_unlimited_limits() -> PlanLimits {
    PlanLimits {
        max_total: Bound::Unlimited,
        max_daily: Bound::Unlimited,
    }
}

fn default_dispatch_interval() -> u64 {
    60
}
fn default_batch_cap() -> u32 {
    500
}
fn default_send_spacing() -> u64 {
    100
}
fn default_retention_days() -> u32 {
    30
}
fn default_stats_interval() -> u64 {
    3600
}
fn default_shutdown_grace() -> u64 {
    30
}
fn default_db_path() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{}/.remindd/remindd.db", home)
}

impl RemindConfig {
    /// Load config from a TOML file with REMINDD_* env var overrides.
    ///
    /// Checks in order:
    ///   1. Explicit path argument
    ///   2. ~/.remindd/remindd.toml
    pub fn load(config_path: Option<&str>) -> crate::error::Result<Self> {
        let path = config_path
            .map(String::from)
            .unwrap_or_else(default_config_path);

        let config: RemindConfig = Figment::new()
            .merge(Toml::file(&path))
            .merge(Env::prefixed("REMINDD_").split("_"))
            .extract()
            .map_err(|e| crate::error::CoreError::Config(e.to_string()))?;

        Ok(config)
    }
}

fn default_config_path() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{}/.remindd/remindd.toml", home)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_plans_match_shipped_tiers() {
        let plans = PlansConfig::default();
        assert_eq!(plans.limits_for(Tier::Free).max_total, Bound::Finite(5));
        assert_eq!(plans.limits_for(Tier::Free).max_daily, Bound::Finite(3));
        assert_eq!(
            plans.limits_for(Tier::Premium).max_total,
            Bound::Finite(100)
        );
        assert_eq!(plans.limits_for(Tier::Premium).max_daily, Bound::Finite(50));
        assert_eq!(
            plans.limits_for(Tier::Unlimited).max_total,
            Bound::Unlimited
        );
        assert_eq!(
            plans.limits_for(Tier::Unlimited).max_daily,
            Bound::Unlimited
        );
    }

    #[test]
    fn default_dispatch_tuning() {
        let d = DispatchConfig::default();
        assert_eq!(d.interval_secs, 60);
        assert_eq!(d.batch_cap, 500);
        assert_eq!(d.send_spacing_ms, 100);
    }

    #[test]
    fn bound_parses_from_toml() {
        // Externally tagged: a bare string for Unlimited, a table for Finite.
        let config: RemindConfig = Figment::new()
            .merge(Toml::string(
                "[plans.free]\nmax_total = \"unlimited\"\nmax_daily = { finite = 7 }\n",
            ))
            .extract()
            .unwrap();
        assert_eq!(config.plans.free.max_total, Bound::Unlimited);
        assert_eq!(config.plans.free.max_daily, Bound::Finite(7));
        // Untouched tiers keep their defaults.
        assert_eq!(config.plans.premium.max_daily, Bound::Finite(50));
    }
}
