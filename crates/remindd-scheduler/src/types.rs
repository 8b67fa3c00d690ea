use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Defines when and how often a job should run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Schedule {
    /// Run repeatedly with a fixed interval in seconds.
    Interval { every_secs: u64 },

    /// Run every day at the given hour and minute (UTC).
    Daily { hour: u8, minute: u8 },
}

/// One row of the liveness report.
#[derive(Debug, Clone, Serialize)]
pub struct JobInfo {
    pub id: String,
    pub name: String,
    pub schedule: Schedule,
    pub next_run: Option<DateTime<Utc>>,
    pub last_run: Option<DateTime<Utc>>,
    pub run_count: u32,
    /// True while a spawned run of this job has not finished yet.
    pub in_flight: bool,
}

/// Scheduler liveness snapshot for the admin/reporting surface.
#[derive(Debug, Clone, Serialize)]
pub struct SchedulerStatus {
    pub running: bool,
    pub jobs: Vec<JobInfo>,
}
