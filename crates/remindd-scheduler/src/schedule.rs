use chrono::{DateTime, Datelike, Duration, TimeZone, Utc};

use crate::error::{Result, SchedulerError};
use crate::types::Schedule;

/// Check a schedule definition once, at registration time.
pub fn validate(schedule: &Schedule) -> Result<()> {
    match schedule {
        Schedule::Interval { every_secs: 0 } => Err(SchedulerError::InvalidSchedule(
            "interval must be at least 1 second".to_string(),
        )),
        Schedule::Interval { .. } => Ok(()),
        Schedule::Daily { hour, minute } if *hour > 23 || *minute > 59 => Err(
            SchedulerError::InvalidSchedule(format!("bad time of day: {hour:02}:{minute:02}")),
        ),
        Schedule::Daily { .. } => Ok(()),
    }
}

/// Compute the next UTC execution time for `schedule` starting *after* `from`.
pub fn compute_next_run(schedule: &Schedule, from: DateTime<Utc>) -> Option<DateTime<Utc>> {
    match schedule {
        Schedule::Interval { every_secs } => Some(from + Duration::seconds(*every_secs as i64)),

        Schedule::Daily { hour, minute } => {
            // Build today's candidate at HH:MM:00 UTC.
            let candidate = Utc
                .with_ymd_and_hms(
                    from.year(),
                    from.month(),
                    from.day(),
                    *hour as u32,
                    *minute as u32,
                    0,
                )
                .single()?;
            if candidate > from {
                Some(candidate)
            } else {
                // Today's window has passed — advance to tomorrow.
                Some(candidate + Duration::days(1))
            }
        }
    }
}
