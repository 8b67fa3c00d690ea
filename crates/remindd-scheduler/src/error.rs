use thiserror::Error;

/// Errors from the recurring-task facility.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// A job with this id is already registered.
    #[error("Duplicate job id: {id}")]
    DuplicateJob { id: String },

    /// No job with the given id exists in the table.
    #[error("Job not found: {id}")]
    JobNotFound { id: String },

    /// The provided schedule definition is invalid (e.g. hour out of range).
    #[error("Invalid schedule: {0}")]
    InvalidSchedule(String),
}

pub type Result<T> = std::result::Result<T, SchedulerError>;
