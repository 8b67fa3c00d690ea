use thiserror::Error;

use crate::reminder::{MAX_DESCRIPTION_LEN, MAX_TITLE_LEN};

/// Core-layer errors (currently only configuration loading).
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Rejections for a reminder creation payload. Checked before any row is
/// written, so an invalid reminder never enters the store.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("title must not be empty")]
    EmptyTitle,

    #[error("title too long: {len} chars (max {MAX_TITLE_LEN})")]
    TitleTooLong { len: usize },

    #[error("description too long: {len} chars (max {MAX_DESCRIPTION_LEN})")]
    DescriptionTooLong { len: usize },

    #[error("due time must be in the future")]
    DueInPast,
}

pub type Result<T> = std::result::Result<T, CoreError>;
