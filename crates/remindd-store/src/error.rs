use thiserror::Error;

/// Errors from the persistence layer.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Underlying SQLite / rusqlite error.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// The creation payload failed validation; nothing was written.
    #[error("Invalid reminder: {0}")]
    Validation(#[from] remindd_core::ValidationError),

    /// The referenced user has not been provisioned.
    #[error("User not found: {telegram_id}")]
    UserNotFound { telegram_id: i64 },
}

pub type Result<T> = std::result::Result<T, StoreError>;
