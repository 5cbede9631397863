use thiserror::Error;

use almanac_recur::RecurError;

/// Service layer errors
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Invalid recurrence rule: {0}")]
    InvalidRecurrenceRule(String),

    #[error("Invalid time range: {0}")]
    InvalidTimeRange(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Transaction failed: {0}")]
    TransactionFailure(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Notification error: {0}")]
    NotificationError(String),

    #[error(transparent)]
    DatabaseError(#[from] almanac_db::error::DbError),

    #[error(transparent)]
    CoreError(#[from] almanac_core::error::CoreError),

    #[error("Diesel error: {0}")]
    DieselError(#[from] diesel::result::Error),
}

impl From<RecurError> for ServiceError {
    fn from(err: RecurError) -> Self {
        match err {
            RecurError::InvalidRecurrenceRule(msg) => Self::InvalidRecurrenceRule(msg),
            RecurError::InvalidHandle(handle) => {
                Self::ValidationError(format!("invalid event handle '{handle}'"))
            }
            RecurError::DateOutOfRange(date) => {
                Self::ValidationError(format!("date out of range after {date}"))
            }
        }
    }
}

pub type ServiceResult<T> = std::result::Result<T, ServiceError>;
