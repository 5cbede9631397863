use chrono::NaiveDate;
use thiserror::Error;

/// Recurrence engine errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecurError {
    #[error("Invalid recurrence rule: {0}")]
    InvalidRecurrenceRule(String),

    #[error("Date out of supported range after {0}")]
    DateOutOfRange(NaiveDate),

    #[error("Invalid event handle: {0}")]
    InvalidHandle(String),
}

pub type RecurResult<T> = std::result::Result<T, RecurError>;
