//! Error types for lifegrid.

use thiserror::Error;

use crate::event::EventId;
use crate::month_key::MonthKey;

/// Errors that can occur in lifegrid operations.
#[derive(Error, Debug)]
pub enum LifeGridError {
    /// Missing or unparseable input (e.g. no birth date yet).
    /// Callers treat this as "nothing to show", not as a failure.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Month {0} is not part of the grid")]
    MonthNotFound(MonthKey),

    #[error("Event {event} not found in month {month}")]
    EventNotFound { event: EventId, month: MonthKey },

    #[error("Event {0} not found")]
    UnknownEvent(EventId),

    /// The month range for a year came out inverted. This is a bug in
    /// the partitioning, never a user error.
    #[error("Invalid month range {start}..={end} for year {year}")]
    InvalidRange { year: i32, start: u32, end: u32 },

    #[error("Event must have text or at least one image")]
    InvalidContent,

    #[error("Not signed in")]
    NotAuthenticated,

    #[error("User {0} not found")]
    UserNotFound(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl LifeGridError {
    /// True for the recoverable "references something not in the grid" family.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            LifeGridError::MonthNotFound(_)
                | LifeGridError::EventNotFound { .. }
                | LifeGridError::UnknownEvent(_)
        )
    }
}

/// Result type alias for lifegrid operations.
pub type LifeGridResult<T> = Result<T, LifeGridError>;
