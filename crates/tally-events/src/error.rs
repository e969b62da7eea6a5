//! Error types for the event store.

use tally_types::ParseTagError;

/// Errors that can occur while validating, saving or querying events.
#[derive(Debug, thiserror::Error)]
pub enum EventsError {
    /// A device type or event type label is outside its closed set.
    #[error(transparent)]
    InvalidEnum(#[from] ParseTagError),

    /// A date is not a `YYYY-MM-DD` calendar day.
    #[error("invalid {field}: {value:?} is not a YYYY-MM-DD date")]
    InvalidDate {
        /// Which input carried the date.
        field: &'static str,
        /// The rejected value.
        value: String,
    },

    /// An event count is negative.
    #[error("invalid count {0}: counts cannot be negative")]
    InvalidCount(i64),

    /// A required query parameter was empty.
    #[error("{0} is required")]
    MissingParameter(&'static str),

    /// A store operation (begin, upsert, commit, query, scan) failed.
    #[error("events database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// The upsert failed and rolling the transaction back failed too.
    ///
    /// The upsert failure is kept as the error source.
    #[error("events upsert failed ({source}) and rollback also failed: {rollback}")]
    RollbackFailed {
        /// The upsert failure.
        source: rusqlite::Error,
        /// The rollback failure.
        rollback: rusqlite::Error,
    },
}

impl EventsError {
    /// Returns `true` for errors caused by the caller's input rather than the
    /// store. Retrying such a request can never succeed.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::InvalidEnum(_)
                | Self::InvalidDate { .. }
                | Self::InvalidCount(_)
                | Self::MissingParameter(_)
        )
    }
}
