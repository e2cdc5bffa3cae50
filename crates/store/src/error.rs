//! Store Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};

/// A store error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for store operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// The database rejected a read or write. In-memory views may now
    /// disagree with storage until they are re-read.
    #[display("database error")]
    Database,
    #[display("database migration error")]
    Migration,
    /// A stored value could not be converted to or from its model.
    #[display("invalid store data: {_0}")]
    InvalidData(#[error(not(source))] &'static str),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        // SQLITE_BUSY and friends surface as `Database`; a later attempt can
        // succeed once the other writer is done.
        matches!(self, Self::Database)
    }
}
