//! Library Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction. Each component module has its own
//! error kinds; the [`ReadingList`](crate::ReadingList) facade raises them
//! into this one.

use derive_more::{Display, Error};

/// A library error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for library operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Classifies the origin of a library failure.
///
/// None of these are fatal: each is scoped to the one record, move or query
/// that caused it, and storage stays authoritative.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The record store rejected a read or write. Views may disagree with
    /// storage until the next refresh re-derives them.
    #[display("record store error")]
    Store,
    /// A ranking operation was refused (unknown book, offsets out of range).
    #[display("ranking error")]
    Ranking,
    /// A catalog payload could not be decoded.
    #[display("could not decode import")]
    Import,
    /// The randomizer had nothing to pick from.
    #[display("nothing to spin")]
    Spin,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Store)
    }
}
