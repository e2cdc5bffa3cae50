//! Error types for the [`ranking`](super) module.

use derive_more::{Display, Error};
use shelf_catalog::BookId;

/// A ranking error with automatic location tracking via [`exn::Exn`].
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for ranking operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// Reading a namespace or writing a batch of rankings failed. Nothing
    /// partial was stored; the next refresh re-derives correct rankings.
    #[display("record store error")]
    Store,
    /// An offset in a move is outside the namespace as it was read.
    #[display("offset {offset} out of range for {len} items")]
    InvalidOffset { offset: usize, len: usize },
    #[display("no book with id {_0}")]
    NotFound(#[error(not(source))] BookId),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Store)
    }
}
