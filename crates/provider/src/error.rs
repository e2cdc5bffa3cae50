//! Provider Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};

/// A provider error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for provider operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The catalog has no entry for this ISBN. Asking again won't help until
    /// the user does something different.
    #[display("no catalog entry for ISBN {_0}")]
    NotFound(#[error(not(source))] String),
    /// Network failure or timeout talking to the catalog.
    #[display("network error: {_0}")]
    Network(#[error(not(source))] String),
    /// The catalog could not be reached for a reason other than the network
    /// (local cache directory missing, permissions, etc.).
    #[display("catalog unavailable: {_0}")]
    Unavailable(#[error(not(source))] String),
    /// The catalog answered, but not with anything decodable.
    #[display("undecodable catalog response")]
    Decode,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    ///
    /// Even retryable errors are only retried on the next reconciliation pass
    /// or keystroke, never in a loop.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Unavailable(_))
    }
}
