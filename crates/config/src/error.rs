//! Config Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};

/// A configuration error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for configuration operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// A configuration source could not be read or parsed. Fix the file or
    /// environment variable named in the error tree.
    #[display("could not load configuration")]
    Load,
    /// Every source parsed, but the combined values make no sense.
    #[display("invalid configuration value for {field}: {reason}")]
    Invalid { field: &'static str, reason: &'static str },
}
