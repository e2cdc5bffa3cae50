//! Error types for the [`spin`](super) module.

use derive_more::{Display, Error};

/// A randomizer error with automatic location tracking via [`exn::Exn`].
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for randomizer operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A wheel needs at least one slice.
    #[display("no candidates to choose from")]
    NoCandidates,
}
