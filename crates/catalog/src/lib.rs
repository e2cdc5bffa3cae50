//! Book models and catalog payload decoding.
//!
//! This crate owns the vocabulary shared by the rest of the workspace: the
//! persistent [`Book`](models::Book) record, the immutable
//! [`BookDetails`](models::BookDetails) enrichment payload, reading
//! [`Status`](models::Status) and the two ranking
//! [`Namespace`](models::Namespace)s.
//!
//! It also decodes the two external payload formats a reading list is fed
//! from, without performing any I/O itself:
//! - [`google`]: Google Books `volumes` responses (ISBN lookups and free-text
//!   search results).
//! - [`libby`]: Libby timeline exports, used to bulk-seed a reading list.

pub mod error;
pub mod google;
pub mod libby;
pub mod models;

pub use crate::models::{Book, BookDetails, BookId, CoverImage, Covers, Namespace, NewBook, Status, UNRANKED};
