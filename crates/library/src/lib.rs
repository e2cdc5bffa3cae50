//! The ranked reading-list engine.
//!
//! Four independent pieces, each usable on its own, and a facade tying them
//! to one record store and one catalog:
//!
//! - [`ranking`]: keeps the to-read list and the favorites numbered `0..n`
//!   across every insert, delete, reorder and status change.
//! - [`enrich`]: backfills missing book details from the catalog in the
//!   background, one fetch per book at a time, never writing to a book that
//!   has since been deleted.
//! - [`search`]: debounced, cancellable catalog search that only ever shows
//!   the answer to the latest query.
//! - [`spin`]: the randomizer wheel, mapping a random pick to a stopping
//!   angle and back.
//! - [`ReadingList`]: one method per user action.

pub mod enrich;
pub mod error;
pub mod ranking;
mod reading_list;
pub mod search;
pub mod spin;

pub use crate::reading_list::{Draw, ReadingList};
