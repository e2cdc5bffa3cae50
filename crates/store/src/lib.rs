//! SQLite record store for the reading list.
//!
//! This crate is the durable side of the reading list: one `books` table,
//! queried per ranking [`Namespace`](shelf_catalog::Namespace) with that
//! namespace's filter and sort key. It does not decide what the rankings
//! *should* be (that is the ranking engine's job); it only guarantees that
//! each batch of ranking writes lands atomically, so a concurrent reader never
//! observes a half-reindexed namespace.
//!
//! # Change notifications
//! Every successful write is announced as a [`Change`] on a broadcast
//! channel shared by all repositories created from the same [`Database`], so
//! views can re-materialize when something elsewhere touched the store.

mod change;
mod db;
pub mod error;
mod models;
mod repo;

pub use crate::change::Change;
pub use crate::db::Database;
pub use crate::repo::Repository;
