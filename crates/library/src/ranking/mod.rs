//! Contiguous ordinal rankings per namespace.
//!
//! The to-read list and the favorites each number their members `0..n`
//! with no gaps and no repeats. [`RankingEngine`] keeps them that way across
//! inserts, deletes, reorders and status changes; the free functions are the
//! storage-free arithmetic it is built on.

mod engine;
pub mod error;
mod plan;

pub use self::engine::{RankedView, RankingEngine};
pub use self::plan::{align, is_contiguous, move_offsets, plan};
