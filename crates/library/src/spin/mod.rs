//! The randomizer wheel.
//!
//! A spin picks one of `count` candidates uniformly at random and produces a
//! stopping angle for the wheel animation that lands on exactly that
//! candidate. The two directions ([`Wheel::angle_for_index`] and
//! [`Wheel::index_from_angle`]) are inverses, so whichever angle the
//! animation actually settles on can be mapped back to the same pick.

pub mod error;
mod selector;
mod wheel;

pub use self::selector::{RandomSelector, Spin};
pub use self::wheel::{JITTER, Wheel};
