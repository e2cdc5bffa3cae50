use crate::spin::error::{ErrorKind, Result};
use std::num::NonZeroUsize;
use std::ops::Range;

/// Where inside its slice the pointer may come to rest, as a fraction of the
/// slice width measured from the slice's leading edge.
///
/// Kept clear of both edges so floating-point error in the animation can
/// never tip the pointer into a neighbouring slice.
pub const JITTER: Range<f64> = 0.1..0.9;

const FULL_TURN: f64 = 360.0;

/// A wheel of `count` equal slices, slice 0 starting at the top and the rest
/// following clockwise.
///
/// The pointer is fixed at the top and the wheel turns clockwise, so
/// turning it by `angle` degrees brings the slice that started at
/// `360 - angle` under the pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Wheel {
    count: NonZeroUsize,
}

impl Wheel {
    pub fn new(count: usize) -> Result<Self> {
        let count = NonZeroUsize::new(count).ok_or(ErrorKind::NoCandidates)?;
        Ok(Self { count })
    }

    pub fn count(&self) -> usize {
        self.count.get()
    }

    /// Width of one slice in degrees.
    pub fn slice(&self) -> f64 {
        FULL_TURN / self.count.get() as f64
    }

    /// The turn (within one revolution) that stops the pointer `jitter` of
    /// the way into slice `index`.
    ///
    /// `index` is clamped to the last slice and `jitter` into [`JITTER`].
    pub fn angle_for_index(&self, index: usize, jitter: f64) -> f64 {
        let index = index.min(self.count.get() - 1);
        let jitter = jitter.clamp(JITTER.start, JITTER.end);
        (self.count.get() as f64 - index as f64 - jitter) * self.slice()
    }

    /// The slice under the pointer after turning the wheel by `angle`
    /// degrees, any number of whole turns included.
    pub fn index_from_angle(&self, angle: f64) -> usize {
        let under_pointer = (FULL_TURN - angle.rem_euclid(FULL_TURN)).rem_euclid(FULL_TURN);
        let index = (under_pointer / self.slice()).floor() as usize;
        index.min(self.count.get() - 1)
    }
}
