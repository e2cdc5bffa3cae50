use crate::spin::error::Result;
use crate::spin::wheel::{JITTER, Wheel};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::ops::RangeInclusive;

const FULL_TURN: f64 = 360.0;
const DEFAULT_ROTATIONS: RangeInclusive<u32> = 2..=20;

/// One spin of the wheel: the pick, and how to animate towards it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spin {
    pub wheel: Wheel,
    /// The candidate the wheel will stop on.
    pub target: usize,
    /// Whole turns made before settling.
    pub rotations: u32,
    /// Where in the target's slice the pointer stops.
    pub jitter: f64,
    /// Total clockwise turn, in degrees, starting from a wheel at rest at 0.
    pub stop_angle: f64,
}

impl Spin {
    /// The stop angle for a wheel that has already been turned to
    /// `current` degrees by earlier spins.
    ///
    /// Earlier whole turns are kept so the wheel only ever moves forward;
    /// the candidate under the pointer is still [`target`](Self::target).
    pub fn stop_angle_from(&self, current: f64) -> f64 {
        (current / FULL_TURN).floor() * FULL_TURN + self.stop_angle
    }

    /// The candidate under the pointer at `angle`.
    ///
    /// Use this when the animation reports where it actually stopped.
    pub fn index_at(&self, angle: f64) -> usize {
        self.wheel.index_from_angle(angle)
    }
}

/// Source of spins.
///
/// Seeded selectors are fully deterministic, which is what tests (and
/// anyone wanting a reproducible pick) use.
#[derive(Debug, Clone)]
pub struct RandomSelector {
    rng: StdRng,
    rotations: RangeInclusive<u32>,
}

impl RandomSelector {
    pub fn from_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    pub fn from_entropy() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    fn with_rng(rng: StdRng) -> Self {
        Self {
            rng,
            rotations: DEFAULT_ROTATIONS,
        }
    }

    /// Limit how many whole turns a spin makes. An empty range falls back
    /// to its start.
    pub fn with_rotations(mut self, rotations: RangeInclusive<u32>) -> Self {
        self.rotations = if rotations.is_empty() {
            *rotations.start()..=*rotations.start()
        } else {
            rotations
        };
        self
    }

    /// Pick one of `count` candidates, uniformly.
    pub fn select(&mut self, count: usize) -> Result<Spin> {
        let wheel = Wheel::new(count)?;
        let target = self.rng.gen_range(0..wheel.count());
        let rotations = self.rng.gen_range(self.rotations.clone());
        let jitter = self.rng.gen_range(JITTER);
        let stop_angle = f64::from(rotations) * FULL_TURN + wheel.angle_for_index(target, jitter);
        tracing::debug!(count, target, rotations, stop_angle, "Spun");
        Ok(Spin {
            wheel,
            target,
            rotations,
            jitter,
            stop_angle,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spin::error::ErrorKind;

    #[test]
    fn test_select_nothing() {
        let err = RandomSelector::from_seed(1).select(0).unwrap_err();
        assert_eq!(&*err, &ErrorKind::NoCandidates);
    }

    #[test]
    fn test_select_lands_on_target() {
        let mut selector = RandomSelector::from_seed(7);
        for count in 1..50 {
            for _ in 0..20 {
                let spin = selector.select(count).unwrap();
                assert!(spin.target < count);
                assert!(DEFAULT_ROTATIONS.contains(&spin.rotations));
                assert!(JITTER.contains(&spin.jitter));
                assert!(spin.stop_angle >= f64::from(spin.rotations) * FULL_TURN);
                assert_eq!(spin.index_at(spin.stop_angle), spin.target);
            }
        }
    }

    #[test]
    fn test_same_seed_same_spins() {
        let mut a = RandomSelector::from_seed(42);
        let mut b = RandomSelector::from_seed(42);
        for count in [1, 3, 10, 250] {
            assert_eq!(a.select(count).unwrap(), b.select(count).unwrap());
        }
    }

    #[test]
    fn test_every_candidate_gets_picked() {
        let mut selector = RandomSelector::from_seed(3);
        let mut seen = [0usize; 5];
        for _ in 0..1000 {
            seen[selector.select(5).unwrap().target] += 1;
        }
        // Uniform would be 200 each.
        assert!(seen.iter().all(|&n| n > 120), "{seen:?}");
    }

    #[test]
    fn test_rotations_are_configurable() {
        let mut selector = RandomSelector::from_seed(9).with_rotations(3..=3);
        assert_eq!(selector.select(4).unwrap().rotations, 3);
        let mut selector = RandomSelector::from_seed(9).with_rotations(5..=1);
        assert_eq!(selector.select(4).unwrap().rotations, 5);
    }

    #[test]
    fn test_stop_angle_from_keeps_turning_forward() {
        let spin = RandomSelector::from_seed(11).select(6).unwrap();
        for current in [0.0, 10.0, 359.0, 4000.5] {
            let stop = spin.stop_angle_from(current);
            assert!(stop > current);
            assert_eq!(spin.index_at(stop), spin.target);
        }
    }
}
