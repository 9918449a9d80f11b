//! Seeded, forkable randomness.
//!
//! All randomness in the simulation flows from one root generator
//! seeded at world creation. Entities that need their own stream fork
//! it by drawing a child seed from the parent, so the stream tree is a
//! pure function of the root seed and the order of fork calls.

use crate::math::Fixed;
use rand::{Rng as _, SeedableRng as _};
use rand_chacha::ChaCha8Rng;

/// Deterministic random number generator.
///
/// Wraps a ChaCha stream cipher generator: portable output on every
/// platform, cheap to clone, and serializable state is never needed
/// because worlds are reconstructed from seed + inputs.
#[derive(Debug, Clone)]
pub struct GameRng {
    inner: ChaCha8Rng,
}

impl GameRng {
    /// Create a generator from an explicit seed.
    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self {
            inner: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Uniform value in the inclusive range `[low, high]`.
    ///
    /// Panics when `low > high`; callers always derive the bounds from
    /// board dimensions, so an inverted range is a programmer error.
    pub fn range(&mut self, low: Fixed, high: Fixed) -> Fixed {
        assert!(low <= high, "inverted range: [{low}, {high}]");
        Fixed::new(self.inner.gen_range(low.raw()..=high.raw()))
    }

    /// Fork a child generator by drawing its seed from this one.
    pub fn fork(&mut self) -> Self {
        Self::seeded(self.inner.gen())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_seed_same_stream() {
        let mut a = GameRng::seeded(1234);
        let mut b = GameRng::seeded(1234);
        for _ in 0..100 {
            assert_eq!(
                a.range(Fixed::ZERO, Fixed::new(1000)),
                b.range(Fixed::ZERO, Fixed::new(1000))
            );
        }
    }

    #[test]
    fn test_range_is_inclusive() {
        let mut rng = GameRng::seeded(5);
        let mut saw_low = false;
        let mut saw_high = false;
        for _ in 0..200 {
            let v = rng.range(Fixed::ZERO, Fixed::TWO);
            assert!(v >= Fixed::ZERO && v <= Fixed::TWO);
            saw_low |= v.is_zero();
            saw_high |= v == Fixed::TWO;
        }
        assert!(saw_low && saw_high);
    }

    #[test]
    fn test_degenerate_range() {
        let mut rng = GameRng::seeded(5);
        assert_eq!(rng.range(Fixed::ONE, Fixed::ONE), Fixed::ONE);
    }

    #[test]
    fn test_forks_are_reproducible() {
        let mut parent_a = GameRng::seeded(99);
        let mut parent_b = GameRng::seeded(99);
        let mut child_a = parent_a.fork();
        let mut child_b = parent_b.fork();
        for _ in 0..20 {
            assert_eq!(
                child_a.range(Fixed::ZERO, Fixed::MAX - Fixed::ONE),
                child_b.range(Fixed::ZERO, Fixed::MAX - Fixed::ONE)
            );
        }
        // Forking advances the parent identically.
        assert_eq!(
            parent_a.range(Fixed::ZERO, Fixed::new(10)),
            parent_b.range(Fixed::ZERO, Fixed::new(10))
        );
    }

    #[test]
    fn test_clone_diverges_from_original_identically() {
        let mut original = GameRng::seeded(7);
        let _ = original.range(Fixed::ZERO, Fixed::new(10));
        let mut cloned = original.clone();
        for _ in 0..10 {
            assert_eq!(
                original.range(Fixed::ZERO, Fixed::new(10)),
                cloned.range(Fixed::ZERO, Fixed::new(10))
            );
        }
    }
}
