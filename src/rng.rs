//! Random number sources for `#RANDOM` branch selection.
//!
//! The decoder never touches a global generator. Every sampled branch value is drawn from an
//! [`Rng`] passed in by the caller, so a decode can be reproduced exactly:
//!
//! - [`RngMock`] returns predefined values in rotation, for tests and fixed variants.
//! - [`RandRng`] wraps a [`rand`] generator (feature `rand`).
//!
//! [`rand`]: https://crates.io/crates/rand

use core::ops::RangeInclusive;

/// A random number generator used to choose `#RANDOM` branches.
///
/// # Contract
///
/// - The generated number must be within `range` (inclusive).
/// - The decoder clamps out-of-range values into `range`, so a faulty implementation cannot
///   select a branch that was never declared.
pub trait Rng {
    /// Generates a random integer within the specified `range`.
    ///
    /// ```rust
    /// use bms_chart::rng::{Rng, RngMock};
    ///
    /// let mut rng = RngMock([5u64]);
    /// assert_eq!(rng.generate(1..=10), 5);
    /// ```
    fn generate(&mut self, range: RangeInclusive<u64>) -> u64;
}

impl<T: Rng + ?Sized> Rng for Box<T> {
    fn generate(&mut self, range: RangeInclusive<u64>) -> u64 {
        T::generate(self, range)
    }
}

impl<T: Rng + ?Sized> Rng for &mut T {
    fn generate(&mut self, range: RangeInclusive<u64>) -> u64 {
        T::generate(self, range)
    }
}

/// A deterministic mock generator returning values from an array in rotation.
///
/// ```rust
/// use bms_chart::rng::{Rng, RngMock};
///
/// let mut rng = RngMock([1u64, 2u64]);
/// assert_eq!(rng.generate(1..=10), 1);
/// assert_eq!(rng.generate(1..=10), 2);
/// assert_eq!(rng.generate(1..=10), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RngMock<const N: usize>(pub [u64; N]);

impl<const N: usize> Rng for RngMock<N> {
    fn generate(&mut self, _range: RangeInclusive<u64>) -> u64 {
        let Some(first) = self.0.first().copied() else {
            return 0;
        };
        self.0.rotate_left(1);
        first
    }
}

/// A generator backed by the [`rand`] crate.
///
/// [`rand`]: https://crates.io/crates/rand
#[cfg(feature = "rand")]
#[derive(Debug, Clone)]
pub struct RandRng<R>(pub R);

#[cfg(feature = "rand")]
impl<R: rand::Rng> Rng for RandRng<R> {
    fn generate(&mut self, range: RangeInclusive<u64>) -> u64 {
        let start = *range.start();
        let end = *range.end();
        if end < start {
            return start;
        }
        match (end - start).checked_add(1) {
            Some(width) => (self.0.next_u64() % width) + start,
            None => self.0.next_u64(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_rotates_and_handles_empty() {
        let mut rng = RngMock([3, 1]);
        assert_eq!(rng.generate(1..=4), 3);
        assert_eq!(rng.generate(1..=4), 1);
        assert_eq!(rng.generate(1..=4), 3);

        let mut empty = RngMock([]);
        assert_eq!(empty.generate(1..=4), 0);
    }

    #[test]
    fn boxed_and_borrowed_forward() {
        let mut boxed: Box<dyn Rng> = Box::new(RngMock([7]));
        assert_eq!(boxed.generate(1..=9), 7);

        let mut mock = RngMock([2]);
        let borrowed = &mut mock;
        assert_eq!(borrowed.generate(1..=9), 2);
    }

    #[cfg(feature = "rand")]
    #[test]
    fn rand_generator_stays_in_range() {
        use rand::SeedableRng;

        let mut rng = RandRng(rand::rngs::StdRng::seed_from_u64(42));
        for _ in 0..64 {
            assert!((2..=5).contains(&rng.generate(2..=5)));
        }
        assert_eq!(rng.generate(3..=3), 3);
    }
}
