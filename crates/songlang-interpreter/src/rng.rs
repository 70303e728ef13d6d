//! The PRNG behind `CHANCE` and `RANDOM` (spec §5, §9): abstracted so
//! tests can seed it for determinism while production runs draw from the
//! thread-local generator.

use rand::rngs::{StdRng, ThreadRng};
use rand::{Rng, SeedableRng};

pub enum SongRng {
    Seeded(StdRng),
    Thread(ThreadRng),
}

impl SongRng {
    pub fn from_entropy() -> Self {
        SongRng::Thread(rand::rng())
    }

    pub fn from_seed(seed: u64) -> Self {
        SongRng::Seeded(StdRng::seed_from_u64(seed))
    }

    /// A uniform integer in `[min, max]` inclusive, tolerant of a
    /// swapped range (spec §8 invariant 6: `a == b` always returns `a`).
    pub fn next_int_inclusive(&mut self, min: i64, max: i64) -> i64 {
        let (low, high) = if min <= max { (min, max) } else { (max, min) };
        if low == high {
            return low;
        }
        match self {
            SongRng::Seeded(rng) => rng.random_range(low..=high),
            SongRng::Thread(rng) => rng.random_range(low..=high),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_bounds_always_return_the_bound() {
        let mut rng = SongRng::from_seed(7);
        for _ in 0..10 {
            assert_eq!(rng.next_int_inclusive(5, 5), 5);
        }
    }

    #[test]
    fn draws_stay_within_bounds() {
        let mut rng = SongRng::from_seed(42);
        for _ in 0..200 {
            let draw = rng.next_int_inclusive(1, 6);
            assert!((1..=6).contains(&draw));
        }
    }

    #[test]
    fn same_seed_is_deterministic() {
        let mut a = SongRng::from_seed(99);
        let mut b = SongRng::from_seed(99);
        let seq_a: Vec<i64> = (0..20).map(|_| a.next_int_inclusive(0, 99)).collect();
        let seq_b: Vec<i64> = (0..20).map(|_| b.next_int_inclusive(0, 99)).collect();
        assert_eq!(seq_a, seq_b);
    }
}
