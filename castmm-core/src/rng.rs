//! Seeded random generation of test data.

use rand::rngs::SmallRng;
use rand::{Rng as _, SeedableRng};
use rand_distr::StandardNormal;

/// Random number generator
pub struct Rng {
    rng: SmallRng,
}

impl Rng {
    /// Create generator, same seed gives the same sequence
    pub fn seed_from_u64(seed: u64) -> Self {
        Self { rng: SmallRng::seed_from_u64(seed) }
    }

    /// Sample from the standard normal distribution
    pub fn randn(&mut self) -> f64 {
        self.rng.sample::<f64, _>(StandardNormal)
    }
}
