//! Random seed sources for check commands.

use rand::Rng;

use crate::rpc::serialization::MAX_RANDOM_SEED;

/// Supplies `smt.randomSeed` values, one per check.
pub trait SeedSource: Send + Sync {
    /// Next seed, in `0..=MAX_RANDOM_SEED`.
    fn next_seed(&mut self) -> u32;
}

/// Uniform seeds from the thread-local RNG.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadRngSeeds;

impl SeedSource for ThreadRngSeeds {
    fn next_seed(&mut self) -> u32 {
        rand::thread_rng().gen_range(0..=MAX_RANDOM_SEED)
    }
}

/// Always returns the same seed.
#[derive(Debug, Clone, Copy)]
pub struct FixedSeed(pub u32);

impl SeedSource for FixedSeed {
    fn next_seed(&mut self) -> u32 {
        self.0.min(MAX_RANDOM_SEED)
    }
}
