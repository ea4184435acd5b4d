//! Deterministic simulation RNG.
//!
//! One `SimRng` lives in the [`FlowContext`][crate::FlowContext] and is shared
//! by every consumer of randomness in the network: offer policies (shuffle,
//! one-random, random-distribution), Source success/amount draws and Delay
//! draws.  Because the kernel is single-threaded and every call happens in
//! host step order, a single seeded stream makes whole runs reproducible.
//!
//! A host running several networks side by side can split independent
//! streams off one root with [`SimRng::child`].

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::Sampler;

/// 64-bit fractional golden-ratio constant for seed mixing.
const MIXING_CONSTANT: u64 = 0x9e37_79b9_7f4a_7c15;

/// Seeded random source for a single flow network.
pub struct SimRng(SmallRng);

impl SimRng {
    pub fn new(seed: u64) -> Self {
        SimRng(SmallRng::seed_from_u64(seed))
    }

    /// Split off an independent stream; `offset` distinguishes siblings.
    pub fn child(&mut self, offset: u64) -> SimRng {
        let seed = self.0.r#gen::<u64>() ^ offset.wrapping_mul(MIXING_CONSTANT);
        SimRng(SmallRng::seed_from_u64(seed))
    }

    /// Uniform draw from `range` (used for swap-to-front shuffling).
    #[inline]
    pub fn gen_range<T, R>(&mut self, range: R) -> T
    where
        T: rand::distributions::uniform::SampleUniform,
        R: rand::distributions::uniform::SampleRange<T>,
    {
        self.0.gen_range(range)
    }

    /// Uniform index in `0..n`.  `n` must be non-zero.
    #[inline]
    pub fn index(&mut self, n: usize) -> usize {
        self.0.gen_range(0..n)
    }

    /// Draw one value from a boxed distribution.
    #[inline]
    pub fn draw(&mut self, sampler: &dyn Sampler) -> f64 {
        sampler.draw(&mut self.0)
    }
}
