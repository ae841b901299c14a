//! Random source policy for units of work.
//!
//! Every unit owns its generator. Nothing random is shared between threads.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SeedStrategy {
    /// Seed each generator from the calling thread's own entropy-backed generator.
    #[default]
    Entropy,
    /// Deterministic: stream `i` of a ChaCha8 generator seeded with this value.
    Fixed(u64),
}

impl SeedStrategy {
    /// Build the generator for unit `stream`.
    ///
    /// With a fixed seed every stream is a disjoint part of the same
    /// sequence, so chunk results are independent yet reproducible.
    pub fn rng_for(&self, stream: u64) -> Result<ChaCha8Rng> {
        match self {
            SeedStrategy::Entropy => ChaCha8Rng::from_rng(rand::thread_rng())
                .map_err(|e| Error::execution("failed to seed random source", e)),
            SeedStrategy::Fixed(seed) => {
                let mut rng = ChaCha8Rng::seed_from_u64(*seed);
                rng.set_stream(stream);
                Ok(rng)
            }
        }
    }
}
