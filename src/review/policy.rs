//! Random reviewer selection.
//!
//! The policy is a pure function of its candidate pool and a random source.
//! Each call builds its own generator, so concurrent operations never share
//! generator state and repeated calls do not replay the same sequence.

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::{IndexedRandom, SliceRandom};

use super::model::MAX_REVIEWERS;

/// Chooses reviewers from a pool of eligible user identifiers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReviewerSelectionPolicy {
    /// Seed a fresh generator from the operating system on every call.
    #[default]
    Random,
    /// Seed every call from a fixed value. Used for reproducible runs.
    Seeded(u64),
}

impl ReviewerSelectionPolicy {
    /// Shuffles `pool` and keeps at most [`MAX_REVIEWERS`] entries.
    ///
    /// An empty pool yields an empty selection.
    #[must_use]
    pub fn select_reviewers(self, mut pool: Vec<String>) -> Vec<String> {
        pool.shuffle(&mut self.generator());
        pool.truncate(MAX_REVIEWERS);
        pool
    }

    /// Picks one candidate uniformly at random, or `None` for an empty pool.
    #[must_use]
    pub fn pick_replacement(self, pool: &[String]) -> Option<String> {
        pool.choose(&mut self.generator()).cloned()
    }

    fn generator(self) -> StdRng {
        match self {
            Self::Random => StdRng::from_os_rng(),
            Self::Seeded(seed) => StdRng::seed_from_u64(seed),
        }
    }
}
