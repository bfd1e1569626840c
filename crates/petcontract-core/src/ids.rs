//! Client-supplied pet ids
//!
//! `Random` draws from a bounded range and may collide. `Sequential` hands out
//! strictly increasing ids from a random base, so ids never repeat within a run.

use std::sync::atomic::{AtomicU64, Ordering};

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

/// Upper bound of the random draw.
pub const RANDOM_ID_MAX: u64 = 10_000_000_000;

/// Room left above a sequential base before it would leave the draw range.
const SEQUENTIAL_HEADROOM: u64 = 1_000_000;

#[derive(Debug)]
pub enum IdSource {
    /// Independent draws from `1..=RANDOM_ID_MAX`
    Random,
    /// Monotonically increasing counter, scoped to one run
    Sequential(AtomicU64),
}

impl IdSource {
    /// Sequential source starting at a random base.
    pub fn sequential() -> Self {
        let base = SmallRng::from_entropy().gen_range(1..=RANDOM_ID_MAX - SEQUENTIAL_HEADROOM);
        Self::starting_at(base)
    }

    /// Sequential source whose first id is `first`.
    pub fn starting_at(first: u64) -> Self {
        Self::Sequential(AtomicU64::new(first.max(1)))
    }

    pub fn next_id(&self) -> u64 {
        match self {
            Self::Random => rand::thread_rng().gen_range(1..=RANDOM_ID_MAX),
            Self::Sequential(counter) => counter.fetch_add(1, Ordering::Relaxed),
        }
    }
}

impl Default for IdSource {
    fn default() -> Self {
        Self::sequential()
    }
}
