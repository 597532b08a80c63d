//! Fixed-size uniform reservoir (Vitter's algorithm R).

use std::time::Instant;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use super::{ReservoirCore, SampleSet};

/// Keeps up to `capacity` samples. Once full, the n-th incoming value claims
/// a random slot with probability `capacity / n`, which leaves every value
/// seen so far with an equal chance of being retained.
pub struct UniformReservoir {
    samples: Vec<i64>,
    capacity: usize,
    seen: u64,
    rng: SmallRng,
}

impl UniformReservoir {
    pub fn new(capacity: usize) -> Self {
        Self::seeded(capacity, rand::random())
    }

    /// Seeded variant for reproducible sampling in tests.
    pub fn seeded(capacity: usize, seed: u64) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: Vec::with_capacity(capacity),
            capacity,
            seen: 0,
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    /// Total values offered, retained or not.
    pub fn seen(&self) -> u64 {
        self.seen
    }
}

impl ReservoirCore for UniformReservoir {
    fn update(&mut self, value: i64, _now: Instant) {
        self.seen += 1;
        if self.samples.len() < self.capacity {
            self.samples.push(value);
            return;
        }
        let slot = self.rng.gen_range(0..self.seen);
        if slot < self.capacity as u64 {
            if let Some(kept) = self.samples.get_mut(slot as usize) {
                *kept = value;
            }
        }
    }

    fn snapshot(&mut self, _now: Instant) -> SampleSet {
        SampleSet::from_unsorted(self.samples.clone())
    }
}
