//! Distribution histogram backed by a sampling reservoir.

use std::time::Instant;

use parking_lot::Mutex;

use crate::sampling::{ReservoirCore, ReservoirSpec, SampleSet};
use crate::snapshot::HistogramValue;

struct HistogramState {
    count: u64,
    reservoir: Box<dyn ReservoirCore>,
}

/// Records `i64` observations into a reservoir.
///
/// The total count and the reservoir sit behind one short lock so a snapshot
/// never sees them out of step with each other.
pub struct Histogram {
    state: Mutex<HistogramState>,
}

impl Histogram {
    pub fn new(spec: &ReservoirSpec) -> Self {
        Self::with_seed(spec, None)
    }

    /// Seeded reservoir RNG, for reproducible sampling in tests.
    pub fn with_seed(spec: &ReservoirSpec, seed: Option<u64>) -> Self {
        Self {
            state: Mutex::new(HistogramState {
                count: 0,
                reservoir: spec.build(seed),
            }),
        }
    }

    pub fn update(&self, value: i64) {
        let mut s = self.state.lock();
        s.count += 1;
        s.reservoir.update(value, Instant::now());
    }

    /// Total observations, including those the reservoir sampled away.
    pub fn count(&self) -> u64 {
        self.state.lock().count
    }

    /// Current retained samples.
    pub fn samples(&self) -> SampleSet {
        self.state.lock().reservoir.snapshot(Instant::now())
    }

    /// Read for a snapshot: count and distribution from one consistent view.
    pub fn collect(&self) -> HistogramValue {
        let mut s = self.state.lock();
        let samples = s.reservoir.snapshot(Instant::now());
        HistogramValue::from_samples(s.count, &samples)
    }
}

impl std::fmt::Debug for Histogram {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Histogram")
            .field("count", &self.count())
            .finish()
    }
}
