//! Time-window reservoir: keeps every sample younger than the window.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use super::{ReservoirCore, SampleSet};

// Hard ceiling so a hot instrument cannot grow the window without bound.
const MAX_SAMPLES: usize = 16_384;

/// Retains all samples observed within the trailing window. Expired samples
/// are dropped on the next update or snapshot that sees them out of range.
pub struct SlidingWindowReservoir {
    window: Duration,
    samples: VecDeque<(Instant, i64)>,
}

impl SlidingWindowReservoir {
    pub fn new(window_secs: u64) -> Self {
        Self {
            window: Duration::from_secs(window_secs.max(1)),
            samples: VecDeque::new(),
        }
    }

    fn trim(&mut self, now: Instant) {
        while let Some((at, _)) = self.samples.front() {
            if now.saturating_duration_since(*at) > self.window {
                self.samples.pop_front();
            } else {
                break;
            }
        }
    }
}

impl ReservoirCore for SlidingWindowReservoir {
    fn update(&mut self, value: i64, now: Instant) {
        self.trim(now);
        if self.samples.len() == MAX_SAMPLES {
            self.samples.pop_front();
        }
        self.samples.push_back((now, value));
    }

    fn snapshot(&mut self, now: Instant) -> SampleSet {
        self.trim(now);
        SampleSet::from_unsorted(self.samples.iter().map(|(_, v)| *v).collect())
    }
}
