//! Exponentially-decaying reservoir (forward decay).
//!
//! Each incoming value gets the priority `exp(alpha * age) / u` where `age`
//! is seconds since the decay landmark and `u` is uniform in `(0, 1]`. Once
//! the reservoir is full, a new value evicts the lowest-priority sample only
//! if it outranks it, which biases retention toward recent samples while
//! still admitting the occasional old one.
//!
//! Priorities grow without bound as `age` grows, so the landmark is moved
//! forward on a fixed period and every retained priority is scaled down by
//! the same factor. Scaling by one shared positive factor preserves the
//! relative order of all samples.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use std::time::{Duration, Instant};

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use super::{ReservoirCore, SampleSet};

#[derive(Debug, Clone, Copy)]
struct Weighted {
    priority: f64,
    value: i64,
}

impl PartialEq for Weighted {
    fn eq(&self, other: &Self) -> bool {
        self.priority.total_cmp(&other.priority) == Ordering::Equal
    }
}

impl Eq for Weighted {}

impl PartialOrd for Weighted {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Weighted {
    fn cmp(&self, other: &Self) -> Ordering {
        self.priority.total_cmp(&other.priority)
    }
}

/// Exponentially-decaying reservoir. See the module docs for the scheme.
pub struct ExpDecayReservoir {
    // min-heap on priority, so the eviction candidate is always at the top
    heap: BinaryHeap<Reverse<Weighted>>,
    capacity: usize,
    alpha: f64,
    rescale_period: Duration,
    landmark: Instant,
    next_rescale: Instant,
    rng: SmallRng,
}

impl ExpDecayReservoir {
    pub fn new(capacity: usize, alpha: f64, rescale_secs: u64) -> Self {
        Self::seeded(capacity, alpha, rescale_secs, rand::random())
    }

    /// Seeded variant for reproducible sampling in tests.
    pub fn seeded(capacity: usize, alpha: f64, rescale_secs: u64, seed: u64) -> Self {
        let capacity = capacity.max(1);
        let rescale_period = Duration::from_secs(rescale_secs.max(1));
        let now = Instant::now();
        Self {
            heap: BinaryHeap::with_capacity(capacity),
            capacity,
            alpha,
            rescale_period,
            landmark: now,
            next_rescale: now + rescale_period,
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    fn rescale_if_due(&mut self, now: Instant) {
        if now < self.next_rescale {
            return;
        }
        let elapsed = now.saturating_duration_since(self.landmark).as_secs_f64();
        let factor = (-self.alpha * elapsed).exp();
        if !factor.is_finite() || factor <= 0.0 {
            // The retained samples stay untouched; try again next period.
            tracing::warn!(
                factor,
                elapsed_secs = elapsed,
                "reservoir rescale factor unusable, keeping prior weights"
            );
            self.next_rescale = now + self.rescale_period;
            return;
        }
        let mut items = std::mem::take(&mut self.heap).into_vec();
        for item in &mut items {
            item.0.priority *= factor;
        }
        self.heap = BinaryHeap::from(items);
        self.landmark = now;
        self.next_rescale = now + self.rescale_period;
    }
}

impl ReservoirCore for ExpDecayReservoir {
    fn update(&mut self, value: i64, now: Instant) {
        self.rescale_if_due(now);
        let age = now.saturating_duration_since(self.landmark).as_secs_f64();
        let u = 1.0 - self.rng.gen::<f64>(); // (0, 1], keeps the division finite
        let priority = (self.alpha * age).exp() / u;
        if !priority.is_finite() {
            // Weight overflowed between rescales. Drop this one sample rather
            // than poison the heap ordering; retained samples are untouched.
            tracing::warn!(age_secs = age, "sample weight overflowed, skipping sample");
            return;
        }
        let entry = Reverse(Weighted { priority, value });
        if self.heap.len() < self.capacity {
            self.heap.push(entry);
        } else if let Some(lowest) = self.heap.peek() {
            if lowest.0.priority < priority {
                self.heap.pop();
                self.heap.push(entry);
            }
        }
    }

    fn snapshot(&mut self, now: Instant) -> SampleSet {
        self.rescale_if_due(now);
        SampleSet::from_unsorted(self.heap.iter().map(|e| e.0.value).collect())
    }
}
