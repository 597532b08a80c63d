//! Duration timer: an elapsed-time histogram plus a call-rate meter.

use std::time::{Duration, Instant};

use crate::sampling::ReservoirSpec;
use crate::snapshot::TimerValue;

use super::{Histogram, Meter};

/// Times operations. Durations land in a histogram as nanoseconds; every
/// recording also marks a meter, so a timer reports throughput alongside
/// latency.
pub struct Timer {
    durations: Histogram,
    rate: Meter,
}

impl Timer {
    pub fn new(spec: &ReservoirSpec) -> Self {
        Self::with_seed(spec, None)
    }

    /// Seeded reservoir RNG, for reproducible sampling in tests.
    pub fn with_seed(spec: &ReservoirSpec, seed: Option<u64>) -> Self {
        Self {
            durations: Histogram::with_seed(spec, seed),
            rate: Meter::new(),
        }
    }

    /// Record one elapsed duration.
    pub fn record(&self, elapsed: Duration) {
        let nanos = elapsed.as_nanos().min(i64::MAX as u128) as i64;
        self.durations.update(nanos);
        self.rate.mark();
    }

    /// Time a closure and record its duration.
    pub fn time_fn<T>(&self, f: impl FnOnce() -> T) -> T {
        let start = Instant::now();
        let out = f();
        self.record(start.elapsed());
        out
    }

    /// Start a guard that records its elapsed time when dropped, covering
    /// early returns and `?` exits without explicit bookkeeping.
    pub fn time(&self) -> TimerGuard<'_> {
        TimerGuard {
            timer: self,
            start: Instant::now(),
        }
    }

    /// Recorded operations.
    pub fn count(&self) -> u64 {
        self.durations.count()
    }

    /// Read for a snapshot. `reset_rate` restarts the call-rate meter, the
    /// duration reservoir always carries across reads.
    pub fn collect(&self, reset_rate: bool) -> TimerValue {
        TimerValue {
            duration: self.durations.collect(),
            rate: self.rate.collect(reset_rate),
        }
    }
}

impl std::fmt::Debug for Timer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Timer")
            .field("count", &self.count())
            .finish()
    }
}

/// Active timing scope returned by [`Timer::time`].
pub struct TimerGuard<'a> {
    timer: &'a Timer,
    start: Instant,
}

impl TimerGuard<'_> {
    /// Stop now instead of at end of scope.
    pub fn stop(self) {}
}

impl Drop for TimerGuard<'_> {
    fn drop(&mut self) {
        self.timer.record(self.start.elapsed());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn timer() -> Timer {
        Timer::with_seed(&ReservoirSpec::Uniform { capacity: 64 }, Some(23))
    }

    #[test]
    fn record_lands_in_nanoseconds() {
        let t = timer();
        t.record(Duration::from_millis(2));
        t.record(Duration::from_millis(4));
        let v = t.collect(false);
        assert_eq!(v.duration.count, 2);
        assert_eq!(v.rate.count, 2);
        assert_eq!(v.duration.min, 2_000_000);
        assert_eq!(v.duration.max, 4_000_000);
    }

    #[test]
    fn time_fn_returns_the_closure_output() {
        let t = timer();
        let answer = t.time_fn(|| 40 + 2);
        assert_eq!(answer, 42);
        assert_eq!(t.count(), 1);
    }

    #[test]
    fn guard_records_once_on_drop() {
        let t = timer();
        {
            let _scope = t.time();
        }
        let guard = t.time();
        guard.stop();
        assert_eq!(t.count(), 2);
    }

    #[test]
    fn oversized_duration_saturates() {
        let t = timer();
        t.record(Duration::from_secs(u64::MAX));
        assert_eq!(t.collect(false).duration.max, i64::MAX);
    }
}
