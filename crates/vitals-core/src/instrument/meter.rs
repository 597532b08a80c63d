//! Event-rate meter with exponentially weighted moving averages.
//!
//! Rates follow the classic load-average scheme: a five-second tick folds the
//! events accumulated since the last tick into 1/5/15-minute EWMAs. Ticks are
//! applied lazily on mark and on read, so an idle meter catches up on all the
//! decay it missed the next time anyone looks at it.

use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::snapshot::MeterValue;

/// Tick interval for EWMA updates.
pub const TICK_INTERVAL: Duration = Duration::from_secs(5);

// Past a few thousand ticks every window has decayed below any visible
// precision, so the catch-up loop after a long idle stretch is capped.
const CATCHUP_TICK_LIMIT: u64 = 4096;

/// One exponentially weighted moving average over event counts.
///
/// Pure state machine: callers feed it counts and drive the tick clock. The
/// first tick seeds the average with the instantaneous rate instead of
/// decaying from zero, so a fresh meter shows its real rate immediately.
#[derive(Debug, Clone)]
pub struct Ewma {
    alpha: f64,
    rate: f64,
    uncounted: u64,
    initialized: bool,
}

impl Ewma {
    /// EWMA for an averaging window of `window_min` minutes at the standard
    /// five-second tick: `alpha = 1 - exp(-interval / window)`.
    pub fn minutes(window_min: u32) -> Self {
        let interval = TICK_INTERVAL.as_secs_f64();
        let window = 60.0 * f64::from(window_min.max(1));
        Self {
            alpha: 1.0 - (-interval / window).exp(),
            rate: 0.0,
            uncounted: 0,
            initialized: false,
        }
    }

    /// Record `n` events into the current tick interval.
    pub fn update(&mut self, n: u64) {
        self.uncounted += n;
    }

    /// Fold one tick interval's worth of events into the average.
    pub fn tick(&mut self) {
        let instant_rate = self.uncounted as f64 / TICK_INTERVAL.as_secs_f64();
        self.uncounted = 0;
        if self.initialized {
            self.rate += self.alpha * (instant_rate - self.rate);
        } else {
            self.rate = instant_rate;
            self.initialized = true;
        }
    }

    /// Events per second.
    pub fn rate(&self) -> f64 {
        self.rate
    }
}

struct MeterState {
    count: u64,
    started: Instant,
    last_tick: Instant,
    m1: Ewma,
    m5: Ewma,
    m15: Ewma,
}

impl MeterState {
    fn fresh(now: Instant) -> Self {
        Self {
            count: 0,
            started: now,
            last_tick: now,
            m1: Ewma::minutes(1),
            m5: Ewma::minutes(5),
            m15: Ewma::minutes(15),
        }
    }
}

/// Counts events and tracks 1/5/15-minute moving rates plus the lifetime
/// mean rate.
pub struct Meter {
    state: Mutex<MeterState>,
}

impl Meter {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MeterState::fresh(Instant::now())),
        }
    }

    pub fn mark(&self) {
        self.mark_by(1);
    }

    pub fn mark_by(&self, n: u64) {
        let mut s = self.state.lock();
        Self::tick_to(&mut s, Instant::now());
        s.count += n;
        s.m1.update(n);
        s.m5.update(n);
        s.m15.update(n);
    }

    /// Events marked since creation (or the last reset).
    pub fn count(&self) -> u64 {
        self.state.lock().count
    }

    /// Apply every whole tick interval elapsed since the last applied tick.
    fn tick_to(s: &mut MeterState, now: Instant) {
        let elapsed = now.saturating_duration_since(s.last_tick);
        let ticks = (elapsed.as_nanos() / TICK_INTERVAL.as_nanos()) as u64;
        if ticks == 0 {
            return;
        }
        for _ in 0..ticks.min(CATCHUP_TICK_LIMIT) {
            s.m1.tick();
            s.m5.tick();
            s.m15.tick();
        }
        let remainder = elapsed.as_nanos() % TICK_INTERVAL.as_nanos();
        s.last_tick = now - Duration::from_nanos(remainder as u64);
    }

    /// Read for a snapshot. With `reset`, count, rates, and the mean-rate
    /// baseline all restart from zero under the same lock that produced the
    /// reading, so no mark can fall between the read and the reset.
    pub fn collect(&self, reset: bool) -> MeterValue {
        let now = Instant::now();
        let mut s = self.state.lock();
        Self::tick_to(&mut s, now);
        let lifetime = now.saturating_duration_since(s.started).as_secs_f64();
        let mean_rate = if lifetime > 0.0 {
            s.count as f64 / lifetime
        } else {
            0.0
        };
        let value = MeterValue {
            count: s.count,
            mean_rate,
            m1_rate: s.m1.rate(),
            m5_rate: s.m5.rate(),
            m15_rate: s.m15.rate(),
        };
        if reset {
            *s = MeterState::fresh(now);
        }
        value
    }
}

impl Default for Meter {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Meter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Meter")
            .field("count", &self.count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-6, "{a} !~ {b}");
    }

    #[test]
    fn first_tick_seeds_instant_rate() {
        let mut m1 = Ewma::minutes(1);
        m1.update(3);
        m1.tick();
        approx(m1.rate(), 0.6);
    }

    #[test]
    fn one_minute_window_decays_like_a_load_average() {
        // 3 events, then a minute of silence: rate drops by e^-1.
        let mut m1 = Ewma::minutes(1);
        m1.update(3);
        m1.tick();
        for _ in 0..12 {
            m1.tick();
        }
        approx(m1.rate(), 0.6 * (-1.0f64).exp());
    }

    #[test]
    fn longer_windows_decay_slower() {
        let mut m5 = Ewma::minutes(5);
        let mut m15 = Ewma::minutes(15);
        for e in [&mut m5, &mut m15] {
            e.update(3);
            e.tick();
        }
        for _ in 0..12 {
            m5.tick();
            m15.tick();
        }
        approx(m5.rate(), 0.6 * (-1.0f64 / 5.0).exp());
        approx(m15.rate(), 0.6 * (-1.0f64 / 15.0).exp());
    }

    #[test]
    fn meter_counts_marks() {
        let m = Meter::new();
        m.mark();
        m.mark_by(4);
        assert_eq!(m.count(), 5);
    }

    #[test]
    fn lazy_tick_applies_on_read() {
        let m = Meter::new();
        m.mark_by(3);
        {
            let mut s = m.state.lock();
            Meter::tick_to(&mut s, Instant::now() + Duration::from_secs(6));
            approx(s.m1.rate(), 0.6);
        }
    }

    #[test]
    fn idle_catch_up_applies_each_missed_tick() {
        let m = Meter::new();
        m.mark_by(3);
        {
            let mut s = m.state.lock();
            // one tick folds the marks in, a minute more decays them
            Meter::tick_to(&mut s, Instant::now() + Duration::from_secs(6));
            Meter::tick_to(&mut s, Instant::now() + Duration::from_secs(66));
            approx(s.m1.rate(), 0.6 * (-1.0f64).exp());
        }
    }

    #[test]
    fn collect_with_reset_restarts_from_zero() {
        let m = Meter::new();
        m.mark_by(10);
        let v = m.collect(true);
        assert_eq!(v.count, 10);
        let v = m.collect(false);
        assert_eq!(v.count, 0);
        assert_eq!(v.m1_rate, 0.0);
    }
}
