//! Sampling reservoirs backing histograms and timers.
//!
//! A reservoir retains a bounded subset of observed values and can be asked
//! for a [`SampleSet`] at any point. All reservoirs live behind the owning
//! instrument's lock, so the implementations here are plain `&mut self` state
//! machines with no synchronization of their own.

mod decaying;
mod uniform;
mod window;

pub use decaying::ExpDecayReservoir;
pub use uniform::UniformReservoir;
pub use window::SlidingWindowReservoir;

use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::error::{Result, VitalsError};

/// How a histogram's reservoir is built.
///
/// Serializable so reservoir tuning travels with reporter and registry
/// configuration instead of being baked into call sites.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", deny_unknown_fields)]
pub enum ReservoirSpec {
    /// Fixed-capacity uniform sampling over the whole stream.
    Uniform {
        #[serde(default = "default_capacity")]
        capacity: usize,
    },
    /// Exponentially weighted toward recent samples (forward decay).
    ExpDecay {
        #[serde(default = "default_capacity")]
        capacity: usize,
        /// Decay rate per second; higher forgets faster.
        #[serde(default = "default_alpha")]
        alpha: f64,
        /// How often the decay landmark is moved forward.
        #[serde(default = "default_rescale_secs")]
        rescale_secs: u64,
    },
    /// Every sample from the trailing window, nothing older.
    SlidingWindow {
        #[serde(default = "default_window_secs")]
        window_secs: u64,
    },
}

fn default_capacity() -> usize {
    1028
}

fn default_alpha() -> f64 {
    0.015
}

fn default_rescale_secs() -> u64 {
    3600
}

fn default_window_secs() -> u64 {
    60
}

impl Default for ReservoirSpec {
    /// Exponential decay sized to give a five-minute-ish view at 95%
    /// confidence, matching the usual latency-tracking defaults.
    fn default() -> Self {
        ReservoirSpec::ExpDecay {
            capacity: default_capacity(),
            alpha: default_alpha(),
            rescale_secs: default_rescale_secs(),
        }
    }
}

impl ReservoirSpec {
    pub fn validate(&self) -> Result<()> {
        match self {
            ReservoirSpec::Uniform { capacity } => {
                if *capacity == 0 {
                    return Err(VitalsError::InvalidConfig(
                        "uniform reservoir capacity must be at least 1".into(),
                    ));
                }
            }
            ReservoirSpec::ExpDecay {
                capacity,
                alpha,
                rescale_secs,
            } => {
                if *capacity == 0 {
                    return Err(VitalsError::InvalidConfig(
                        "exp_decay reservoir capacity must be at least 1".into(),
                    ));
                }
                if !alpha.is_finite() || *alpha <= 0.0 {
                    return Err(VitalsError::InvalidConfig(format!(
                        "exp_decay alpha must be a positive finite number, got {alpha}"
                    )));
                }
                if *rescale_secs == 0 {
                    return Err(VitalsError::InvalidConfig(
                        "exp_decay rescale_secs must be at least 1".into(),
                    ));
                }
            }
            ReservoirSpec::SlidingWindow { window_secs } => {
                if *window_secs == 0 {
                    return Err(VitalsError::InvalidConfig(
                        "sliding_window window_secs must be at least 1".into(),
                    ));
                }
            }
        }
        Ok(())
    }

    /// Build the reservoir. A seed pins the sampling RNG so tests can demand
    /// reproducible retention.
    pub(crate) fn build(&self, seed: Option<u64>) -> Box<dyn ReservoirCore> {
        match *self {
            ReservoirSpec::Uniform { capacity } => match seed {
                Some(s) => Box::new(UniformReservoir::seeded(capacity, s)),
                None => Box::new(UniformReservoir::new(capacity)),
            },
            ReservoirSpec::ExpDecay {
                capacity,
                alpha,
                rescale_secs,
            } => match seed {
                Some(s) => Box::new(ExpDecayReservoir::seeded(capacity, alpha, rescale_secs, s)),
                None => Box::new(ExpDecayReservoir::new(capacity, alpha, rescale_secs)),
            },
            ReservoirSpec::SlidingWindow { window_secs } => {
                Box::new(SlidingWindowReservoir::new(window_secs))
            }
        }
    }
}

/// Mutable reservoir state machine.
///
/// `snapshot` takes `&mut self` because reading is where time-based
/// housekeeping happens: window reservoirs drop expired samples and decaying
/// reservoirs rescale their landmark.
pub(crate) trait ReservoirCore: Send {
    fn update(&mut self, value: i64, now: Instant);
    fn snapshot(&mut self, now: Instant) -> SampleSet;
}

/// Immutable set of retained samples, sorted ascending.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SampleSet {
    values: Vec<i64>,
}

impl SampleSet {
    pub(crate) fn from_unsorted(mut values: Vec<i64>) -> Self {
        values.sort_unstable();
        Self { values }
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Retained samples, ascending.
    pub fn values(&self) -> &[i64] {
        &self.values
    }

    /// Smallest retained sample, `0` when empty.
    pub fn min(&self) -> i64 {
        self.values.first().copied().unwrap_or(0)
    }

    /// Largest retained sample, `0` when empty.
    pub fn max(&self) -> i64 {
        self.values.last().copied().unwrap_or(0)
    }

    pub fn mean(&self) -> f64 {
        if self.values.is_empty() {
            return 0.0;
        }
        let sum: f64 = self.values.iter().map(|v| *v as f64).sum();
        sum / self.values.len() as f64
    }

    /// Sample standard deviation; `0` with fewer than two samples.
    pub fn std_dev(&self) -> f64 {
        if self.values.len() < 2 {
            return 0.0;
        }
        let mean = self.mean();
        let sum_sq: f64 = self
            .values
            .iter()
            .map(|v| {
                let d = *v as f64 - mean;
                d * d
            })
            .sum();
        (sum_sq / (self.values.len() - 1) as f64).sqrt()
    }

    /// Value at quantile `q` in `[0, 1]`, linearly interpolated between the
    /// two adjacent ranks. Out-of-range `q` clamps, so `quantile(0.0)` is the
    /// min and `quantile(1.0)` the max. Empty sets yield `0`.
    pub fn quantile(&self, q: f64) -> f64 {
        if self.values.is_empty() {
            return 0.0;
        }
        let q = if q.is_finite() { q.clamp(0.0, 1.0) } else { 0.0 };
        let pos = q * (self.values.len() - 1) as f64;
        let lower = pos.floor() as usize;
        let upper = pos.ceil() as usize;
        let low = self.values.get(lower).copied().unwrap_or(0) as f64;
        let high = self.values.get(upper).copied().unwrap_or(0) as f64;
        low + (pos - lower as f64) * (high - low)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(values: Vec<i64>) -> SampleSet {
        SampleSet::from_unsorted(values)
    }

    #[test]
    fn empty_set_is_all_zeroes() {
        let s = SampleSet::default();
        assert_eq!(s.min(), 0);
        assert_eq!(s.max(), 0);
        assert_eq!(s.mean(), 0.0);
        assert_eq!(s.std_dev(), 0.0);
        assert_eq!(s.quantile(0.99), 0.0);
    }

    #[test]
    fn quantile_endpoints_hit_min_and_max() {
        let s = set(vec![30, 10, 20, 50, 40]);
        assert_eq!(s.quantile(0.0), 10.0);
        assert_eq!(s.quantile(1.0), 50.0);
        assert_eq!(s.quantile(-3.0), 10.0);
        assert_eq!(s.quantile(7.0), 50.0);
    }

    #[test]
    fn quantile_interpolates_between_ranks() {
        let s = set(vec![10, 20, 30, 40]);
        // median falls halfway between ranks 1 and 2
        assert_eq!(s.quantile(0.5), 25.0);
        assert_eq!(s.quantile(0.25), 17.5);
    }

    #[test]
    fn mean_and_std_dev() {
        let s = set(vec![2, 4, 4, 4, 5, 5, 7, 9]);
        assert_eq!(s.mean(), 5.0);
        // sample variance of this classic set is 32/7
        assert!((s.std_dev() - (32.0f64 / 7.0).sqrt()).abs() < 1e-9);
    }

    #[test]
    fn single_sample_has_zero_deviation() {
        let s = set(vec![42]);
        assert_eq!(s.std_dev(), 0.0);
        assert_eq!(s.quantile(0.5), 42.0);
    }

    #[test]
    fn spec_validation_rejects_degenerate_values() {
        assert!(ReservoirSpec::Uniform { capacity: 0 }.validate().is_err());
        assert!(ReservoirSpec::ExpDecay {
            capacity: 128,
            alpha: 0.0,
            rescale_secs: 3600
        }
        .validate()
        .is_err());
        assert!(ReservoirSpec::ExpDecay {
            capacity: 128,
            alpha: f64::NAN,
            rescale_secs: 3600
        }
        .validate()
        .is_err());
        assert!(ReservoirSpec::SlidingWindow { window_secs: 0 }
            .validate()
            .is_err());
        assert!(ReservoirSpec::default().validate().is_ok());
    }

    #[test]
    fn spec_round_trips_through_json() -> crate::Result<()> {
        let spec = ReservoirSpec::ExpDecay {
            capacity: 512,
            alpha: 0.03,
            rescale_secs: 600,
        };
        let json =
            serde_json::to_string(&spec).map_err(|e| crate::VitalsError::Encode(e.to_string()))?;
        let back: ReservoirSpec =
            serde_json::from_str(&json).map_err(|e| crate::VitalsError::Encode(e.to_string()))?;
        assert_eq!(spec, back);
        Ok(())
    }

    #[test]
    fn spec_defaults_fill_missing_fields() -> crate::Result<()> {
        let spec: ReservoirSpec = serde_json::from_str(r#"{"type":"exp_decay"}"#)
            .map_err(|e| crate::VitalsError::Encode(e.to_string()))?;
        assert_eq!(spec, ReservoirSpec::default());
        Ok(())
    }

    #[test]
    fn spec_rejects_malformed_documents() {
        // unknown reservoir type
        assert!(serde_json::from_str::<ReservoirSpec>(r#"{"type":"biased","capacity":9}"#).is_err());
        // wrong-typed capacity
        assert!(
            serde_json::from_str::<ReservoirSpec>(r#"{"type":"uniform","capacity":-4}"#).is_err()
        );
    }
}
