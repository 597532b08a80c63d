//! Snapshot construction from a live registry.

use serde::{Deserialize, Serialize};

use vitals_core::snapshot::{self, MetricSnapshot, MetricValue, SnapshotEntry};

use crate::registry::{Instrument, MetricRegistry};

/// Which instrument kinds are zeroed as they are read into a snapshot.
///
/// Reset-on-read hands each counted event to exactly one snapshot. That only
/// holds when a single builder drains the registry; a second resetting reader
/// would steal counts from the first, so deployments with several reporters
/// reset in the shared scheduler (or not at all), never per reporter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResetPolicy {
    #[serde(default)]
    pub counters: bool,
    /// Also restarts the rate meters inside timers.
    #[serde(default)]
    pub meters: bool,
}

impl ResetPolicy {
    /// Leave every instrument untouched.
    pub const fn none() -> Self {
        Self {
            counters: false,
            meters: false,
        }
    }

    pub const fn all() -> Self {
        Self {
            counters: true,
            meters: true,
        }
    }
}

/// Reads every registered instrument once, in registration order, into an
/// immutable [`MetricSnapshot`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SnapshotBuilder {
    reset: ResetPolicy,
}

impl SnapshotBuilder {
    /// Builder that never resets; two builds with no writes in between
    /// produce identical content.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_reset(reset: ResetPolicy) -> Self {
        Self { reset }
    }

    pub fn build(&self, registry: &MetricRegistry) -> MetricSnapshot {
        let entries: Vec<SnapshotEntry> = registry
            .instruments()
            .into_iter()
            .map(|(id, instrument)| {
                let value = match instrument {
                    Instrument::Counter(c) => MetricValue::Counter {
                        value: c.collect(self.reset.counters),
                    },
                    Instrument::Gauge(g) => MetricValue::Gauge { value: g.value() },
                    Instrument::Meter(m) => MetricValue::Meter(m.collect(self.reset.meters)),
                    Instrument::Histogram(h) => MetricValue::Histogram(h.collect()),
                    Instrument::Timer(t) => MetricValue::Timer(t.collect(self.reset.meters)),
                };
                SnapshotEntry { id, value }
            })
            .collect();
        MetricSnapshot::from_entries(snapshot::unix_time_ms(), entries)
    }
}
