//! Immutable point-in-time captures of metric values.
//!
//! A [`MetricSnapshot`] is plain data: once built it never changes and can be
//! filtered, encoded, and shipped without touching the live instruments
//! again. Entries are grouped by context but keep overall registration order.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::identity::{MetricId, MetricKind};
use crate::sampling::SampleSet;

/// Wall-clock milliseconds since the unix epoch, `0` if the clock is broken.
pub fn unix_time_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Meter reading: lifetime count plus moving rates in events per second.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeterValue {
    pub count: u64,
    pub mean_rate: f64,
    pub m1_rate: f64,
    pub m5_rate: f64,
    pub m15_rate: f64,
}

/// Distribution summary computed from a reservoir sample set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistogramValue {
    /// Total observations, including those the reservoir sampled away.
    pub count: u64,
    pub min: i64,
    pub max: i64,
    pub mean: f64,
    pub std_dev: f64,
    pub p50: f64,
    pub p75: f64,
    pub p95: f64,
    pub p99: f64,
    pub p999: f64,
}

impl HistogramValue {
    pub fn from_samples(count: u64, samples: &SampleSet) -> Self {
        Self {
            count,
            min: samples.min(),
            max: samples.max(),
            mean: samples.mean(),
            std_dev: samples.std_dev(),
            p50: samples.quantile(0.50),
            p75: samples.quantile(0.75),
            p95: samples.quantile(0.95),
            p99: samples.quantile(0.99),
            p999: samples.quantile(0.999),
        }
    }
}

/// Timer reading: a duration distribution in nanoseconds plus a call rate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimerValue {
    /// Elapsed-time distribution, in nanoseconds.
    pub duration: HistogramValue,
    pub rate: MeterValue,
}

/// One metric's collected value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MetricValue {
    Counter { value: i64 },
    Gauge { value: f64 },
    Meter(MeterValue),
    Histogram(HistogramValue),
    Timer(TimerValue),
}

impl MetricValue {
    pub fn kind(&self) -> MetricKind {
        match self {
            MetricValue::Counter { .. } => MetricKind::Counter,
            MetricValue::Gauge { .. } => MetricKind::Gauge,
            MetricValue::Meter(_) => MetricKind::Meter,
            MetricValue::Histogram(_) => MetricKind::Histogram,
            MetricValue::Timer(_) => MetricKind::Timer,
        }
    }
}

/// One `(identity, value)` pair in a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotEntry {
    pub id: MetricId,
    pub value: MetricValue,
}

/// All metrics of one context, in registration order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextSnapshot {
    pub context: String,
    pub entries: Vec<SnapshotEntry>,
}

/// Timestamped capture of every collected metric.
///
/// Contexts appear in order of their first-registered metric; entries within
/// a context keep registration order too. A snapshot with no entries is a
/// valid snapshot, not an absent one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSnapshot {
    pub timestamp_ms: u64,
    pub contexts: Vec<ContextSnapshot>,
}

impl MetricSnapshot {
    /// Group ordered entries into per-context blocks.
    pub fn from_entries(timestamp_ms: u64, entries: Vec<SnapshotEntry>) -> Self {
        let mut contexts: Vec<ContextSnapshot> = Vec::new();
        for entry in entries {
            let name = entry.id.context();
            match contexts.iter_mut().find(|c| c.context == name) {
                Some(ctx) => ctx.entries.push(entry),
                None => contexts.push(ContextSnapshot {
                    context: name.to_owned(),
                    entries: vec![entry],
                }),
            }
        }
        Self {
            timestamp_ms,
            contexts,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.contexts.iter().all(|c| c.entries.is_empty())
    }

    /// Total entries across all contexts.
    pub fn entry_count(&self) -> usize {
        self.contexts.iter().map(|c| c.entries.len()).sum()
    }

    /// All entries in registration order, contexts flattened away.
    pub fn entries(&self) -> impl Iterator<Item = &SnapshotEntry> {
        self.contexts.iter().flat_map(|c| c.entries.iter())
    }

    /// Value recorded for one identity, if present.
    pub fn find(&self, id: &MetricId) -> Option<&MetricValue> {
        self.entries().find(|e| &e.id == id).map(|e| &e.value)
    }
}
