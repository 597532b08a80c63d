//! Process-wide metric registry.
//!
//! Identity-keyed, create-on-first-use. The registry is explicit shared
//! state: callers hold it in an `Arc` and hand clones to whatever records or
//! reports, there is no process-global instance. Concurrent lookups for the
//! same identity race on one `DashMap` entry and every caller ends up with
//! the same instrument.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;

use vitals_core::error::{Result, VitalsError};
use vitals_core::identity::{MetricId, MetricKind};
use vitals_core::instrument::{Counter, Gauge, Histogram, Meter, Timer};
use vitals_core::sampling::ReservoirSpec;

/// Registry construction options.
#[derive(Debug, Clone, Default)]
pub struct RegistryConfig {
    /// Reservoir built by `histogram`/`timer` when no explicit one is given.
    pub default_reservoir: ReservoirSpec,
    /// Seed for reservoir RNGs. Pinning it makes sampling reproducible, which
    /// tests rely on; production registries leave it unset.
    pub reservoir_seed: Option<u64>,
}

/// A registered instrument of any kind. Cloning shares the underlying
/// instance.
#[derive(Debug, Clone)]
pub enum Instrument {
    Counter(Arc<Counter>),
    Gauge(Arc<Gauge>),
    Meter(Arc<Meter>),
    Histogram(Arc<Histogram>),
    Timer(Arc<Timer>),
}

impl Instrument {
    pub fn kind(&self) -> MetricKind {
        match self {
            Instrument::Counter(_) => MetricKind::Counter,
            Instrument::Gauge(_) => MetricKind::Gauge,
            Instrument::Meter(_) => MetricKind::Meter,
            Instrument::Histogram(_) => MetricKind::Histogram,
            Instrument::Timer(_) => MetricKind::Timer,
        }
    }
}

struct Registered {
    instrument: Instrument,
    created_seq: u64,
}

/// Shared registry of named instruments.
///
/// Lookup-or-create is idempotent: the first caller for an identity creates
/// the instrument, every later or racing caller receives the same instance.
/// Requesting an existing identity under a different kind fails without
/// disturbing the entry.
pub struct MetricRegistry {
    metrics: DashMap<MetricId, Registered>,
    seq: AtomicU64,
    config: RegistryConfig,
}

impl MetricRegistry {
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    pub fn with_config(config: RegistryConfig) -> Self {
        Self {
            metrics: DashMap::new(),
            seq: AtomicU64::new(1),
            config,
        }
    }

    pub fn counter(&self, id: MetricId) -> Result<Arc<Counter>> {
        let entry = self.metrics.entry(id).or_insert_with(|| {
            self.register(Instrument::Counter(Arc::new(Counter::new())))
        });
        match &entry.instrument {
            Instrument::Counter(c) => Ok(Arc::clone(c)),
            other => Err(Self::mismatch(entry.key(), other, MetricKind::Counter)),
        }
    }

    pub fn gauge(&self, id: MetricId) -> Result<Arc<Gauge>> {
        let entry = self
            .metrics
            .entry(id)
            .or_insert_with(|| self.register(Instrument::Gauge(Arc::new(Gauge::new()))));
        match &entry.instrument {
            Instrument::Gauge(g) => Ok(Arc::clone(g)),
            other => Err(Self::mismatch(entry.key(), other, MetricKind::Gauge)),
        }
    }

    pub fn meter(&self, id: MetricId) -> Result<Arc<Meter>> {
        let entry = self
            .metrics
            .entry(id)
            .or_insert_with(|| self.register(Instrument::Meter(Arc::new(Meter::new()))));
        match &entry.instrument {
            Instrument::Meter(m) => Ok(Arc::clone(m)),
            other => Err(Self::mismatch(entry.key(), other, MetricKind::Meter)),
        }
    }

    /// Histogram over the registry's default reservoir.
    pub fn histogram(&self, id: MetricId) -> Result<Arc<Histogram>> {
        let spec = self.config.default_reservoir.clone();
        self.histogram_with(id, &spec)
    }

    /// Histogram over an explicit reservoir. The reservoir only applies on
    /// first registration; later callers share whatever was built first.
    pub fn histogram_with(&self, id: MetricId, spec: &ReservoirSpec) -> Result<Arc<Histogram>> {
        let entry = self.metrics.entry(id).or_insert_with(|| {
            self.register(Instrument::Histogram(Arc::new(Histogram::with_seed(
                spec,
                self.config.reservoir_seed,
            ))))
        });
        match &entry.instrument {
            Instrument::Histogram(h) => Ok(Arc::clone(h)),
            other => Err(Self::mismatch(entry.key(), other, MetricKind::Histogram)),
        }
    }

    /// Timer over the registry's default reservoir.
    pub fn timer(&self, id: MetricId) -> Result<Arc<Timer>> {
        let spec = self.config.default_reservoir.clone();
        self.timer_with(id, &spec)
    }

    /// Timer over an explicit reservoir, same first-registration rule as
    /// [`MetricRegistry::histogram_with`].
    pub fn timer_with(&self, id: MetricId, spec: &ReservoirSpec) -> Result<Arc<Timer>> {
        let entry = self.metrics.entry(id).or_insert_with(|| {
            self.register(Instrument::Timer(Arc::new(Timer::with_seed(
                spec,
                self.config.reservoir_seed,
            ))))
        });
        match &entry.instrument {
            Instrument::Timer(t) => Ok(Arc::clone(t)),
            other => Err(Self::mismatch(entry.key(), other, MetricKind::Timer)),
        }
    }

    pub fn contains(&self, id: &MetricId) -> bool {
        self.metrics.contains_key(id)
    }

    /// Kind registered for an identity, if any.
    pub fn kind_of(&self, id: &MetricId) -> Option<MetricKind> {
        self.metrics.get(id).map(|r| r.instrument.kind())
    }

    pub fn len(&self) -> usize {
        self.metrics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }

    /// All instruments in registration order. The map itself has no useful
    /// iteration order, so entries carry a creation sequence and readers sort
    /// by it.
    pub fn instruments(&self) -> Vec<(MetricId, Instrument)> {
        let mut items: Vec<(u64, MetricId, Instrument)> = self
            .metrics
            .iter()
            .map(|r| (r.value().created_seq, r.key().clone(), r.value().instrument.clone()))
            .collect();
        items.sort_by_key(|(seq, _, _)| *seq);
        items.into_iter().map(|(_, id, ins)| (id, ins)).collect()
    }

    fn register(&self, instrument: Instrument) -> Registered {
        Registered {
            instrument,
            created_seq: self.seq.fetch_add(1, Ordering::Relaxed),
        }
    }

    fn mismatch(id: &MetricId, existing: &Instrument, requested: MetricKind) -> VitalsError {
        VitalsError::KindMismatch {
            id: id.to_string(),
            existing: existing.kind(),
            requested,
        }
    }
}

impl Default for MetricRegistry {
    fn default() -> Self {
        Self::new()
    }
}
