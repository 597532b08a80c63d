//! Threshold health checks evaluated over metric snapshots.
//!
//! A check is a probe that pulls one number out of a snapshot plus a
//! threshold it must stay on the right side of. Checks read snapshots, never
//! the live registry, so evaluating them moves no instrument state; callers
//! should feed them snapshots from a reset-free builder.

use parking_lot::RwLock;
use serde::Serialize;

use vitals_core::identity::MetricId;
use vitals_core::snapshot::{MetricSnapshot, MetricValue};

/// Bound the observed value must respect.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Threshold {
    /// Passes while `observed <= limit`.
    Max(f64),
    /// Passes while `observed >= limit`.
    Min(f64),
}

impl Threshold {
    fn admits(&self, observed: f64) -> bool {
        match self {
            Threshold::Max(limit) => observed <= *limit,
            Threshold::Min(limit) => observed >= *limit,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckStatus {
    Pass,
    Fail,
    /// The probe found no value in the snapshot.
    Unknown,
}

/// Outcome of one check against one snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub observed: Option<f64>,
    pub threshold: Threshold,
}

type Probe = dyn Fn(&MetricSnapshot) -> Option<f64> + Send + Sync;

struct HealthCheck {
    name: String,
    threshold: Threshold,
    probe: Box<Probe>,
}

/// Named health checks, evaluated in registration order.
#[derive(Default)]
pub struct HealthRegistry {
    checks: RwLock<Vec<HealthCheck>>,
}

impl HealthRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a check; a repeated name replaces the earlier check.
    pub fn register(
        &self,
        name: impl Into<String>,
        threshold: Threshold,
        probe: impl Fn(&MetricSnapshot) -> Option<f64> + Send + Sync + 'static,
    ) {
        let name = name.into();
        let check = HealthCheck {
            name,
            threshold,
            probe: Box::new(probe),
        };
        let mut checks = self.checks.write();
        match checks.iter_mut().find(|c| c.name == check.name) {
            Some(slot) => *slot = check,
            None => checks.push(check),
        }
    }

    /// Check that a counter's value stays at or below `limit`.
    pub fn counter_max(&self, name: impl Into<String>, id: MetricId, limit: f64) {
        self.register(name, Threshold::Max(limit), move |snap| {
            match snap.find(&id) {
                Some(MetricValue::Counter { value }) => Some(*value as f64),
                _ => None,
            }
        });
    }

    /// Check that a gauge stays at or below `limit`.
    pub fn gauge_max(&self, name: impl Into<String>, id: MetricId, limit: f64) {
        self.register(name, Threshold::Max(limit), move |snap| {
            match snap.find(&id) {
                Some(MetricValue::Gauge { value }) => Some(*value),
                _ => None,
            }
        });
    }

    /// Check that a gauge stays at or above `limit`.
    pub fn gauge_min(&self, name: impl Into<String>, id: MetricId, limit: f64) {
        self.register(name, Threshold::Min(limit), move |snap| {
            match snap.find(&id) {
                Some(MetricValue::Gauge { value }) => Some(*value),
                _ => None,
            }
        });
    }

    pub fn len(&self) -> usize {
        self.checks.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.checks.read().is_empty()
    }

    /// Evaluate every check against one snapshot.
    pub fn run(&self, snapshot: &MetricSnapshot) -> Vec<CheckResult> {
        self.checks
            .read()
            .iter()
            .map(|check| {
                let observed = (check.probe)(snapshot);
                let status = match observed {
                    Some(v) if check.threshold.admits(v) => CheckStatus::Pass,
                    Some(_) => CheckStatus::Fail,
                    None => CheckStatus::Unknown,
                };
                CheckResult {
                    name: check.name.clone(),
                    status,
                    observed,
                    threshold: check.threshold,
                }
            })
            .collect()
    }

    /// True when no check fails. Unknown does not fail: a metric that has
    /// not been registered yet is not an unhealthy process.
    pub fn healthy(&self, snapshot: &MetricSnapshot) -> bool {
        self.run(snapshot)
            .iter()
            .all(|r| r.status != CheckStatus::Fail)
    }
}
