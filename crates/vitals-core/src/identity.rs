//! Metric identity: a name plus an ordered tag set.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Context name used when a metric name has no leading dot-segment.
pub const DEFAULT_CONTEXT: &str = "app";

/// Instrument kinds known to the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    Counter,
    Gauge,
    Meter,
    Histogram,
    Timer,
}

impl MetricKind {
    /// Stable lowercase name used in encodings and log fields.
    pub fn as_str(self) -> &'static str {
        match self {
            MetricKind::Counter => "counter",
            MetricKind::Gauge => "gauge",
            MetricKind::Meter => "meter",
            MetricKind::Histogram => "histogram",
            MetricKind::Timer => "timer",
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity of one metric: `(name, tag set)`.
///
/// Tags are kept sorted by key from construction onward, so two ids built
/// from the same pairs in any order compare equal and hash identically. The
/// registry relies on this for identity-keyed lookup.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "RawMetricId")]
pub struct MetricId {
    name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    tags: Vec<(String, String)>,
}

/// Accepts tags in any order on deserialize; `From` re-establishes the
/// sorted-by-key invariant.
#[derive(Deserialize)]
struct RawMetricId {
    name: String,
    #[serde(default)]
    tags: Vec<(String, String)>,
}

impl From<RawMetricId> for MetricId {
    fn from(raw: RawMetricId) -> Self {
        raw.tags
            .into_iter()
            .fold(MetricId::new(raw.name), |id, (k, v)| id.with_tag(k, v))
    }
}

impl MetricId {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tags: Vec::new(),
        }
    }

    /// Add one tag. A repeated key replaces the earlier value.
    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let key = key.into();
        let value = value.into();
        match self
            .tags
            .binary_search_by(|(k, _)| k.as_str().cmp(key.as_str()))
        {
            Ok(i) => {
                if let Some(slot) = self.tags.get_mut(i) {
                    slot.1 = value;
                }
            }
            Err(i) => self.tags.insert(i, (key, value)),
        }
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Tag pairs, sorted by key.
    pub fn tags(&self) -> &[(String, String)] {
        &self.tags
    }

    /// Value of one tag, if present.
    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags
            .binary_search_by(|(k, _)| k.as_str().cmp(key))
            .ok()
            .and_then(|i| self.tags.get(i))
            .map(|(_, v)| v.as_str())
    }

    /// Context group the metric reports under: the leading dot-segment of the
    /// name (`requests` for `requests.active`), or [`DEFAULT_CONTEXT`] when
    /// the name has none.
    pub fn context(&self) -> &str {
        match self.name.split_once('.') {
            Some((head, _)) if !head.is_empty() => head,
            _ => DEFAULT_CONTEXT,
        }
    }
}

impl fmt::Display for MetricId {
    /// `name{key=value,...}`, tags in key order.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        if self.tags.is_empty() {
            return Ok(());
        }
        f.write_str("{")?;
        for (i, (k, v)) in self.tags.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{k}={v}")?;
        }
        f.write_str("}")
    }
}
