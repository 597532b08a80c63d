//! Serializable metric filters.
//!
//! A filter is data, not a closure: a tagged enum evaluated by a small pure
//! interpreter. Reporters can therefore carry their filter in configuration,
//! log it, and round-trip it through JSON, and two processes given the same
//! filter document select exactly the same metrics.

use serde::{Deserialize, Serialize};

use crate::identity::{MetricId, MetricKind};
use crate::snapshot::{ContextSnapshot, MetricSnapshot};

/// Predicate over metric identities and kinds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", deny_unknown_fields)]
pub enum MetricFilter {
    /// Accepts every metric.
    All,
    /// Name starts with the given prefix.
    StartsWith { prefix: String },
    /// Tag key is present; with `value` set, the tag must equal it.
    Tagged {
        key: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        value: Option<String>,
    },
    /// Instrument kind matches.
    OfKind { kind: MetricKind },
    /// Every inner filter accepts. Empty accepts everything.
    AllOf { filters: Vec<MetricFilter> },
    /// At least one inner filter accepts. Empty rejects everything.
    AnyOf { filters: Vec<MetricFilter> },
    /// Inner filter rejects.
    Not { filter: Box<MetricFilter> },
}

impl Default for MetricFilter {
    fn default() -> Self {
        MetricFilter::All
    }
}

impl MetricFilter {
    /// Evaluate against one identity. Pure: no registry access, no side
    /// effects, total over every possible filter document.
    pub fn matches(&self, id: &MetricId, kind: MetricKind) -> bool {
        match self {
            MetricFilter::All => true,
            MetricFilter::StartsWith { prefix } => id.name().starts_with(prefix.as_str()),
            MetricFilter::Tagged { key, value } => match (id.tag(key), value) {
                (Some(have), Some(want)) => have == want,
                (Some(_), None) => true,
                (None, _) => false,
            },
            MetricFilter::OfKind { kind: want } => kind == *want,
            MetricFilter::AllOf { filters } => filters.iter().all(|f| f.matches(id, kind)),
            MetricFilter::AnyOf { filters } => filters.iter().any(|f| f.matches(id, kind)),
            MetricFilter::Not { filter } => !filter.matches(id, kind),
        }
    }

    /// Conjunction of two filters. `All` is the identity element, and nested
    /// `AllOf`s flatten, so chaining stays readable in logs.
    pub fn and(self, other: MetricFilter) -> MetricFilter {
        match (self, other) {
            (MetricFilter::All, f) | (f, MetricFilter::All) => f,
            (MetricFilter::AllOf { mut filters }, f) => {
                filters.push(f);
                MetricFilter::AllOf { filters }
            }
            (a, b) => MetricFilter::AllOf {
                filters: vec![a, b],
            },
        }
    }

    /// Produce a filtered copy of a snapshot. The input is untouched; a
    /// filter that rejects everything yields an empty snapshot, never an
    /// absent one. Contexts left without entries are dropped.
    pub fn apply(&self, snapshot: &MetricSnapshot) -> MetricSnapshot {
        if matches!(self, MetricFilter::All) {
            return snapshot.clone();
        }
        let contexts = snapshot
            .contexts
            .iter()
            .filter_map(|ctx| {
                let entries: Vec<_> = ctx
                    .entries
                    .iter()
                    .filter(|e| self.matches(&e.id, e.value.kind()))
                    .cloned()
                    .collect();
                if entries.is_empty() {
                    None
                } else {
                    Some(ContextSnapshot {
                        context: ctx.context.clone(),
                        entries,
                    })
                }
            })
            .collect();
        MetricSnapshot {
            timestamp_ms: snapshot.timestamp_ms,
            contexts,
        }
    }
}
