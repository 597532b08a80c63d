//! Snapshot wire encodings.
//!
//! A reporter encodes its filtered snapshot exactly once per tick and hands
//! the same [`Bytes`] payload to the sink on every delivery attempt, so
//! retries never re-read the registry.

use std::fmt::Write;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::error::{Result, VitalsError};
use crate::snapshot::{MetricSnapshot, MetricValue};

/// Wire format for an encoded snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SnapshotFormat {
    #[default]
    Json,
    /// Line-oriented plain text, one metric per line.
    Text,
}

/// Encoded snapshot handed to sinks. Cloning is cheap; the body is shared.
#[derive(Debug, Clone)]
pub struct EncodedSnapshot {
    pub content_type: &'static str,
    pub body: Bytes,
}

/// Encode a snapshot in the given format.
pub fn encode(snapshot: &MetricSnapshot, format: SnapshotFormat) -> Result<EncodedSnapshot> {
    match format {
        SnapshotFormat::Json => {
            let body = serde_json::to_vec(snapshot)
                .map_err(|e| VitalsError::Encode(format!("json: {e}")))?;
            Ok(EncodedSnapshot {
                content_type: "application/json",
                body: Bytes::from(body),
            })
        }
        SnapshotFormat::Text => Ok(EncodedSnapshot {
            content_type: "text/plain; charset=utf-8",
            body: Bytes::from(render_text(snapshot)),
        }),
    }
}

/// Escape tag values for the text format.
fn escape_tag(v: &str) -> String {
    v.replace('\\', "\\\\").replace('"', "\\\"").replace('\n', "\\n")
}

fn render_text(snapshot: &MetricSnapshot) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# snapshot {}", snapshot.timestamp_ms);
    for ctx in &snapshot.contexts {
        let _ = writeln!(out, "# context {}", ctx.context);
        for entry in &ctx.entries {
            let mut line = String::from(entry.id.name());
            if !entry.id.tags().is_empty() {
                let tags = entry
                    .id
                    .tags()
                    .iter()
                    .map(|(k, v)| format!("{}=\"{}\"", k, escape_tag(v)))
                    .collect::<Vec<_>>()
                    .join(",");
                let _ = write!(line, "{{{tags}}}");
            }
            match &entry.value {
                MetricValue::Counter { value } => {
                    let _ = writeln!(out, "{line} counter value={value}");
                }
                MetricValue::Gauge { value } => {
                    let _ = writeln!(out, "{line} gauge value={value}");
                }
                MetricValue::Meter(m) => {
                    let _ = writeln!(
                        out,
                        "{line} meter count={} mean_rate={} m1_rate={} m5_rate={} m15_rate={}",
                        m.count, m.mean_rate, m.m1_rate, m.m5_rate, m.m15_rate
                    );
                }
                MetricValue::Histogram(h) => {
                    let _ = writeln!(
                        out,
                        "{line} histogram count={} min={} max={} mean={} p50={} p75={} p95={} p99={} p999={}",
                        h.count, h.min, h.max, h.mean, h.p50, h.p75, h.p95, h.p99, h.p999
                    );
                }
                MetricValue::Timer(t) => {
                    let _ = writeln!(
                        out,
                        "{line} timer count={} min_ns={} max_ns={} mean_ns={} p50_ns={} p95_ns={} p99_ns={} m1_rate={}",
                        t.duration.count,
                        t.duration.min,
                        t.duration.max,
                        t.duration.mean,
                        t.duration.p50,
                        t.duration.p95,
                        t.duration.p99,
                        t.rate.m1_rate
                    );
                }
            }
        }
    }
    out
}
