//! Reporter and scheduler configuration.
//!
//! Plain serde data with strict field checking and range validation. These
//! structs say how reporting behaves; loading them from files or the
//! environment is the embedding application's business.

use std::time::Duration;

use backon::ExponentialBuilder;
use serde::{Deserialize, Serialize};

use vitals_core::encode::SnapshotFormat;
use vitals_core::error::{Result, VitalsError};
use vitals_core::filter::MetricFilter;

use crate::collect::ResetPolicy;

/// Retry policy for one reporter's deliveries within a tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RetryPolicy {
    /// Total attempts per tick, the first try included.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: usize,

    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,

    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

impl RetryPolicy {
    pub fn validate(&self) -> Result<()> {
        if self.max_attempts == 0 {
            return Err(VitalsError::InvalidConfig(
                "retry.max_attempts must be at least 1".into(),
            ));
        }
        if self.max_attempts > 10 {
            return Err(VitalsError::InvalidConfig(
                "retry.max_attempts must be at most 10".into(),
            ));
        }
        if self.base_delay_ms == 0 {
            return Err(VitalsError::InvalidConfig(
                "retry.base_delay_ms must be at least 1".into(),
            ));
        }
        if self.max_delay_ms < self.base_delay_ms {
            return Err(VitalsError::InvalidConfig(
                "retry.max_delay_ms must not be below base_delay_ms".into(),
            ));
        }
        Ok(())
    }

    /// Backoff schedule for `backon`. `max_attempts` counts the first try,
    /// so the builder is given one fewer retry.
    pub fn backoff(&self) -> ExponentialBuilder {
        ExponentialBuilder::default()
            .with_min_delay(Duration::from_millis(self.base_delay_ms))
            .with_max_delay(Duration::from_millis(self.max_delay_ms))
            .with_max_times(self.max_attempts.saturating_sub(1))
            .with_jitter()
    }
}

fn default_max_attempts() -> usize {
    3
}
fn default_base_delay_ms() -> u64 {
    100
}
fn default_max_delay_ms() -> u64 {
    5000
}

/// One reporter: pacing, filtering, encoding, and retry for one sink.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReporterConfig {
    /// Name used in logs and stats lookups; unique per scheduler.
    pub name: String,

    /// Backend address handed to whoever constructs the sink. The engine
    /// itself only logs it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,

    /// Per-attempt delivery timeout.
    #[serde(default = "default_send_timeout_ms")]
    pub send_timeout_ms: u64,

    #[serde(default)]
    pub format: SnapshotFormat,

    #[serde(default)]
    pub filter: MetricFilter,

    #[serde(default)]
    pub retry: RetryPolicy,
}

impl ReporterConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            endpoint: None,
            interval_ms: default_interval_ms(),
            send_timeout_ms: default_send_timeout_ms(),
            format: SnapshotFormat::default(),
            filter: MetricFilter::default(),
            retry: RetryPolicy::default(),
        }
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn send_timeout(&self) -> Duration {
        Duration::from_millis(self.send_timeout_ms)
    }

    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(VitalsError::InvalidConfig(
                "reporter.name must not be empty".into(),
            ));
        }
        if !(100..=3_600_000).contains(&self.interval_ms) {
            return Err(VitalsError::InvalidConfig(format!(
                "reporter `{}`: interval_ms must be between 100 and 3600000",
                self.name
            )));
        }
        if !(10..=600_000).contains(&self.send_timeout_ms) {
            return Err(VitalsError::InvalidConfig(format!(
                "reporter `{}`: send_timeout_ms must be between 10 and 600000",
                self.name
            )));
        }
        if matches!(&self.endpoint, Some(e) if e.is_empty()) {
            return Err(VitalsError::InvalidConfig(format!(
                "reporter `{}`: endpoint must not be empty when given",
                self.name
            )));
        }
        self.retry.validate()
    }
}

fn default_interval_ms() -> u64 {
    5000
}
fn default_send_timeout_ms() -> u64 {
    10000
}

/// Options shared by every reporter under one scheduler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SchedulerConfig {
    /// How long an in-flight delivery may finish after shutdown is signaled.
    #[serde(default = "default_shutdown_grace_ms")]
    pub shutdown_grace_ms: u64,

    /// Conjoined with every reporter's own filter.
    #[serde(default)]
    pub global_filter: MetricFilter,

    /// Reset-on-read, applied once per tick by the shared snapshot builder.
    #[serde(default)]
    pub reset: ResetPolicy,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            shutdown_grace_ms: default_shutdown_grace_ms(),
            global_filter: MetricFilter::default(),
            reset: ResetPolicy::default(),
        }
    }
}

impl SchedulerConfig {
    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_millis(self.shutdown_grace_ms)
    }

    pub fn validate(&self) -> Result<()> {
        if !(100..=60_000).contains(&self.shutdown_grace_ms) {
            return Err(VitalsError::InvalidConfig(
                "scheduler.shutdown_grace_ms must be between 100 and 60000".into(),
            ));
        }
        Ok(())
    }
}

fn default_shutdown_grace_ms() -> u64 {
    2000
}
