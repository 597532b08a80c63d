//! One reporter task: tick, snapshot, filter, encode, deliver.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use backon::Retryable;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;

use vitals_core::encode::{self, EncodedSnapshot};
use vitals_core::error::{Result, VitalsError};
use vitals_core::filter::MetricFilter;

use crate::collect::SnapshotBuilder;
use crate::config::ReporterConfig;
use crate::registry::MetricRegistry;
use crate::sink::Sink;

/// Delivery counters for one reporter. Relaxed atomics, readable while the
/// reporter runs.
#[derive(Debug, Default)]
pub struct ReporterStats {
    ticks: AtomicU64,
    attempts: AtomicU64,
    deliveries: AtomicU64,
    retries: AtomicU64,
    failed_ticks: AtomicU64,
}

impl ReporterStats {
    /// Interval ticks that started a delivery cycle.
    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::Relaxed)
    }

    /// Individual sink calls, retries included.
    pub fn attempts(&self) -> u64 {
        self.attempts.load(Ordering::Relaxed)
    }

    /// Ticks whose payload reached the sink.
    pub fn deliveries(&self) -> u64 {
        self.deliveries.load(Ordering::Relaxed)
    }

    /// Re-attempts after a transient failure.
    pub fn retries(&self) -> u64 {
        self.retries.load(Ordering::Relaxed)
    }

    /// Ticks whose payload was dropped after the retry policy ran out, the
    /// snapshot failed to encode, or shutdown abandoned the delivery.
    pub fn failed_ticks(&self) -> u64 {
        self.failed_ticks.load(Ordering::Relaxed)
    }
}

pub(crate) struct Reporter {
    cfg: ReporterConfig,
    /// Global filter conjoined with the reporter's own.
    filter: MetricFilter,
    sink: Arc<dyn Sink>,
    builder: SnapshotBuilder,
    registry: Arc<MetricRegistry>,
    stats: Arc<ReporterStats>,
}

impl Reporter {
    pub(crate) fn new(
        cfg: ReporterConfig,
        filter: MetricFilter,
        sink: Arc<dyn Sink>,
        builder: SnapshotBuilder,
        registry: Arc<MetricRegistry>,
        stats: Arc<ReporterStats>,
    ) -> Self {
        Self {
            cfg,
            filter,
            sink,
            builder,
            registry,
            stats,
        }
    }

    /// Run until the shutdown signal flips. Each interval tick is one
    /// delivery cycle; a cycle that fails is dropped and never carries over
    /// into the next tick.
    pub(crate) async fn run(self, mut shutdown: watch::Receiver<bool>, grace: Duration) {
        let mut tick = tokio::time::interval(self.cfg.interval());
        tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // the first interval tick completes immediately; swallow it so the
        // first report goes out one full interval after start
        tick.tick().await;

        tracing::info!(
            reporter = %self.cfg.name,
            sink = self.sink.name(),
            interval_ms = self.cfg.interval_ms,
            endpoint = self.cfg.endpoint.as_deref().unwrap_or("-"),
            "reporter started"
        );

        loop {
            tokio::select! {
                _ = shutdown.changed() => break,
                _ = tick.tick() => {}
            }
            self.stats.ticks.fetch_add(1, Ordering::Relaxed);

            let payload = match self.prepare() {
                Ok(p) => p,
                Err(e) => {
                    self.stats.failed_ticks.fetch_add(1, Ordering::Relaxed);
                    tracing::warn!(reporter = %self.cfg.name, error = %e, "snapshot encode failed");
                    continue;
                }
            };

            let delivered = self.deliver(payload);
            tokio::pin!(delivered);
            tokio::select! {
                res = &mut delivered => self.finish_tick(res),
                _ = shutdown.changed() => {
                    // bounded grace for the in-flight delivery, then abandon
                    match tokio::time::timeout(grace, &mut delivered).await {
                        Ok(res) => self.finish_tick(res),
                        Err(_) => {
                            self.stats.failed_ticks.fetch_add(1, Ordering::Relaxed);
                            tracing::warn!(
                                reporter = %self.cfg.name,
                                grace_ms = grace.as_millis() as u64,
                                "shutdown grace elapsed, delivery abandoned"
                            );
                        }
                    }
                    break;
                }
            }
        }

        tracing::info!(reporter = %self.cfg.name, "reporter stopped");
    }

    /// Snapshot, filter, encode. Runs once per tick; retries reuse the
    /// resulting payload instead of re-reading the registry.
    fn prepare(&self) -> Result<EncodedSnapshot> {
        let snapshot = self.builder.build(&self.registry);
        let filtered = self.filter.apply(&snapshot);
        encode::encode(&filtered, self.cfg.format)
    }

    /// Deliver with a per-attempt timeout and exponential backoff across
    /// attempts. Resolves to the final outcome once the policy is exhausted
    /// or a permanent error shows up.
    async fn deliver(&self, payload: EncodedSnapshot) -> Result<()> {
        let attempt = || {
            let payload = payload.clone();
            async move {
                self.stats.attempts.fetch_add(1, Ordering::Relaxed);
                match tokio::time::timeout(self.cfg.send_timeout(), self.sink.send(payload)).await
                {
                    Ok(res) => res,
                    Err(_) => Err(VitalsError::Timeout(self.cfg.send_timeout_ms)),
                }
            }
        };

        attempt
            .retry(self.cfg.retry.backoff())
            .when(VitalsError::is_transient)
            .notify(|err, delay| {
                self.stats.retries.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(
                    reporter = %self.cfg.name,
                    sink = self.sink.name(),
                    error = %err,
                    retry_in_ms = delay.as_millis() as u64,
                    "delivery failed, retrying"
                );
            })
            .await
    }

    fn finish_tick(&self, res: Result<()>) {
        match res {
            Ok(()) => {
                self.stats.deliveries.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(reporter = %self.cfg.name, "snapshot delivered");
            }
            Err(e) => {
                self.stats.failed_ticks.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(
                    reporter = %self.cfg.name,
                    sink = self.sink.name(),
                    error = %e,
                    "delivery failed, dropping this tick's snapshot"
                );
            }
        }
    }
}
