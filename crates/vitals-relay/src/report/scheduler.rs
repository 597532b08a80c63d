//! Owns the reporter tasks and the shared shutdown signal.

use std::sync::Arc;

use futures_util::future::join_all;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use vitals_core::error::{Result, VitalsError};

use crate::collect::SnapshotBuilder;
use crate::config::{ReporterConfig, SchedulerConfig};
use crate::registry::MetricRegistry;
use crate::report::reporter::{Reporter, ReporterStats};
use crate::sink::Sink;

/// Periodic report scheduler.
///
/// Spawns one independent task per reporter so a slow or failing sink never
/// delays the others, and ties them all to one watch-channel shutdown signal.
/// Reset-on-read happens in the shared snapshot builder configured here, not
/// per reporter, so counted events are handed out exactly once no matter how
/// many reporters run.
#[derive(Debug)]
pub struct ReportScheduler {
    shutdown_tx: watch::Sender<bool>,
    tasks: Vec<JoinHandle<()>>,
    stats: Vec<(String, Arc<ReporterStats>)>,
}

impl ReportScheduler {
    /// Validate all configs, then spawn one task per `(config, sink)` pair.
    /// Nothing is spawned if any config is invalid.
    pub fn spawn(
        registry: Arc<MetricRegistry>,
        cfg: SchedulerConfig,
        reporters: Vec<(ReporterConfig, Arc<dyn Sink>)>,
    ) -> Result<Self> {
        cfg.validate()?;
        for (rc, _) in &reporters {
            rc.validate()?;
        }
        for (i, (a, _)) in reporters.iter().enumerate() {
            if reporters.iter().skip(i + 1).any(|(b, _)| a.name == b.name) {
                return Err(VitalsError::InvalidConfig(format!(
                    "duplicate reporter name `{}`",
                    a.name
                )));
            }
        }

        let builder = SnapshotBuilder::with_reset(cfg.reset);
        let grace = cfg.shutdown_grace();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let mut tasks = Vec::with_capacity(reporters.len());
        let mut stats = Vec::with_capacity(reporters.len());
        for (rc, sink) in reporters {
            let filter = cfg.global_filter.clone().and(rc.filter.clone());
            let st = Arc::new(ReporterStats::default());
            stats.push((rc.name.clone(), Arc::clone(&st)));
            let reporter = Reporter::new(
                rc,
                filter,
                sink,
                builder,
                Arc::clone(&registry),
                Arc::clone(&st),
            );
            tasks.push(tokio::spawn(reporter.run(shutdown_rx.clone(), grace)));
        }

        tracing::info!(reporters = tasks.len(), "report scheduler started");
        Ok(Self {
            shutdown_tx,
            tasks,
            stats,
        })
    }

    /// Number of running reporters.
    pub fn reporter_count(&self) -> usize {
        self.tasks.len()
    }

    /// Stats handle for one reporter.
    pub fn stats(&self, name: &str) -> Option<Arc<ReporterStats>> {
        self.stats
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, s)| Arc::clone(s))
    }

    /// Signal shutdown and wait for every reporter to wind down. Idle
    /// reporters stop at once; one in-flight delivery per reporter gets the
    /// configured grace.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(true);
        for res in join_all(self.tasks).await {
            if let Err(e) = res {
                tracing::error!(error = %e, "reporter task did not exit cleanly");
            }
        }
        tracing::info!("report scheduler stopped");
    }
}
