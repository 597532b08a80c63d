//! vitals relay demo.
//!
//! Simulates a small HTTP-ish workload, reports it to stdout on an interval,
//! and evaluates a couple of health checks alongside:
//! - counters/timers per route, a queue-depth gauge with a live provider
//! - one text reporter with a filter, shut down gracefully on ctrl-c

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{fmt, EnvFilter};

use vitals_core::encode::SnapshotFormat;
use vitals_core::filter::MetricFilter;
use vitals_core::identity::MetricId;
use vitals_relay::collect::SnapshotBuilder;
use vitals_relay::config::{ReporterConfig, SchedulerConfig};
use vitals_relay::health::{CheckStatus, HealthRegistry};
use vitals_relay::registry::MetricRegistry;
use vitals_relay::report::ReportScheduler;
use vitals_relay::sink::ConsoleSink;

#[tokio::main]
async fn main() {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let registry = Arc::new(MetricRegistry::new());
    let queue_depth = Arc::new(AtomicI64::new(0));

    registry
        .gauge(MetricId::new("queue.depth"))
        .expect("fresh registry")
        .set_provider({
            let queue_depth = Arc::clone(&queue_depth);
            move || queue_depth.load(Ordering::Relaxed) as f64
        });

    for (route, pace_ms) in [("/users", 140u64), ("/orders", 260), ("/search", 90)] {
        let registry = Arc::clone(&registry);
        let queue_depth = Arc::clone(&queue_depth);
        tokio::spawn(async move {
            let hits = registry
                .counter(MetricId::new("http.requests").with_tag("route", route))
                .expect("fresh registry");
            let errors = registry
                .counter(MetricId::new("http.errors").with_tag("route", route))
                .expect("fresh registry");
            let latency = registry
                .timer(MetricId::new("http.latency").with_tag("route", route))
                .expect("fresh registry");
            let throughput = registry
                .meter(MetricId::new("http.throughput"))
                .expect("fresh registry");

            let mut i: u64 = 0;
            loop {
                i += 1;
                queue_depth.fetch_add(1, Ordering::Relaxed);
                let scope = latency.time();
                tokio::time::sleep(Duration::from_millis(pace_ms / 4 + i % 23)).await;
                scope.stop();
                queue_depth.fetch_sub(1, Ordering::Relaxed);

                hits.inc();
                throughput.mark();
                if i % 17 == 0 {
                    errors.inc();
                }
                tokio::time::sleep(Duration::from_millis(pace_ms)).await;
            }
        });
    }

    let mut console = ReporterConfig::new("console");
    console.interval_ms = 5000;
    console.format = SnapshotFormat::Text;
    let scheduler_cfg = SchedulerConfig {
        // keep the demo's own plumbing out of its report
        global_filter: MetricFilter::Not {
            filter: Box::new(MetricFilter::StartsWith {
                prefix: "internal.".into(),
            }),
        },
        ..SchedulerConfig::default()
    };
    let scheduler = ReportScheduler::spawn(
        Arc::clone(&registry),
        scheduler_cfg,
        vec![(console, Arc::new(ConsoleSink))],
    )
    .expect("reporter config is valid");

    let health = Arc::new(HealthRegistry::new());
    health.counter_max(
        "error-budget-users",
        MetricId::new("http.errors").with_tag("route", "/users"),
        500.0,
    );
    health.gauge_max("queue-depth", MetricId::new("queue.depth"), 50.0);

    {
        let registry = Arc::clone(&registry);
        let health = Arc::clone(&health);
        tokio::spawn(async move {
            let builder = SnapshotBuilder::new();
            let mut tick = tokio::time::interval(Duration::from_secs(15));
            tick.tick().await;
            loop {
                tick.tick().await;
                let snap = builder.build(&registry);
                for result in health.run(&snap) {
                    if result.status == CheckStatus::Fail {
                        tracing::warn!(
                            check = %result.name,
                            observed = ?result.observed,
                            "health check failing"
                        );
                    }
                }
                tracing::info!(healthy = health.healthy(&snap), "health evaluated");
            }
        });
    }

    tracing::info!("vitals-relay demo running, ctrl-c to stop");
    tokio::signal::ctrl_c().await.expect("ctrl-c handler");
    tracing::info!("shutting down");
    scheduler.shutdown().await;
}
