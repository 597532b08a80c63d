//! Scheduler shutdown semantics on the paused clock.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]


use std::sync::Arc;
use std::time::Duration;

use mock_sinks::SlowSink;

use vitals_core::identity::MetricId;
use vitals_relay::config::{ReporterConfig, SchedulerConfig};
use vitals_relay::registry::MetricRegistry;
use vitals_relay::report::ReportScheduler;
use vitals_relay::sink::MemorySink;

fn reporter(name: &str, interval_ms: u64) -> ReporterConfig {
    let mut cfg = ReporterConfig::new(name);
    cfg.interval_ms = interval_ms;
    cfg
}

#[tokio::test(start_paused = true)]
async fn shutdown_stops_idle_reporters_immediately() {
    let registry = Arc::new(MetricRegistry::new());
    registry.counter(MetricId::new("req.count")).unwrap().inc();

    let sink = Arc::new(MemorySink::new(16));
    let scheduler = ReportScheduler::spawn(
        Arc::clone(&registry),
        SchedulerConfig::default(),
        vec![(reporter("mem", 1000), Arc::clone(&sink) as _)],
    )
    .unwrap();

    tokio::time::sleep(Duration::from_millis(1500)).await;
    let before = tokio::time::Instant::now();
    scheduler.shutdown().await;
    // no delivery in flight: nothing to wait a grace period for
    assert!(before.elapsed() < Duration::from_millis(100));

    // timers are gone; no further payloads ever arrive
    let delivered = sink.len();
    assert_eq!(delivered, 1);
    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(sink.len(), delivered);
}

#[tokio::test(start_paused = true)]
async fn in_flight_delivery_finishes_inside_the_grace() {
    let registry = Arc::new(MetricRegistry::new());
    registry.counter(MetricId::new("req.count")).unwrap().inc();

    // delivery takes 500ms; shutdown lands mid-flight with a 2s grace
    let sink = Arc::new(SlowSink::new(Duration::from_millis(500)));
    let scheduler = ReportScheduler::spawn(
        Arc::clone(&registry),
        SchedulerConfig::default(),
        vec![(reporter("slow", 1000), Arc::clone(&sink) as _)],
    )
    .unwrap();

    tokio::time::sleep(Duration::from_millis(1200)).await;
    scheduler.shutdown().await;

    assert_eq!(sink.delivered().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn stuck_delivery_is_abandoned_after_the_grace() {
    let registry = Arc::new(MetricRegistry::new());
    registry.counter(MetricId::new("req.count")).unwrap().inc();

    let sink = Arc::new(SlowSink::new(Duration::from_secs(300)));
    let cfg = SchedulerConfig {
        shutdown_grace_ms: 2000,
        ..SchedulerConfig::default()
    };
    let scheduler = ReportScheduler::spawn(
        Arc::clone(&registry),
        cfg,
        vec![(reporter("stuck", 1000), Arc::clone(&sink) as _)],
    )
    .unwrap();

    tokio::time::sleep(Duration::from_millis(1200)).await;
    let before = tokio::time::Instant::now();
    let stats = scheduler.stats("stuck").unwrap();
    scheduler.shutdown().await;

    // bounded by the grace, nowhere near the sink's 300s
    let waited = before.elapsed();
    assert!(waited >= Duration::from_millis(1900));
    assert!(waited < Duration::from_secs(10));
    assert_eq!(stats.deliveries(), 0);
    assert_eq!(stats.failed_ticks(), 1);
    assert!(sink.delivered().is_empty());
}

#[tokio::test(start_paused = true)]
async fn shutdown_covers_every_reporter() {
    let registry = Arc::new(MetricRegistry::new());
    registry.counter(MetricId::new("req.count")).unwrap().inc();

    let fast = Arc::new(MemorySink::new(16));
    let slow = Arc::new(SlowSink::new(Duration::from_secs(300)));
    let cfg = SchedulerConfig {
        shutdown_grace_ms: 1000,
        ..SchedulerConfig::default()
    };
    let scheduler = ReportScheduler::spawn(
        Arc::clone(&registry),
        cfg,
        vec![
            (reporter("fast", 1000), Arc::clone(&fast) as _),
            (reporter("slow", 1500), Arc::clone(&slow) as _),
        ],
    )
    .unwrap();
    assert_eq!(scheduler.reporter_count(), 2);

    tokio::time::sleep(Duration::from_millis(1600)).await;
    scheduler.shutdown().await;

    // fast delivered its tick; slow was abandoned at the grace boundary
    assert_eq!(fast.len(), 1);
    assert!(slow.delivered().is_empty());
}
