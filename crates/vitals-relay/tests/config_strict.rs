#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use vitals_core::encode::SnapshotFormat;
use vitals_core::filter::MetricFilter;
use vitals_relay::config::{ReporterConfig, RetryPolicy, SchedulerConfig};

#[test]
fn deny_unknown_fields_nested() {
    let bad = r#"{
        "name": "graphite",
        "interval_ms": 5000,
        "retry": { "max_attemps": 3 }
    }"#;
    assert!(serde_json::from_str::<ReporterConfig>(bad).is_err());

    let bad_top = r#"{ "name": "graphite", "intervalms": 5000 }"#;
    assert!(serde_json::from_str::<ReporterConfig>(bad_top).is_err());
}

#[test]
fn minimal_reporter_config_fills_defaults() {
    let cfg: ReporterConfig = serde_json::from_str(r#"{ "name": "graphite" }"#).expect("must parse");
    assert_eq!(cfg.name, "graphite");
    assert_eq!(cfg.interval_ms, 5000);
    assert_eq!(cfg.send_timeout_ms, 10000);
    assert_eq!(cfg.format, SnapshotFormat::Json);
    assert_eq!(cfg.filter, MetricFilter::All);
    assert_eq!(cfg.retry, RetryPolicy::default());
    cfg.validate().expect("defaults must validate");
}

#[test]
fn full_reporter_config_round_trips() {
    let doc = r#"{
        "name": "edge",
        "endpoint": "http://influx.internal:8086",
        "interval_ms": 10000,
        "send_timeout_ms": 2000,
        "format": "text",
        "filter": { "type": "starts_with", "prefix": "req" },
        "retry": { "max_attempts": 5, "base_delay_ms": 50, "max_delay_ms": 1000 }
    }"#;
    let cfg: ReporterConfig = serde_json::from_str(doc).expect("must parse");
    cfg.validate().expect("must validate");
    assert_eq!(cfg.endpoint.as_deref(), Some("http://influx.internal:8086"));
    assert_eq!(cfg.retry.max_attempts, 5);

    let json = serde_json::to_string(&cfg).unwrap();
    let back: ReporterConfig = serde_json::from_str(&json).unwrap();
    assert_eq!(cfg, back);
}

#[test]
fn out_of_range_values_fail_validation() {
    let mut cfg = ReporterConfig::new("fast");
    cfg.interval_ms = 10;
    assert!(cfg.validate().is_err());

    let mut cfg = ReporterConfig::new("");
    cfg.interval_ms = 5000;
    assert!(cfg.validate().is_err());

    let mut cfg = ReporterConfig::new("empty-endpoint");
    cfg.endpoint = Some(String::new());
    assert!(cfg.validate().is_err());

    let retry = RetryPolicy {
        max_attempts: 0,
        ..RetryPolicy::default()
    };
    assert!(retry.validate().is_err());

    let retry = RetryPolicy {
        base_delay_ms: 500,
        max_delay_ms: 100,
        ..RetryPolicy::default()
    };
    assert!(retry.validate().is_err());
}

#[test]
fn scheduler_config_defaults_and_ranges() {
    let cfg: SchedulerConfig = serde_json::from_str("{}").expect("must parse");
    assert_eq!(cfg.shutdown_grace_ms, 2000);
    assert_eq!(cfg.global_filter, MetricFilter::All);
    assert!(!cfg.reset.counters);
    cfg.validate().expect("defaults must validate");

    let cfg = SchedulerConfig {
        shutdown_grace_ms: 5,
        ..SchedulerConfig::default()
    };
    assert!(cfg.validate().is_err());
}

#[test]
fn reset_policy_rejects_unknown_fields() {
    let bad = r#"{ "reset": { "counters": true, "gauges": true } }"#;
    assert!(serde_json::from_str::<SchedulerConfig>(bad).is_err());
}
