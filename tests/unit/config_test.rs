//! Tests for configuration validation

use std::time::Duration;

use work_dispatch::config::{DispatchConfig, QueueBackendConfig};

fn valid() -> DispatchConfig {
    DispatchConfig {
        job_limit: 5,
        emission_interval_secs: 1.0,
        initial_delay_secs: 0.0,
        worker_count: 2,
        queue_capacity: 2,
        max_job_duration_secs: 120.0,
        shutdown_grace_secs: Some(5.0),
        queue: QueueBackendConfig::InMemory,
    }
}

#[test]
fn test_dispatch_config_validation() {
    assert!(valid().validate().is_ok());
}

#[test]
fn test_invalid_job_limit() {
    let invalid = DispatchConfig {
        job_limit: 0,
        ..valid()
    };
    assert!(invalid.validate().is_err());
}

#[test]
fn test_invalid_interval() {
    for interval in [0.0, -1.0] {
        let invalid = DispatchConfig {
            emission_interval_secs: interval,
            ..valid()
        };
        assert!(invalid.validate().is_err(), "interval {interval} accepted");
    }
}

#[test]
fn test_invalid_initial_delay() {
    let invalid = DispatchConfig {
        initial_delay_secs: -0.5,
        ..valid()
    };
    assert!(invalid.validate().is_err());
}

#[test]
fn test_invalid_worker_count() {
    let invalid = DispatchConfig {
        worker_count: 0,
        ..valid()
    };
    assert!(invalid.validate().is_err());
}

#[test]
fn test_invalid_queue_capacity() {
    let invalid = DispatchConfig {
        queue_capacity: 0,
        ..valid()
    };
    assert!(invalid.validate().is_err());
}

#[test]
fn test_invalid_grace_period() {
    let invalid = DispatchConfig {
        shutdown_grace_secs: Some(0.0),
        ..valid()
    };
    assert!(invalid.validate().is_err());
}

#[test]
fn test_empty_stream_name_rejected() {
    let invalid = DispatchConfig {
        queue: QueueBackendConfig::File {
            dir: "/tmp".into(),
            stream: " ".into(),
        },
        ..valid()
    };
    assert!(invalid.validate().is_err());
}

#[test]
fn test_dispatch_config_from_json() {
    let json = r#"{
        "job_limit": 5,
        "emission_interval_secs": 0.5,
        "initial_delay_secs": 1.0,
        "worker_count": 2,
        "queue_capacity": 2,
        "max_job_duration_secs": 120.0,
        "shutdown_grace_secs": 10.0,
        "queue": "in_memory"
    }"#;

    let config = DispatchConfig::from_json_str(json).unwrap();
    assert_eq!(config.job_limit, 5);
    assert_eq!(config.schedule().interval, Duration::from_millis(500));
    assert_eq!(config.shutdown_grace(), Some(Duration::from_secs(10)));
}

#[test]
fn test_dispatch_config_from_json_rejects_invalid() {
    assert!(DispatchConfig::from_json_str(r#"{ "worker_count": 0 }"#).is_err());
    assert!(DispatchConfig::from_json_str("not json").is_err());
}
