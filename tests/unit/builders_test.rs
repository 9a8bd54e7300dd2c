//! Tests for builder modules

use std::sync::Arc;

use work_dispatch::builders::{build_dispatcher, build_queue};
use work_dispatch::config::{DispatchConfig, QueueBackendConfig};
use work_dispatch::core::{
    DispatchError, DispatchPhase, Job, JobQueue, NullAuditSink, QueueError, SimulatedWork,
};

#[test]
fn test_build_in_memory_queue() {
    let config = DispatchConfig {
        queue_capacity: 3,
        ..DispatchConfig::default()
    };

    let queue = build_queue(&config).unwrap();
    assert_eq!(queue.capacity(), 3);
    assert!(queue.is_empty());
    assert!(!queue.is_closed());
}

#[test]
fn test_build_file_queue_recovers_journal() {
    let dir = tempfile::tempdir().unwrap();
    let config = DispatchConfig {
        queue_capacity: 4,
        queue: QueueBackendConfig::File {
            dir: dir.path().to_path_buf(),
            stream: "default-queue".into(),
        },
        ..DispatchConfig::default()
    };

    {
        let queue = build_queue(&config).unwrap();
        queue.enqueue(Job::new(1, 0.0).unwrap()).unwrap();
        queue.enqueue(Job::new(2, 0.0).unwrap()).unwrap();
    }

    let queue = build_queue(&config).unwrap();
    assert_eq!(queue.len(), 2);
    assert_eq!(queue.dequeue().unwrap().sequence(), 1);
}

#[test]
fn test_build_queue_rejects_invalid_config() {
    let config = DispatchConfig {
        queue_capacity: 0,
        ..DispatchConfig::default()
    };
    assert!(matches!(
        build_queue(&config),
        Err(DispatchError::InvalidConfiguration(_))
    ));
}

#[test]
fn test_build_queue_reports_unreadable_journal() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("broken.jsonl"), "{ not a job }\n").unwrap();
    let config = DispatchConfig {
        queue: QueueBackendConfig::File {
            dir: dir.path().to_path_buf(),
            stream: "broken".into(),
        },
        ..DispatchConfig::default()
    };
    assert!(matches!(
        build_queue(&config),
        Err(DispatchError::Queue(QueueError::Backend(_)))
    ));
}

#[test]
fn test_build_dispatcher() {
    let dispatcher =
        build_dispatcher(DispatchConfig::default(), SimulatedWork, Arc::new(NullAuditSink))
            .unwrap();
    let handle = dispatcher.shutdown_handle();
    assert_eq!(handle.phase(), DispatchPhase::Created);
    assert!(!handle.is_shutdown());
}
