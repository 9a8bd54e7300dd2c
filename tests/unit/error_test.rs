//! Tests for error types

use work_dispatch::core::{DispatchError, JobError, JobFault, QueueError};

#[test]
fn test_queue_closed_error() {
    assert_eq!(format!("{}", QueueError::Closed), "queue closed");
}

#[test]
fn test_backend_error() {
    let err = QueueError::Backend("disk full".to_string());
    assert_eq!(format!("{}", err), "backend error: disk full");
}

#[test]
fn test_job_fault_error() {
    let err = JobFault::new(3, "bad input");
    assert_eq!(format!("{}", err), "job 3 failed: bad input");
}

#[test]
fn test_job_error() {
    assert_eq!(
        format!("{}", JobError::ZeroSequence),
        "sequence number must be at least 1"
    );
}

#[test]
fn test_dispatch_error_wraps_queue_error() {
    let err: DispatchError = QueueError::Backend("io".into()).into();
    assert_eq!(format!("{}", err), "backend error: io");

    let err = DispatchError::InvalidConfiguration("worker_count must be greater than 0".into());
    assert_eq!(
        format!("{}", err),
        "invalid configuration: worker_count must be greater than 0"
    );
}
