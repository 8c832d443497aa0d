// SPDX-License-Identifier: MIT

use super::*;
use crate::build::BuildId;

#[test]
fn new_job_starts_pending_with_zero_repairs() {
    let job = Job::new(BuildId::new(), "workflow", 3, Utc::now());
    assert_eq!(job.status, JobStatus::Pending);
    assert_eq!(job.repair_attempts, 0);
    assert!(job.can_repair());
}

#[test]
fn repair_attempts_exhaust_at_max() {
    let mut job = Job::new(BuildId::new(), "workflow", 2, Utc::now());
    job.begin_repair();
    assert_eq!(job.repair_attempts, 1);
    assert!(job.can_repair());

    job.begin_repair();
    assert_eq!(job.repair_attempts, 2);
    assert!(!job.can_repair());
}

#[test]
fn start_then_finish_computes_duration() {
    let mut job = Job::new(BuildId::new(), "workflow", 3, Utc::now());
    let t0 = Utc::now();
    job.start(t0);
    assert_eq!(job.status, JobStatus::Running);

    let t1 = t0 + chrono::Duration::seconds(5);
    job.finish(JobStatus::Success, None, t1);
    assert_eq!(job.status, JobStatus::Success);
    assert!(job.status.is_terminal());
    assert_eq!(job.duration_seconds, Some(5.0));
}

#[test]
fn finish_failed_records_error_message() {
    let mut job = Job::new(BuildId::new(), "workflow", 3, Utc::now());
    job.start(Utc::now());
    job.finish(JobStatus::Failed, Some("build step failed".into()), Utc::now());
    assert_eq!(job.status, JobStatus::Failed);
    assert_eq!(job.error_message.as_deref(), Some("build step failed"));
}

#[test]
fn job_status_round_trips_through_str() {
    for s in ["pending", "running", "success", "failed", "cancelled"] {
        let parsed: JobStatus = s.parse().unwrap();
        assert_eq!(parsed.to_string(), s);
    }
}
