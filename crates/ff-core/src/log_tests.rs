// SPDX-License-Identifier: MIT

use super::*;
use crate::build::BuildId;
use crate::job::JobId;

#[test]
fn new_log_carries_fields() {
    let log = Log::new(LogLevel::Info, "starting build", Utc::now());
    assert!(log.build_id.is_none());
    assert!(log.job_id.is_none());
    assert_eq!(log.level, LogLevel::Info);
    assert_eq!(log.message, "starting build");
}

#[test]
fn with_build_and_job_attach_references() {
    let build_id = BuildId::new();
    let job_id = JobId::new();
    let log = Log::new(LogLevel::Error, "compile failed", Utc::now())
        .with_build(build_id)
        .with_job(job_id);
    assert_eq!(log.build_id, Some(build_id));
    assert_eq!(log.job_id, Some(job_id));
}

#[test]
fn log_level_orders_by_severity() {
    assert!(LogLevel::Debug < LogLevel::Info);
    assert!(LogLevel::Info < LogLevel::Warning);
    assert!(LogLevel::Warning < LogLevel::Error);
    assert!(LogLevel::Error < LogLevel::Success);
}

#[test]
fn log_level_round_trips_through_str() {
    for s in ["debug", "info", "warning", "error", "success"] {
        let parsed: LogLevel = s.parse().unwrap();
        assert_eq!(parsed.to_string(), s);
    }
}

#[test]
fn log_level_rejects_unknown() {
    assert!("trace".parse::<LogLevel>().is_err());
}
