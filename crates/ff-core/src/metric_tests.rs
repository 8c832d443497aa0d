// SPDX-License-Identifier: MIT

use super::*;
use crate::agent::AgentId;

#[test]
fn new_metric_carries_fields() {
    let metric = Metric::new("binary_size_bytes", 128_450.0, Utc::now());
    assert_eq!(metric.metric_type, "binary_size_bytes");
    assert_eq!(metric.value, 128_450.0);
    assert!(metric.agent_id.is_none());
}

#[test]
fn with_agent_attaches_reference() {
    let agent_id = AgentId::new();
    let metric = Metric::new("tests_passed", 12.0, Utc::now()).with_agent(agent_id);
    assert_eq!(metric.agent_id, Some(agent_id));
}
