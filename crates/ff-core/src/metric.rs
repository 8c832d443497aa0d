// SPDX-License-Identifier: MIT

//! Time-stamped numeric samples (binary size, flash usage, queue depth, ...).

use crate::agent::AgentId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

crate::define_id! {
    /// Unique identifier for a stored metric sample.
    pub struct MetricId("met-");
}

/// A single named, type-tagged measurement, optionally attributed to the
/// agent that produced it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Metric {
    pub id: MetricId,
    pub metric_type: String,
    pub value: f64,
    pub agent_id: Option<AgentId>,
    pub recorded_at: DateTime<Utc>,
}

impl Metric {
    pub fn new(metric_type: impl Into<String>, value: f64, now: DateTime<Utc>) -> Self {
        Self { id: MetricId::new(), metric_type: metric_type.into(), value, agent_id: None, recorded_at: now }
    }

    pub fn with_agent(mut self, agent_id: AgentId) -> Self {
        self.agent_id = Some(agent_id);
        self
    }
}

#[cfg(test)]
#[path = "metric_tests.rs"]
mod tests;
