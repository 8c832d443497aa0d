// SPDX-License-Identifier: MIT

//! Bookkeeping records for the named role slots that participate in a
//! workflow run. This is distinct from the runtime task/handler machinery
//! in [`crate::task`] — an `Agent` here is a row describing who exists and
//! whether they are currently busy, not a unit of scheduled work; the
//! engine's scheduling does not consume these records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

crate::define_id! {
    /// Unique identifier for an agent record.
    pub struct AgentId("agt-");
}

/// The role slot an agent occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentType {
    Builder,
    Developer,
    Tester,
    Doctor,
    Qa,
    ProjectManager,
}

crate::simple_display! {
    AgentType {
        Builder => "builder",
        Developer => "developer",
        Tester => "tester",
        Doctor => "doctor",
        Qa => "qa",
        ProjectManager => "project_manager",
    }
}

#[derive(Debug, Error)]
#[error("invalid agent type: {0}")]
pub struct ParseAgentTypeError(pub String);

impl FromStr for AgentType {
    type Err = ParseAgentTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "builder" => Ok(Self::Builder),
            "developer" => Ok(Self::Developer),
            "tester" => Ok(Self::Tester),
            "doctor" => Ok(Self::Doctor),
            "qa" => Ok(Self::Qa),
            "project_manager" => Ok(Self::ProjectManager),
            other => Err(ParseAgentTypeError(other.to_string())),
        }
    }
}

/// Current activity status of an agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentStatus {
    Idle,
    Active,
    Error,
}

crate::simple_display! {
    AgentStatus {
        Idle => "idle",
        Active => "active",
        Error => "error",
    }
}

/// A named participant in the workflow, with a display name and current
/// activity status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Agent {
    pub id: AgentId,
    pub name: String,
    pub agent_type: AgentType,
    pub status: AgentStatus,
    pub last_active_at: Option<DateTime<Utc>>,
}

impl Agent {
    pub fn new(name: impl Into<String>, agent_type: AgentType) -> Self {
        Self {
            id: AgentId::new(),
            name: name.into(),
            agent_type,
            status: AgentStatus::Idle,
            last_active_at: None,
        }
    }

    pub fn mark_active(&mut self, now: DateTime<Utc>) {
        self.status = AgentStatus::Active;
        self.last_active_at = Some(now);
    }

    pub fn mark_idle(&mut self, now: DateTime<Utc>) {
        self.status = AgentStatus::Idle;
        self.last_active_at = Some(now);
    }

    pub fn mark_error(&mut self, now: DateTime<Utc>) {
        self.status = AgentStatus::Error;
        self.last_active_at = Some(now);
    }
}

/// The six default agents seeded on startup, one per [`AgentType`].
pub fn default_agents() -> Vec<Agent> {
    vec![
        Agent::new("builder", AgentType::Builder),
        Agent::new("developer", AgentType::Developer),
        Agent::new("tester", AgentType::Tester),
        Agent::new("doctor", AgentType::Doctor),
        Agent::new("qa", AgentType::Qa),
        Agent::new("project_manager", AgentType::ProjectManager),
    ]
}

#[cfg(test)]
#[path = "agent_tests.rs"]
mod tests;
