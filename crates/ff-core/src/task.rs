// SPDX-License-Identifier: MIT

//! In-memory task graph for one workflow run. These types never touch
//! storage — they live for the duration of a single `execute_workflow`
//! call and are assembled into the durable [`crate::build::Build`]/
//! [`crate::job::Job`] summary only once the run settles.

use crate::agent::AgentType;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Lifecycle state of one [`Task`] within a workflow run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    Pending,
    InProgress,
    Completed,
    Failed,
    Blocked,
}

impl TaskState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Blocked)
    }
}

crate::simple_display! {
    TaskState {
        Pending => "pending",
        InProgress => "in_progress",
        Completed => "completed",
        Failed => "failed",
        Blocked => "blocked",
    }
}

/// One node in the workflow DAG.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub role: AgentType,
    pub action: String,
    pub prerequisites: Vec<String>,
    pub state: TaskState,
    pub result: Option<serde_json::Value>,
    pub error: Option<String>,
    pub attempted_at: Option<DateTime<Utc>>,
    /// Whether this task may run concurrently with other parallel-marked
    /// tasks at the same readiness level.
    pub parallel_eligible: bool,
}

impl Task {
    pub fn new(
        id: impl Into<String>,
        role: AgentType,
        action: impl Into<String>,
        prerequisites: Vec<String>,
        parallel_eligible: bool,
    ) -> Self {
        Self {
            id: id.into(),
            role,
            action: action.into(),
            prerequisites,
            state: TaskState::Pending,
            result: None,
            error: None,
            attempted_at: None,
            parallel_eligible,
        }
    }

    /// True when every prerequisite in `tasks` has reached `completed`.
    pub fn is_ready(&self, tasks: &IndexMap<String, Task>) -> bool {
        self.state == TaskState::Pending
            && self
                .prerequisites
                .iter()
                .all(|dep| tasks.get(dep).is_some_and(|t| t.state == TaskState::Completed))
    }

    pub fn start(&mut self, now: DateTime<Utc>) {
        self.state = TaskState::InProgress;
        self.attempted_at = Some(now);
    }

    pub fn complete(&mut self, result: serde_json::Value) {
        self.state = TaskState::Completed;
        self.result = Some(result);
    }

    pub fn fail(&mut self, error: impl Into<String>) {
        self.state = TaskState::Failed;
        self.error = Some(error.into());
    }
}

/// One recorded state transition, kept for post-mortem inspection; see
/// `step_history` on the HTTP build-detail endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskEvent {
    pub task_id: String,
    pub from_state: TaskState,
    pub to_state: TaskState,
    pub at: DateTime<Utc>,
}

/// Everything owned by one `execute_workflow` call. Cheap enough to clone
/// wholesale when handing a read-only snapshot to a concurrently spawned
/// handler task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowState {
    pub project_path: PathBuf,
    pub target_chip: String,
    pub phase: String,
    pub tasks: IndexMap<String, Task>,
    pub artifacts: IndexMap<String, serde_json::Value>,
    pub repair_iterations: u32,
    pub max_repair_iterations: u32,
    pub history: Vec<TaskEvent>,
}

impl WorkflowState {
    pub fn new(project_path: PathBuf, target_chip: impl Into<String>, max_repair_iterations: u32) -> Self {
        Self {
            project_path,
            target_chip: target_chip.into(),
            phase: "initializing".to_string(),
            tasks: IndexMap::new(),
            artifacts: IndexMap::new(),
            repair_iterations: 0,
            max_repair_iterations,
            history: Vec::new(),
        }
    }

    pub fn insert_task(&mut self, task: Task) {
        self.tasks.insert(task.id.clone(), task);
    }

    /// Record a transition in insertion order, matching the teacher's
    /// append-only WAL idiom applied at workflow-run scope.
    pub fn record_transition(&mut self, task_id: &str, from: TaskState, to: TaskState, now: DateTime<Utc>) {
        self.history.push(TaskEvent { task_id: task_id.to_string(), from_state: from, to_state: to, at: now });
    }

    /// Tasks whose prerequisites are all satisfied, in plan insertion order.
    pub fn ready_tasks(&self) -> Vec<String> {
        self.tasks.values().filter(|t| t.is_ready(&self.tasks)).map(|t| t.id.clone()).collect()
    }

    pub fn can_repair(&self) -> bool {
        self.repair_iterations < self.max_repair_iterations
    }

    pub fn all_terminal(&self) -> bool {
        self.tasks.values().all(|t| t.state.is_terminal())
    }

    pub fn all_completed(&self) -> bool {
        self.tasks.values().all(|t| t.state == TaskState::Completed)
    }
}

#[cfg(test)]
#[path = "task_tests.rs"]
mod tests;
