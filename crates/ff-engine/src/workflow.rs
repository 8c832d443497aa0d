// SPDX-License-Identifier: MIT

//! Workflow engine (C7): builds the fixed task DAG for one build, then
//! drives it to completion with the sequential-then-parallel readiness
//! scheduler and the bounded QA repair loop described alongside this
//! module.

use crate::bus::EventBus;
use crate::handlers::{self, HandlerContext, Issue};
use ff_core::{AgentType, Clock, Event, EventKind, JobId, LogLevel, Task, WorkflowState};
use indexmap::IndexMap;
use std::path::PathBuf;
use tokio::task::JoinSet;

/// Result of one `execute_workflow` call.
#[derive(Debug, Clone)]
pub struct WorkflowResult {
    pub success: bool,
    pub phases: Vec<String>,
    pub qa_iterations: u32,
    pub artifacts: IndexMap<String, serde_json::Value>,
}

fn build_plan(state: &mut WorkflowState, flash_device: bool, run_qemu: bool) {
    state.insert_task(Task::new("setup_project", AgentType::ProjectManager, "validate_structure", vec![], false));
    state.insert_task(Task::new("set_target", AgentType::ProjectManager, "set_target", vec!["setup_project".into()], false));
    state.insert_task(Task::new("build_firmware", AgentType::Builder, "compile_cache", vec!["set_target".into()], false));

    let mut terminal_deps = Vec::new();
    if flash_device {
        state.insert_task(Task::new("flash_device", AgentType::Tester, "flash_hardware", vec!["build_firmware".into()], true));
        terminal_deps.push("flash_device".to_string());
    }
    if run_qemu {
        state.insert_task(Task::new("run_simulation", AgentType::Tester, "start_simulator", vec!["build_firmware".into()], true));
        terminal_deps.push("run_simulation".to_string());
    }
    // With neither flash nor simulation requested, 6/7 still gate on the
    // build itself rather than becoming trivially ready up front.
    if terminal_deps.is_empty() {
        terminal_deps.push("build_firmware".to_string());
    }

    state.insert_task(Task::new("hardware_check", AgentType::Doctor, "diagnostics", terminal_deps.clone(), true));
    state.insert_task(Task::new("qa_analysis", AgentType::Qa, "analyze_results", terminal_deps, true));
}

/// Dispatch one task's action to its handler. `qa_tasks` carries the
/// issue list forward to `fix_issues_*` tasks appended by the repair
/// loop — ordinary plan tasks never populate it.
async fn run_handler(
    ctx: &HandlerContext,
    state: &WorkflowState,
    task_id: &str,
    pending_issues: Option<&[Issue]>,
) -> Result<serde_json::Value, String> {
    let action = state.tasks.get(task_id).map(|t| t.action.as_str()).unwrap_or_default();
    match action {
        "validate_structure" => handlers::validate_structure(ctx, state).await,
        "set_target" => handlers::set_target(ctx, state).await,
        "compile_cache" => handlers::compile_cache(ctx, state).await,
        "flash_hardware" => handlers::flash_hardware(ctx, state).await,
        "start_simulator" => handlers::start_simulator(ctx, state).await,
        "diagnostics" => handlers::diagnostics(ctx, state).await,
        "analyze_results" => {
            let (passed, issues) = handlers::analyze_results(state);
            Ok(serde_json::json!({ "success": passed, "issues": issues, "passed": passed }))
        }
        "fix_issues" => {
            let issues = pending_issues.unwrap_or_default();
            handlers::fix_issues(ctx, state, issues).await
        }
        other => Err(format!("no handler registered for action {other}")),
    }
}

async fn emit(bus: &EventBus, kind: EventKind, clock: &impl Clock) {
    if bus.publish(Event::new(kind, clock.utc_now())).await.is_err() {
        tracing::warn!("event bus rejected publish; dispatcher may not have started");
    }
}

/// Runs one task to completion, mutating `state` in place and emitting
/// its progress/log events. Shared by both the sequential and the
/// parallel execution paths below.
async fn execute_one(
    ctx: &HandlerContext,
    bus: &EventBus,
    clock: &impl Clock,
    job_id: &JobId,
    state: &mut WorkflowState,
    task_id: String,
    pending_issues: Option<Vec<Issue>>,
) {
    let now = clock.utc_now();
    let from = state.tasks[&task_id].state;
    state.tasks.get_mut(&task_id).unwrap().start(now);
    state.record_transition(&task_id, from, ff_core::TaskState::InProgress, now);

    emit(bus, EventKind::WorkflowPhaseStarted { job_id: job_id.clone(), phase: task_id.clone() }, clock).await;
    emit(bus, EventKind::JobProgress { job_id: job_id.clone(), task_name: task_id.clone(), progress: 0 }, clock).await;
    emit(bus, EventKind::LogEntry { level: LogLevel::Info, message: format!("starting {task_id}") }, clock).await;

    let result = run_handler(ctx, state, &task_id, pending_issues.as_deref()).await;

    let now = clock.utc_now();
    let from = state.tasks[&task_id].state;
    let success = match &result {
        Ok(value) => {
            let explicit_success = value.get("success").and_then(|v| v.as_bool());
            explicit_success.unwrap_or(true)
        }
        Err(_) => false,
    };

    match result {
        Ok(value) if success => {
            state.artifacts.insert(artifact_key(&task_id), value.clone());
            state.tasks.get_mut(&task_id).unwrap().complete(value);
            state.record_transition(&task_id, from, ff_core::TaskState::Completed, now);
            emit(bus, EventKind::LogEntry { level: LogLevel::Success, message: format!("{task_id} completed") }, clock)
                .await;
        }
        Ok(value) => {
            let error = value.get("success").map(|_| "handler reported failure".to_string()).unwrap_or_default();
            state.artifacts.insert(artifact_key(&task_id), value);
            state.tasks.get_mut(&task_id).unwrap().fail(error.clone());
            state.record_transition(&task_id, from, ff_core::TaskState::Failed, now);
            emit(bus, EventKind::LogEntry { level: LogLevel::Error, message: format!("{task_id} failed: {error}") }, clock)
                .await;
        }
        Err(error) => {
            state.tasks.get_mut(&task_id).unwrap().fail(error.clone());
            state.record_transition(&task_id, from, ff_core::TaskState::Failed, now);
            emit(bus, EventKind::LogEntry { level: LogLevel::Error, message: format!("{task_id} failed: {error}") }, clock)
                .await;
        }
    }

    emit(bus, EventKind::JobProgress { job_id: job_id.clone(), task_name: task_id.clone(), progress: 100 }, clock).await;
    let phase_success = state.tasks[&task_id].state == ff_core::TaskState::Completed;
    emit(
        bus,
        EventKind::WorkflowPhaseCompleted { job_id: job_id.clone(), phase: task_id.clone(), success: phase_success },
        clock,
    )
    .await;
}

/// A `retest_n`'s own re-simulation step, appended ahead of it so QA
/// re-checks fresh simulator output rather than the pre-fix run.
fn is_resimulate_task(task_id: &str) -> bool {
    task_id.starts_with("retest_") && task_id.ends_with("_resimulate")
}

/// `build_firmware` writes `state.artifacts["build"]`; everything else
/// writes under its own task id so QA can read `qemu_output` etc.
fn artifact_key(task_id: &str) -> String {
    match task_id {
        "build_firmware" => "build".to_string(),
        id if id.starts_with("rebuild_") => "build".to_string(),
        "run_simulation" => "qemu_output_full".to_string(),
        id if is_resimulate_task(id) => "qemu_output_full".to_string(),
        id => id.to_string(),
    }
}

/// After a completed `compile_cache`/`analyze_results`/`start_simulator`
/// task, some artifacts live under a derived key (`qemu_output` is
/// flattened out of the simulator's structured result so the QA handler
/// can read it as a plain string).
fn post_process_artifacts(state: &mut WorkflowState, task_id: &str) {
    if task_id == "run_simulation" || is_resimulate_task(task_id) {
        if let Some(value) = state.artifacts.get("qemu_output_full").cloned() {
            if let Some(output) = value.get("qemu_output").and_then(|v| v.as_str()) {
                state.artifacts.insert("qemu_output".to_string(), serde_json::Value::String(output.to_string()));
            }
        }
    }
}

fn extract_issues(state: &WorkflowState, qa_task_id: &str) -> Vec<Issue> {
    state
        .artifacts
        .get(qa_task_id)
        .and_then(|v| v.get("issues"))
        .and_then(|v| serde_json::from_value::<Vec<Issue>>(v.clone()).ok())
        .unwrap_or_default()
}

/// Runs the full DAG — including every repair iteration appended along
/// the way — to a terminal state.
pub async fn execute_workflow(
    ctx: HandlerContext,
    bus: EventBus,
    clock: impl Clock,
    project_path: PathBuf,
    target_chip: String,
    flash_device: bool,
    run_qemu: bool,
    job_id: JobId,
    max_repair_iterations: u32,
) -> WorkflowResult {
    let mut state = WorkflowState::new(project_path, target_chip, max_repair_iterations);
    build_plan(&mut state, flash_device, run_qemu);
    let mut phases = Vec::new();

    loop {
        let ready = state.ready_tasks();
        if ready.is_empty() {
            break;
        }

        let (sequential, parallel): (Vec<String>, Vec<String>) =
            ready.into_iter().partition(|id| !state.tasks[id].parallel_eligible);

        for task_id in sequential {
            let issues = pending_issues_for(&state, &task_id);
            phases.push(task_id.clone());
            execute_one(&ctx, &bus, &clock, &job_id, &mut state, task_id.clone(), issues).await;
            post_process_artifacts(&mut state, &task_id);
        }

        if !parallel.is_empty() {
            let base_history_len = state.history.len();
            let mut join_set: JoinSet<(String, WorkflowState)> = JoinSet::new();
            for task_id in &parallel {
                let ctx = ctx.clone();
                let bus = bus.clone();
                let clock = clock.clone();
                let job_id = job_id.clone();
                let mut task_state = state.clone();
                let task_id = task_id.clone();
                let issues = pending_issues_for(&state, &task_id);
                join_set.spawn(async move {
                    execute_one(&ctx, &bus, &clock, &job_id, &mut task_state, task_id.clone(), issues).await;
                    post_process_artifacts(&mut task_state, &task_id);
                    (task_id, task_state)
                });
            }
            while let Some(joined) = join_set.join_next().await {
                if let Ok((task_id, task_state)) = joined {
                    phases.push(task_id.clone());
                    merge_parallel_result(&mut state, &task_state, &task_id, base_history_len);
                }
            }
        }

        if state.tasks.contains_key("qa_analysis") && state.tasks["qa_analysis"].state.is_terminal() {
            maybe_append_repair_cycle(&mut state, "qa_analysis");
        }
        for n in 1..=state.repair_iterations {
            let retest_id = format!("retest_{n}");
            if state.tasks.contains_key(&retest_id) && state.tasks[&retest_id].state.is_terminal() {
                maybe_append_repair_cycle(&mut state, &retest_id);
            }
        }
    }

    let success = workflow_succeeded(&state);
    WorkflowResult { success, phases, qa_iterations: state.repair_iterations, artifacts: state.artifacts }
}

/// A QA check node is superseded once a later repair iteration exists:
/// `qa_analysis` once any repair ran, and each `retest_n`/`retest_n_resimulate`
/// once `n` is below the current iteration count. Its recorded `Failed` state
/// only meant "found issues, repair triggered" and must not block overall
/// success once the chain it kicked off produced a later, decisive retest.
fn is_superseded_qa_node(task_id: &str, repair_iterations: u32) -> bool {
    if repair_iterations == 0 {
        return false;
    }
    if task_id == "qa_analysis" {
        return true;
    }
    let Some(rest) = task_id.strip_prefix("retest_") else {
        return false;
    };
    let n_str = rest.strip_suffix("_resimulate").unwrap_or(rest);
    n_str.parse::<u32>().is_ok_and(|n| n < repair_iterations)
}

/// Whole-workflow success: every task reached `Completed`, except QA check
/// nodes that a later retest in the same repair chain has superseded.
fn workflow_succeeded(state: &WorkflowState) -> bool {
    state
        .tasks
        .iter()
        .all(|(id, task)| is_superseded_qa_node(id, state.repair_iterations) || task.state == ff_core::TaskState::Completed)
}

fn pending_issues_for(state: &WorkflowState, task_id: &str) -> Option<Vec<Issue>> {
    if !task_id.starts_with("fix_issues_") {
        return None;
    }
    let n = task_id.trim_start_matches("fix_issues_");
    let qa_source = if n == "1" { "qa_analysis".to_string() } else { format!("retest_{}", n.parse::<u32>().unwrap_or(1) - 1) };
    Some(extract_issues(state, &qa_source))
}

/// Folds one parallel-group task's outcome (and the artifact it wrote)
/// back into the shared `state` after it ran against its own cloned copy.
fn merge_parallel_result(state: &mut WorkflowState, task_state: &WorkflowState, task_id: &str, base_history_len: usize) {
    if let Some(task) = task_state.tasks.get(task_id) {
        state.tasks.insert(task_id.to_string(), task.clone());
    }
    let key = artifact_key(task_id);
    if let Some(value) = task_state.artifacts.get(&key) {
        state.artifacts.insert(key, value.clone());
    }
    if task_id == "run_simulation" {
        if let Some(value) = task_state.artifacts.get("qemu_output") {
            state.artifacts.insert("qemu_output".to_string(), value.clone());
        }
    }
    // `task_state` was cloned from `state` as it stood before this
    // parallel batch was spawned, so everything past `base_history_len`
    // is exactly this task's own two new transitions.
    if task_state.history.len() > base_history_len {
        state.history.extend_from_slice(&task_state.history[base_history_len..]);
    }
}

/// Whether `qa_task_id` is still the QA check that decides the *next*
/// repair iteration — `qa_analysis` before any repair has started, then
/// only the most recent `retest_n`. The execute_workflow loop re-checks
/// every terminal QA task on every tick, so without this a `qa_analysis`
/// that stays `Failed` forever would otherwise keep re-triggering once
/// `repair_iterations` has already moved past it.
fn is_current_repair_source(state: &WorkflowState, qa_task_id: &str) -> bool {
    if state.repair_iterations == 0 {
        qa_task_id == "qa_analysis"
    } else {
        qa_task_id == format!("retest_{}", state.repair_iterations)
    }
}

/// When a QA task finished with `passed=false` and the repair bound has
/// not been reached, append the next `fix_issues_n`/`rebuild_n`/
/// `retest_n` triple to the plan.
fn maybe_append_repair_cycle(state: &mut WorkflowState, qa_task_id: &str) {
    if !is_current_repair_source(state, qa_task_id) {
        return;
    }

    let passed = state
        .artifacts
        .get(qa_task_id)
        .and_then(|v| v.get("passed"))
        .and_then(|v| v.as_bool())
        .unwrap_or(true);
    if passed || !state.can_repair() {
        return;
    }

    let n = state.repair_iterations + 1;
    let fix_id = format!("fix_issues_{n}");
    let rebuild_id = format!("rebuild_{n}");
    let retest_id = format!("retest_{n}");
    if state.tasks.contains_key(&fix_id) {
        return;
    }

    state.repair_iterations = n;
    state.insert_task(Task::new(&fix_id, AgentType::Developer, "fix_issues", vec![], false));
    state.insert_task(Task::new(&rebuild_id, AgentType::Builder, "compile_cache", vec![fix_id], false));

    // Only re-run the simulator ahead of the retest if the plan actually
    // simulates at all; a build-only run has nothing to re-simulate.
    let retest_prereq = if state.tasks.contains_key("run_simulation") {
        let resimulate_id = format!("retest_{n}_resimulate");
        state.insert_task(Task::new(&resimulate_id, AgentType::Tester, "start_simulator", vec![rebuild_id.clone()], false));
        resimulate_id
    } else {
        rebuild_id
    };
    state.insert_task(Task::new(&retest_id, AgentType::Qa, "analyze_results", vec![retest_prereq], false));
}

#[cfg(test)]
#[path = "workflow_tests.rs"]
mod tests;
