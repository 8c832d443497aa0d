// SPDX-License-Identifier: MIT

//! Agent action handlers (inside C7, §4.3). Each is a pure(-ish) async
//! function over the shared `ff_adapters` handles and the current
//! `WorkflowState`'s artifacts map; handlers never touch the database —
//! that's the build orchestrator's job once the run settles.

use ff_adapters::{LlmAdapter, RepositoryManager, ToolchainAdapter};
use ff_core::WorkflowState;
use serde::{Deserialize, Serialize};
use serde_json::json;

/// The build manifest file whose presence in the project root proves the
/// clone is a buildable firmware project.
pub(crate) const BUILD_MANIFEST: &str = "CMakeLists.txt";

/// Output the happy-path simulator is expected to print; its absence is
/// treated as a functional regression by the QA handler.
const EXPECTED_SIMULATOR_MARKER: &str = "Hello World";

/// Everything a handler might reach for. Owned and cheaply `Clone` (the
/// adapters are all stateless or wrap an `Arc`-backed client) so the
/// scheduler can hand an independent copy to each concurrently spawned
/// parallel-group task. `repo` is unused by most handlers (the clone is
/// already in place by the time C7 runs) but is kept here so a future
/// handler can re-sync without threading a new parameter through every
/// call site.
#[derive(Debug, Clone)]
pub struct HandlerContext {
    pub toolchain: ToolchainAdapter,
    pub llm: LlmAdapter,
    #[allow(dead_code)]
    pub repo: RepositoryManager,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Issue {
    pub severity: String,
    pub component: String,
    pub message: String,
    pub file: Option<String>,
}

pub async fn validate_structure(ctx: &HandlerContext, state: &WorkflowState) -> Result<serde_json::Value, String> {
    let entries = ctx.toolchain.list_root(&state.project_path).await?;
    if entries.iter().any(|e| e == BUILD_MANIFEST) {
        Ok(json!({ "success": true, "manifest": BUILD_MANIFEST }))
    } else {
        Err(format!("missing build manifest {BUILD_MANIFEST}"))
    }
}

pub async fn set_target(ctx: &HandlerContext, state: &WorkflowState) -> Result<serde_json::Value, String> {
    ctx.toolchain.set_target(&state.project_path, &state.target_chip).await?;
    Ok(json!({ "success": true, "target": state.target_chip }))
}

pub async fn compile_cache(ctx: &HandlerContext, state: &WorkflowState) -> Result<serde_json::Value, String> {
    let result = ctx.toolchain.build(&state.project_path).await;
    if result.success {
        Ok(json!({
            "success": true,
            "artifacts_path": result.artifacts_path,
            "stdout": result.stdout,
        }))
    } else {
        Err(result.stderr)
    }
}

pub async fn flash_hardware(ctx: &HandlerContext, state: &WorkflowState) -> Result<serde_json::Value, String> {
    let port = std::env::var("FLASH_PORT").unwrap_or_else(|_| "/dev/ttyUSB0".to_string());
    let result = ctx.toolchain.flash(&state.project_path, &port).await;
    if result.success {
        Ok(json!({ "success": true, "stdout": result.stdout }))
    } else {
        Err(result.stderr)
    }
}

pub async fn start_simulator(ctx: &HandlerContext, state: &WorkflowState) -> Result<serde_json::Value, String> {
    let binary = state
        .artifacts
        .get("build")
        .and_then(|v| v.get("artifacts_path"))
        .and_then(|v| v.as_str())
        .unwrap_or("build/firmware.elf")
        .to_string();
    let result = ctx.toolchain.run_simulation(&state.project_path, &binary).await;
    let tail: String = result.log.lines().rev().take(200).collect::<Vec<_>>().into_iter().rev().collect::<Vec<_>>().join("\n");
    Ok(json!({ "success": result.success, "qemu_output": tail }))
}

pub async fn diagnostics(ctx: &HandlerContext, state: &WorkflowState) -> Result<serde_json::Value, String> {
    let report = ctx.toolchain.doctor(&state.project_path).await;
    Ok(json!({ "success": report.healthy, "issues": report.issues }))
}

/// QA analysis. Inspects build and simulator artifacts already collected
/// on `state`, not anything it fetches itself — this is why it takes
/// `&WorkflowState` rather than `&HandlerContext`.
pub fn analyze_results(state: &WorkflowState) -> (bool, Vec<Issue>) {
    let mut issues = Vec::new();

    if let Some(build) = state.artifacts.get("build") {
        if build.get("success").and_then(|v| v.as_bool()) == Some(false) {
            issues.push(Issue {
                severity: "high".to_string(),
                component: "build".to_string(),
                message: "build did not succeed".to_string(),
                file: None,
            });
        }
    }

    if let Some(qemu_output) = state.artifacts.get("qemu_output").and_then(|v| v.as_str()) {
        if !qemu_output.contains(EXPECTED_SIMULATOR_MARKER) {
            issues.push(Issue {
                severity: "high".to_string(),
                component: "application".to_string(),
                message: format!("simulator output missing expected marker \"{EXPECTED_SIMULATOR_MARKER}\""),
                file: Some("main/main.c".to_string()),
            });
        }
        let lower = qemu_output.to_lowercase();
        if lower.contains("error") || lower.contains("abort") {
            issues.push(Issue {
                severity: "critical".to_string(),
                component: "application".to_string(),
                message: "simulator output contains an error/abort marker".to_string(),
                file: Some("main/main.c".to_string()),
            });
        }
    }

    (issues.is_empty(), issues)
}

/// Repair handler (developer). Asks the language model to fix each issue
/// that names a file, writes back whichever proposed fixes are non-empty.
pub async fn fix_issues(
    ctx: &HandlerContext,
    state: &WorkflowState,
    issues: &[Issue],
) -> Result<serde_json::Value, String> {
    let mut applied = Vec::new();
    let mut skipped = Vec::new();

    for issue in issues {
        let Some(file) = &issue.file else {
            skipped.push(issue.message.clone());
            continue;
        };
        let contents = match ctx.toolchain.read_file(&state.project_path, file).await {
            Ok(contents) => contents,
            Err(e) => {
                skipped.push(format!("{file}: {e}"));
                continue;
            }
        };
        let fix = match ctx.llm.propose_fix(file, &contents, &issue.message).await {
            Ok(fix) => fix,
            Err(e) => {
                skipped.push(format!("{file}: {e}"));
                continue;
            }
        };
        if fix.fixed_code.trim().is_empty() {
            skipped.push(format!("{file}: model returned no fix"));
            continue;
        }
        ctx.toolchain.write_file(&state.project_path, file, &fix.fixed_code).await?;
        applied.push(json!({
            "file": file,
            "diagnosis": fix.diagnosis,
            "changes": fix.changes,
            "confidence": fix.confidence,
        }));
    }

    Ok(json!({ "success": !applied.is_empty(), "applied": applied, "skipped": skipped }))
}

#[cfg(test)]
#[path = "handlers_tests.rs"]
mod tests;
