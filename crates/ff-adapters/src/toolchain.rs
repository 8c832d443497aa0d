// SPDX-License-Identifier: MIT

//! Toolchain adapter (C4): wraps the embedded build tool (`idf.py`-style
//! invocations), the flashing tool, the simulator, and a doctor diagnostic
//! pass, plus file helpers used by the QA repair handler to read and patch
//! source files without shelling out.

use crate::subprocess::{run_with_timeout, BUILD_TIMEOUT, DOCTOR_TIMEOUT, FLASH_TIMEOUT, SIMULATOR_STARTUP};
use std::path::Path;
use tokio::process::Command;

#[derive(Debug, Clone, Default)]
pub struct BuildResult {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
    pub artifacts_path: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct FlashResult {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

#[derive(Debug, Clone, Default)]
pub struct SimulationResult {
    pub success: bool,
    pub log: String,
    pub passed_checks: u32,
    pub failed_checks: u32,
}

#[derive(Debug, Clone, Default)]
pub struct DoctorReport {
    pub healthy: bool,
    pub issues: Vec<String>,
}

/// Stateless wrapper over the embedded toolchain's CLI surface.
#[derive(Debug, Clone, Default)]
pub struct ToolchainAdapter;

impl ToolchainAdapter {
    pub fn new() -> Self {
        Self
    }

    /// Lists entry names at the project root, for the setup handler's
    /// build-manifest presence check.
    pub async fn list_root(&self, project_path: &Path) -> Result<Vec<String>, String> {
        let mut entries = tokio::fs::read_dir(project_path).await.map_err(|e| e.to_string())?;
        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(|e| e.to_string())? {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        Ok(names)
    }

    pub async fn set_target(&self, project_path: &Path, chip: &str) -> Result<(), String> {
        let mut cmd = Command::new("idf.py");
        cmd.current_dir(project_path).args(["set-target", chip]);
        match run_with_timeout(cmd, DOCTOR_TIMEOUT, "idf.py set-target").await {
            Ok(output) if output.status.success() => Ok(()),
            Ok(output) => Err(stderr_or(&output, "remote command failed")),
            Err(e) => Err(e.to_string()),
        }
    }

    pub async fn build(&self, project_path: &Path) -> BuildResult {
        let mut cmd = Command::new("idf.py");
        cmd.current_dir(project_path).arg("build");
        match run_with_timeout(cmd, BUILD_TIMEOUT, "idf.py build").await {
            Ok(output) => BuildResult {
                success: output.status.success(),
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
                artifacts_path: output
                    .status
                    .success()
                    .then(|| project_path.join("build").to_string_lossy().into_owned()),
            },
            Err(e) => BuildResult { success: false, stderr: e.to_string(), ..Default::default() },
        }
    }

    pub async fn flash(&self, project_path: &Path, port: &str) -> FlashResult {
        let mut cmd = Command::new("idf.py");
        cmd.current_dir(project_path).args(["-p", port, "flash"]);
        match run_with_timeout(cmd, FLASH_TIMEOUT, "idf.py flash").await {
            Ok(output) => FlashResult {
                success: output.status.success(),
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            },
            Err(e) => FlashResult { success: false, stderr: e.to_string(), ..Default::default() },
        }
    }

    /// Starts the simulator, waits out its startup window, then collects
    /// whatever it wrote to stdout before exiting.
    pub async fn run_simulation(&self, project_path: &Path, binary: &str) -> SimulationResult {
        let mut cmd = Command::new("qemu-system-xtensa");
        cmd.current_dir(project_path).args(["-nographic", "-kernel", binary]);
        tokio::time::sleep(SIMULATOR_STARTUP).await;
        match run_with_timeout(cmd, BUILD_TIMEOUT, "simulator").await {
            Ok(output) => {
                let log = String::from_utf8_lossy(&output.stdout).into_owned();
                let passed_checks = log.matches("[PASS]").count() as u32;
                let failed_checks = log.matches("[FAIL]").count() as u32;
                SimulationResult { success: output.status.success() && failed_checks == 0, log, passed_checks, failed_checks }
            }
            Err(e) => SimulationResult { success: false, log: e.to_string(), ..Default::default() },
        }
    }

    /// Runs the toolchain's own environment diagnostic (`idf.py doctor`).
    /// Healthy iff no "error" substring (case-insensitive) appears in its
    /// output — a heuristic, not an exit-code contract with the toolchain.
    pub async fn doctor(&self, project_path: &Path) -> DoctorReport {
        let mut cmd = Command::new("idf.py");
        cmd.current_dir(project_path).arg("doctor");
        match run_with_timeout(cmd, DOCTOR_TIMEOUT, "idf.py doctor").await {
            Ok(output) => {
                let combined = format!(
                    "{}{}",
                    String::from_utf8_lossy(&output.stdout),
                    String::from_utf8_lossy(&output.stderr)
                );
                let issues: Vec<String> = combined
                    .lines()
                    .filter(|l| l.to_lowercase().contains("error"))
                    .map(str::to_string)
                    .collect();
                DoctorReport { healthy: issues.is_empty(), issues }
            }
            Err(e) => DoctorReport { healthy: false, issues: vec![e.to_string()] },
        }
    }

    /// Reads a source file relative to the project root for the repair
    /// handler to inspect before asking the language model for a fix.
    pub async fn read_file(&self, project_path: &Path, relative_path: &str) -> Result<String, String> {
        tokio::fs::read_to_string(project_path.join(relative_path)).await.map_err(|e| e.to_string())
    }

    /// Overwrites a source file with model-proposed contents.
    pub async fn write_file(&self, project_path: &Path, relative_path: &str, contents: &str) -> Result<(), String> {
        let full_path = project_path.join(relative_path);
        if let Some(parent) = full_path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| e.to_string())?;
        }
        tokio::fs::write(full_path, contents).await.map_err(|e| e.to_string())
    }
}

fn stderr_or(output: &std::process::Output, fallback: &str) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let trimmed = stderr.trim();
    if trimmed.is_empty() {
        fallback.to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
#[path = "toolchain_tests.rs"]
mod tests;
