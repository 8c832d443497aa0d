// SPDX-License-Identifier: MIT

//! Bounded-timeout subprocess runner shared by every adapter. Arguments are
//! always passed as an argv vector — never `sh -c` string interpolation.

use std::time::Duration;
use tokio::process::Command;

pub const GIT_TIMEOUT: Duration = Duration::from_secs(300);
pub const BUILD_TIMEOUT: Duration = Duration::from_secs(600);
pub const FLASH_TIMEOUT: Duration = Duration::from_secs(120);
pub const SIMULATOR_STARTUP: Duration = Duration::from_secs(3);
pub const DOCTOR_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, thiserror::Error)]
pub enum SubprocessError {
    #[error("{label} timed out after {timeout:?}")]
    TimedOut { label: String, timeout: Duration },
    #[error("{label} failed to spawn: {source}")]
    Spawn { label: String, #[source] source: std::io::Error },
}

/// Run `cmd` to completion, killing it if it runs past `timeout`.
pub async fn run_with_timeout(
    mut cmd: Command,
    timeout: Duration,
    label: &str,
) -> Result<std::process::Output, SubprocessError> {
    cmd.kill_on_drop(true);
    match tokio::time::timeout(timeout, cmd.output()).await {
        Ok(Ok(output)) => Ok(output),
        Ok(Err(source)) => Err(SubprocessError::Spawn { label: label.to_string(), source }),
        Err(_) => Err(SubprocessError::TimedOut { label: label.to_string(), timeout }),
    }
}

#[cfg(test)]
#[path = "subprocess_tests.rs"]
mod tests;
