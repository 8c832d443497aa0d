// SPDX-License-Identifier: MIT

//! Bootstrap configuration, read from the environment the same way the
//! teacher's daemon reads its own startup env (`env.rs`): plain
//! `std::env::var` lookups with a documented fallback, no config file
//! format or parser crate.

use std::net::SocketAddr;
use std::path::PathBuf;

/// Everything `run` needs to wire up C10-C12. Each field mirrors one of
/// the environment variables called out in the external interfaces.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub bind_addr: SocketAddr,
    pub projects_base_dir: PathBuf,
    pub static_dir: Option<PathBuf>,
    pub llm_base_url: String,
    pub llm_api_key: String,
    pub llm_model: String,
    pub max_repair_iterations: u32,
}

impl Config {
    /// Read configuration from the process environment, applying the same
    /// fallbacks a default local run would need.
    pub fn from_env() -> Self {
        Self {
            database_url: std::env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://ffoundry.db".to_string()),
            bind_addr: std::env::var("BIND_ADDR")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or_else(|| "0.0.0.0:8080".parse().expect("valid default bind address")),
            projects_base_dir: std::env::var("PROJECTS_BASE_DIR").map(PathBuf::from).unwrap_or_else(|_| PathBuf::from("./projects")),
            static_dir: std::env::var("STATIC_DIR").ok().map(PathBuf::from),
            llm_base_url: std::env::var("LLM_BASE_URL").unwrap_or_else(|_| "https://api.openai.com/v1".to_string()),
            llm_api_key: std::env::var("LLM_API_KEY").unwrap_or_default(),
            llm_model: std::env::var("LLM_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string()),
            max_repair_iterations: std::env::var("MAX_REPAIR_ITERATIONS").ok().and_then(|s| s.parse().ok()).unwrap_or(3),
        }
    }
}
