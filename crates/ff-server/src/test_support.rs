// SPDX-License-Identifier: MIT

//! Route-test harness: an in-memory, fully-migrated store wired into a
//! real router, driven via `tower::ServiceExt::oneshot` rather than a
//! bound socket.

use std::path::PathBuf;

use axum::Router;

use crate::config::Config;
use crate::state::AppState;

fn test_config() -> Config {
    Config {
        database_url: "sqlite::memory:".to_string(),
        bind_addr: "127.0.0.1:0".parse().expect("valid loopback address"),
        projects_base_dir: PathBuf::from("/tmp/ffoundry-test-projects"),
        static_dir: None,
        llm_base_url: "https://example.invalid/v1".to_string(),
        llm_api_key: "test-key".to_string(),
        llm_model: "test-model".to_string(),
        max_repair_iterations: 1,
    }
}

pub async fn test_app() -> Router {
    let store = ff_storage::test_support::test_store().await;
    store.agents.seed_defaults().await.expect("seed default agents");
    let state = AppState::new(store, test_config());
    state.start_bus().expect("start event bus");
    crate::router(state)
}
