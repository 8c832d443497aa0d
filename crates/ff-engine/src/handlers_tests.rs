// SPDX-License-Identifier: MIT

use super::*;
use ff_adapters::RepositoryManager;
use std::path::PathBuf;
use wiremock::matchers::{method, path as wpath};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn state_with_artifacts(project_path: PathBuf, artifacts: serde_json::Value) -> WorkflowState {
    let mut state = WorkflowState::new(project_path, "esp32", 3);
    if let serde_json::Value::Object(map) = artifacts {
        for (k, v) in map {
            state.artifacts.insert(k, v);
        }
    }
    state
}

#[tokio::test]
async fn validate_structure_succeeds_when_manifest_present() {
    let tmp = tempfile::tempdir().unwrap();
    tokio::fs::write(tmp.path().join(BUILD_MANIFEST), b"project(demo)").await.unwrap();
    let toolchain = ToolchainAdapter::new();
    let llm = LlmAdapter::new("http://localhost", "key", "model");
    let repo = RepositoryManager::new();
    let ctx = HandlerContext { toolchain: toolchain.clone(), llm: llm.clone(), repo: repo.clone() };
    let state = WorkflowState::new(tmp.path().to_path_buf(), "esp32", 3);

    let result = validate_structure(&ctx, &state).await.unwrap();
    assert_eq!(result["success"], serde_json::json!(true));
}

#[tokio::test]
async fn validate_structure_fails_without_manifest() {
    let tmp = tempfile::tempdir().unwrap();
    let toolchain = ToolchainAdapter::new();
    let llm = LlmAdapter::new("http://localhost", "key", "model");
    let repo = RepositoryManager::new();
    let ctx = HandlerContext { toolchain: toolchain.clone(), llm: llm.clone(), repo: repo.clone() };
    let state = WorkflowState::new(tmp.path().to_path_buf(), "esp32", 3);

    let result = validate_structure(&ctx, &state).await;
    assert!(result.is_err());
}

#[test]
fn analyze_results_passes_with_no_issues() {
    let state = state_with_artifacts(
        PathBuf::from("/tmp/project"),
        serde_json::json!({
            "build": { "success": true },
            "qemu_output": "booting...\nHello World\nshutting down\n",
        }),
    );
    let (passed, issues) = analyze_results(&state);
    assert!(passed);
    assert!(issues.is_empty());
}

#[test]
fn analyze_results_flags_missing_marker() {
    let state = state_with_artifacts(
        PathBuf::from("/tmp/project"),
        serde_json::json!({
            "build": { "success": true },
            "qemu_output": "booting...\nshutting down\n",
        }),
    );
    let (passed, issues) = analyze_results(&state);
    assert!(!passed);
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].component, "application");
}

#[test]
fn analyze_results_flags_build_failure_and_error_substring() {
    let state = state_with_artifacts(
        PathBuf::from("/tmp/project"),
        serde_json::json!({
            "build": { "success": false },
            "qemu_output": "Hello World\nFATAL ERROR: stack overflow\n",
        }),
    );
    let (passed, issues) = analyze_results(&state);
    assert!(!passed);
    assert_eq!(issues.len(), 2);
}

#[tokio::test]
async fn fix_issues_writes_back_a_nonempty_proposed_fix() {
    let tmp = tempfile::tempdir().unwrap();
    tokio::fs::write(tmp.path().join("main.c"), b"int main(void) {}").await.unwrap();

    let server = MockServer::start().await;
    let reply = serde_json::json!({
        "diagnosis": "missing return",
        "fixed_code": "int main(void) { return 0; }",
        "changes": ["added return statement"],
        "confidence": 90,
    })
    .to_string();
    Mock::given(method("POST"))
        .and(wpath("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "choices": [{ "message": { "content": reply } }]
        })))
        .mount(&server)
        .await;

    let toolchain = ToolchainAdapter::new();
    let llm = LlmAdapter::new(server.uri(), "key", "model");
    let repo = RepositoryManager::new();
    let ctx = HandlerContext { toolchain: toolchain.clone(), llm: llm.clone(), repo: repo.clone() };
    let state = WorkflowState::new(tmp.path().to_path_buf(), "esp32", 3);

    let issues = vec![Issue {
        severity: "high".to_string(),
        component: "application".to_string(),
        message: "missing return".to_string(),
        file: Some("main.c".to_string()),
    }];

    let result = fix_issues(&ctx, &state, &issues).await.unwrap();
    assert_eq!(result["success"], serde_json::json!(true));

    let contents = tokio::fs::read_to_string(tmp.path().join("main.c")).await.unwrap();
    assert_eq!(contents, "int main(void) { return 0; }");
}

#[tokio::test]
async fn fix_issues_skips_issues_without_a_file() {
    let tmp = tempfile::tempdir().unwrap();
    let toolchain = ToolchainAdapter::new();
    let llm = LlmAdapter::new("http://localhost", "key", "model");
    let repo = RepositoryManager::new();
    let ctx = HandlerContext { toolchain: toolchain.clone(), llm: llm.clone(), repo: repo.clone() };
    let state = WorkflowState::new(tmp.path().to_path_buf(), "esp32", 3);

    let issues = vec![Issue {
        severity: "high".to_string(),
        component: "build".to_string(),
        message: "build did not succeed".to_string(),
        file: None,
    }];

    let result = fix_issues(&ctx, &state, &issues).await.unwrap();
    assert_eq!(result["success"], serde_json::json!(false));
}
