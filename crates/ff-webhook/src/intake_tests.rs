// SPDX-License-Identifier: MIT

use super::*;
use ff_adapters::{LlmAdapter, ToolchainAdapter};
use ff_core::project::{Project, ProjectStatus};
use ff_core::webhook_event::ProcessingState;
use ff_core::FakeClock;
use ff_engine::{EventBus, HandlerContext};
use ff_storage::test_support::test_store;
use hmac::Mac;
use serde_json::json;
use sha2::Sha256;
use std::path::Path;
use tokio::process::Command;

type HmacSha256 = hmac::Hmac<Sha256>;

fn sign(secret: &str, body: &[u8]) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
    mac.update(body);
    format!("sha256={}", hex::encode(mac.finalize().into_bytes()))
}

async fn run_git(args: &[&str], cwd: &Path) {
    let status = Command::new("git").args(args).current_dir(cwd).status().await.unwrap();
    assert!(status.success(), "git {args:?} failed");
}

/// A real local clone so `RepositoryManager::update` has something to
/// fetch/reset against instead of failing with "not a repository".
async fn cloned_repo(tmp: &Path) -> std::path::PathBuf {
    let remote = tmp.join("remote");
    tokio::fs::create_dir_all(&remote).await.unwrap();
    run_git(&["init", "--initial-branch=main"], &remote).await;
    run_git(&["config", "user.email", "test@example.com"], &remote).await;
    run_git(&["config", "user.name", "Test"], &remote).await;
    tokio::fs::write(remote.join("README.md"), b"hello").await.unwrap();
    run_git(&["add", "README.md"], &remote).await;
    run_git(&["commit", "-m", "initial"], &remote).await;

    let local = tmp.join("local");
    RepositoryManager::new().clone(&remote.to_string_lossy(), &local, "main").await;
    local
}

async fn seed_project(store: &Store, clock: &FakeClock, clone_path: std::path::PathBuf, secret: Option<&str>) -> Project {
    let mut project = Project::new(
        "firmware",
        "https://git.example.com/acme/firmware.git",
        "acme/firmware",
        "main",
        clone_path,
        "esp32",
        "cmake",
        clock.utc_now(),
    );
    project.status = ProjectStatus::Active;
    project.webhook_secret = secret.map(str::to_string);
    store.projects.insert(&project).await.unwrap();
    project
}

fn intake(store: Store) -> WebhookIntake {
    let ctx = HandlerContext { toolchain: ToolchainAdapter::new(), llm: LlmAdapter::new("http://localhost:1", "key", "model"), repo: RepositoryManager::new() };
    let orchestrator = Orchestrator::new(store.clone(), EventBus::new(), ctx, 3);
    WebhookIntake::new(store, orchestrator)
}

fn push_payload(slug: &str) -> serde_json::Value {
    json!({
        "ref": "refs/heads/main",
        "after": "c0ffee",
        "repository": { "full_name": slug },
        "head_commit": { "message": "fix", "author": { "name": "Ada" } },
    })
}

#[tokio::test]
async fn rejects_an_invalid_signature_and_records_it() {
    let store = test_store().await;
    let clock = FakeClock::new();
    let tmp = tempfile::tempdir().unwrap();
    seed_project(&store, &clock, tmp.path().join("clone"), Some("shh")).await;

    let body = serde_json::to_vec(&push_payload("acme/firmware")).unwrap();
    let delivery = Delivery {
        event_type_header: "push".to_string(),
        delivery_id: "d1".to_string(),
        signature_header: Some("sha256=wrong".to_string()),
        raw_body: body,
    };

    let err = intake(store.clone()).handle_delivery(&clock, delivery).await.unwrap_err();
    assert!(matches!(err, IntakeError::InvalidSignature));

    let recorded = store.webhook_events.list_recent(10).await.unwrap();
    assert_eq!(recorded.len(), 1);
    assert_eq!(recorded[0].state, ProcessingState::Failed);
    assert!(!recorded[0].signature_valid);
}

#[tokio::test]
async fn accepts_a_correctly_signed_delivery() {
    let store = test_store().await;
    let clock = FakeClock::new();
    let tmp = tempfile::tempdir().unwrap();
    let clone_path = cloned_repo(tmp.path()).await;
    seed_project(&store, &clock, clone_path, Some("shh")).await;

    let body = serde_json::to_vec(&push_payload("acme/firmware")).unwrap();
    let header = sign("shh", &body);
    let delivery = Delivery {
        event_type_header: "push".to_string(),
        delivery_id: "d2".to_string(),
        signature_header: Some(header),
        raw_body: body,
    };

    let outcome = intake(store.clone()).handle_delivery(&clock, delivery).await.unwrap();
    assert!(outcome.triggered_build);

    let recorded = store.webhook_events.list_recent(10).await.unwrap();
    assert!(recorded[0].signature_valid);
}

#[tokio::test]
async fn a_push_to_a_known_project_dispatches_a_build() {
    let store = test_store().await;
    let clock = FakeClock::new();
    let tmp = tempfile::tempdir().unwrap();
    let clone_path = cloned_repo(tmp.path()).await;
    seed_project(&store, &clock, clone_path, None).await;

    let body = serde_json::to_vec(&push_payload("acme/firmware")).unwrap();
    let delivery =
        Delivery { event_type_header: "push".to_string(), delivery_id: "d3".to_string(), signature_header: None, raw_body: body };

    let outcome = intake(store.clone()).handle_delivery(&clock, delivery).await.unwrap();
    assert!(outcome.triggered_build);

    let recorded = store.webhook_events.list_recent(10).await.unwrap();
    assert_eq!(recorded[0].state, ProcessingState::Success);
    assert!(recorded[0].triggered_build_id.is_some());
}

#[tokio::test]
async fn ping_never_triggers_a_build_and_is_ignored() {
    let store = test_store().await;
    let clock = FakeClock::new();
    let tmp = tempfile::tempdir().unwrap();
    seed_project(&store, &clock, tmp.path().join("clone"), None).await;

    let delivery = Delivery {
        event_type_header: "ping".to_string(),
        delivery_id: "d4".to_string(),
        signature_header: None,
        raw_body: serde_json::to_vec(&json!({ "repository": { "full_name": "acme/firmware" } })).unwrap(),
    };

    let outcome = intake(store.clone()).handle_delivery(&clock, delivery).await.unwrap();
    assert!(!outcome.triggered_build);

    let recorded = store.webhook_events.list_recent(10).await.unwrap();
    assert_eq!(recorded[0].state, ProcessingState::Success);
}

#[tokio::test]
async fn a_pull_request_with_an_unlisted_action_does_not_trigger() {
    let store = test_store().await;
    let clock = FakeClock::new();
    let tmp = tempfile::tempdir().unwrap();
    seed_project(&store, &clock, tmp.path().join("clone"), None).await;

    let payload = json!({
        "action": "closed",
        "repository": { "full_name": "acme/firmware" },
        "pull_request": { "title": "x", "user": { "login": "ada" }, "head": { "ref": "feature", "sha": "abc" } },
    });
    let delivery = Delivery {
        event_type_header: "pull_request".to_string(),
        delivery_id: "d5".to_string(),
        signature_header: None,
        raw_body: serde_json::to_vec(&payload).unwrap(),
    };

    let outcome = intake(store.clone()).handle_delivery(&clock, delivery).await.unwrap();
    assert!(!outcome.triggered_build);
}

#[tokio::test]
async fn an_unknown_project_is_recorded_without_scheduling_work() {
    let store = test_store().await;
    let clock = FakeClock::new();

    let delivery = Delivery {
        event_type_header: "push".to_string(),
        delivery_id: "d6".to_string(),
        signature_header: None,
        raw_body: serde_json::to_vec(&push_payload("nobody/nothing")).unwrap(),
    };

    let outcome = intake(store.clone()).handle_delivery(&clock, delivery).await.unwrap();
    assert!(!outcome.triggered_build);

    let recorded = store.webhook_events.list_recent(10).await.unwrap();
    assert!(recorded[0].project_id.is_none());
    assert_eq!(recorded[0].state, ProcessingState::Success);
}

#[tokio::test]
async fn a_replayed_delivery_id_is_rejected_without_a_second_record() {
    let store = test_store().await;
    let clock = FakeClock::new();
    let tmp = tempfile::tempdir().unwrap();
    let clone_path = cloned_repo(tmp.path()).await;
    seed_project(&store, &clock, clone_path, None).await;

    let body = serde_json::to_vec(&push_payload("acme/firmware")).unwrap();
    let delivery = || Delivery {
        event_type_header: "push".to_string(),
        delivery_id: "d7".to_string(),
        signature_header: None,
        raw_body: body.clone(),
    };

    intake(store.clone()).handle_delivery(&clock, delivery()).await.unwrap();
    let err = intake(store.clone()).handle_delivery(&clock, delivery()).await.unwrap_err();
    assert!(matches!(err, IntakeError::DuplicateDelivery));

    assert_eq!(store.webhook_events.list_recent(10).await.unwrap().len(), 1);
}

#[tokio::test]
async fn two_deliveries_missing_a_delivery_id_are_each_rejected_rather_than_deduped_against_each_other() {
    let (store, clock, tmp) = test_store_with_clock().await;
    let clone_path = cloned_repo(tmp.path()).await;
    seed_project(&store, &clock, clone_path, None).await;

    let body = serde_json::to_vec(&push_payload("acme/firmware")).unwrap();
    let delivery = || Delivery {
        event_type_header: "push".to_string(),
        delivery_id: String::new(),
        signature_header: None,
        raw_body: body.clone(),
    };

    let first = intake(store.clone()).handle_delivery(&clock, delivery()).await.unwrap_err();
    assert!(matches!(first, IntakeError::MissingDeliveryId));
    let second = intake(store.clone()).handle_delivery(&clock, delivery()).await.unwrap_err();
    assert!(matches!(second, IntakeError::MissingDeliveryId));

    assert_eq!(store.webhook_events.list_recent(10).await.unwrap().len(), 0);
}
