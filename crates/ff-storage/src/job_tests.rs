// SPDX-License-Identifier: MIT

use super::*;
use crate::test_support::test_store;
use ff_core::build::{Build, TriggerOrigin};
use ff_core::project::Project;
use std::path::PathBuf;

async fn seed_build(store: &crate::Store) -> BuildId {
    let project = Project::new(
        "firmware",
        "https://git.example.com/acme/firmware.git",
        "acme/firmware",
        "main",
        PathBuf::from("/tmp/acme-firmware"),
        "esp32",
        "cmake",
        chrono::Utc::now(),
    );
    store.projects.insert(&project).await.unwrap();
    let build = Build::new(project.id, "abc123", "main", TriggerOrigin::Webhook);
    store.builds.insert(&build).await.unwrap();
    build.id
}

#[tokio::test]
async fn insert_then_get_round_trips() {
    let store = test_store().await;
    let build_id = seed_build(&store).await;
    let job = Job::new(build_id, "workflow", 3, chrono::Utc::now());
    store.jobs.insert(&job).await.unwrap();

    let fetched = store.jobs.get(job.id).await.unwrap();
    assert_eq!(fetched.build_id, build_id);
    assert_eq!(fetched.status, JobStatus::Pending);
    assert_eq!(fetched.max_repair_attempts, 3);
}

#[tokio::test]
async fn update_persists_repair_attempts() {
    let store = test_store().await;
    let build_id = seed_build(&store).await;
    let mut job = Job::new(build_id, "workflow", 3, chrono::Utc::now());
    store.jobs.insert(&job).await.unwrap();

    job.begin_repair();
    store.jobs.update(&job).await.unwrap();

    let fetched = store.jobs.get(job.id).await.unwrap();
    assert_eq!(fetched.repair_attempts, 1);
}

#[tokio::test]
async fn get_for_build_returns_latest() {
    let store = test_store().await;
    let build_id = seed_build(&store).await;
    let job = Job::new(build_id, "workflow", 3, chrono::Utc::now());
    store.jobs.insert(&job).await.unwrap();

    let fetched = store.jobs.get_for_build(build_id).await.unwrap();
    assert_eq!(fetched.unwrap().id, job.id);
}
