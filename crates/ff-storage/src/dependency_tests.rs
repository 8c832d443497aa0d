// SPDX-License-Identifier: MIT

use super::*;
use crate::test_support::test_store;
use ff_core::project::Project;
use std::path::PathBuf;

async fn seed_project(store: &crate::Store) -> ProjectId {
    let project = Project::new(
        "firmware",
        "https://git.example.com/acme/firmware.git",
        "acme/firmware",
        "main",
        PathBuf::from("/tmp/acme-firmware"),
        "esp32",
        "cmake",
        Utc::now(),
    );
    store.projects.insert(&project).await.unwrap();
    project.id
}

#[tokio::test]
async fn insert_then_list_for_project() {
    let store = test_store().await;
    let project_id = seed_project(&store).await;
    let dep = Dependency::new(
        project_id,
        "led_strip",
        "^1.0",
        DependencySource::Registry { registry: "espressif".into() },
    );
    store.dependencies.insert(&dep).await.unwrap();

    let deps = store.dependencies.list_for_project(project_id).await.unwrap();
    assert_eq!(deps.len(), 1);
    assert_eq!(deps[0].component_name, "led_strip");
    assert!(!deps[0].installed);
}

#[tokio::test]
async fn mark_installed_clears_error_and_stamps_time() {
    let store = test_store().await;
    let project_id = seed_project(&store).await;
    let dep = Dependency::new(project_id, "wifi", "^2.0", DependencySource::parse_tag("git:https://x/y.git#main"));
    store.dependencies.insert(&dep).await.unwrap();
    store.dependencies.mark_install_failed(dep.id, "network timeout").await.unwrap();

    let now = Utc::now();
    store.dependencies.mark_installed(dep.id, now).await.unwrap();

    let deps = store.dependencies.list_for_project(project_id).await.unwrap();
    assert!(deps[0].installed);
    assert!(deps[0].last_install_error.is_none());
}

#[tokio::test]
async fn component_name_unique_per_project() {
    let store = test_store().await;
    let project_id = seed_project(&store).await;
    let dep = Dependency::new(project_id, "led_strip", "^1.0", DependencySource::Registry { registry: "a".into() });
    store.dependencies.insert(&dep).await.unwrap();

    let dup = Dependency::new(project_id, "led_strip", "^2.0", DependencySource::Registry { registry: "b".into() });
    assert!(store.dependencies.insert(&dup).await.is_err());
}

#[tokio::test]
async fn deleting_project_cascades_to_dependencies() {
    let store = test_store().await;
    let project_id = seed_project(&store).await;
    let dep = Dependency::new(project_id, "led_strip", "^1.0", DependencySource::Registry { registry: "a".into() });
    store.dependencies.insert(&dep).await.unwrap();

    store.projects.delete(project_id).await.unwrap();
    assert!(store.dependencies.list_for_project(project_id).await.unwrap().is_empty());
}
