// SPDX-License-Identifier: MIT

use super::*;
use crate::test_support::test_store;

#[tokio::test]
async fn seed_defaults_is_idempotent() {
    let store = test_store().await;
    store.agents.seed_defaults().await.unwrap();
    store.agents.seed_defaults().await.unwrap();

    let agents = store.agents.list().await.unwrap();
    assert_eq!(agents.len(), 6);
}

#[tokio::test]
async fn update_status_persists() {
    let store = test_store().await;
    store.agents.seed_defaults().await.unwrap();
    let agents = store.agents.list().await.unwrap();
    let builder = agents.iter().find(|a| a.agent_type == AgentType::Builder).unwrap();

    store.agents.update_status(builder.id, AgentStatus::Active, Utc::now()).await.unwrap();
    let agents = store.agents.list().await.unwrap();
    let builder = agents.iter().find(|a| a.agent_type == AgentType::Builder).unwrap();
    assert_eq!(builder.status, AgentStatus::Active);
}
