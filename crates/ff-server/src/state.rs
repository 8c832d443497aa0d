// SPDX-License-Identifier: MIT

//! Shared application state (C10's DI root), grounded on the
//! `adamtc007-ob-poc` web server's `AppState::new(pool)` pattern: one
//! struct bundling every handle a route needs, built once at bootstrap
//! and threaded through axum's `State` extractor rather than any global.

use ff_adapters::{LlmAdapter, RepositoryManager, ToolchainAdapter};
use ff_core::clock::SystemClock;
use ff_engine::{ChannelSubscriber, EventBus, HandlerContext, Orchestrator};
use ff_storage::Store;
use ff_webhook::WebhookIntake;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::config::Config;

#[derive(Clone)]
pub struct AppState {
    pub store: Store,
    pub orchestrator: Orchestrator,
    pub webhook: WebhookIntake,
    pub bus: EventBus,
    pub clock: SystemClock,
    pub config: Arc<Config>,
    ws_connections: Arc<AtomicUsize>,
}

impl AppState {
    pub fn new(store: Store, config: Config) -> Self {
        let bus = EventBus::new();
        let ctx = HandlerContext {
            toolchain: ToolchainAdapter::new(),
            llm: LlmAdapter::new(config.llm_base_url.clone(), config.llm_api_key.clone(), config.llm_model.clone()),
            repo: RepositoryManager::new(),
        };
        let orchestrator = Orchestrator::new(store.clone(), bus.clone(), ctx, config.max_repair_iterations);
        let webhook = WebhookIntake::new(store.clone(), orchestrator.clone());
        Self {
            store,
            orchestrator,
            webhook,
            bus,
            clock: SystemClock,
            config: Arc::new(config),
            ws_connections: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Start the event bus dispatcher. Must run once, before any
    /// `execute_build` is dispatched.
    pub fn start_bus(&self) -> Result<(), ff_engine::BusError> {
        self.bus.start()
    }

    /// Subscribe a fresh channel to every bus event, for one `/ws` client.
    pub fn subscribe_all(&self) -> (Arc<ChannelSubscriber>, tokio::sync::mpsc::Receiver<ff_core::Event>) {
        let (subscriber, rx) = ChannelSubscriber::new();
        self.bus.subscribe(None, subscriber.clone());
        (subscriber, rx)
    }

    pub fn ws_connected(&self) -> usize {
        self.ws_connections.load(Ordering::Relaxed)
    }

    pub(crate) fn ws_connect(&self) {
        self.ws_connections.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn ws_disconnect(&self) {
        self.ws_connections.fetch_sub(1, Ordering::Relaxed);
    }
}
