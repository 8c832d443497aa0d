// SPDX-License-Identifier: MIT

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! HTTP/WebSocket surface (C10): one axum `Router` exposing every
//! entity's CRUD surface, the GitHub webhook intake, and a `/ws` feed of
//! every bus event, grounded on the `ob-poc-web` bootstrap shape.

pub mod config;
pub mod error;
pub mod routes;
pub mod state;
pub mod ws;

#[cfg(test)]
pub mod test_support;

use axum::routing::{get, post, put};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use config::Config;
use state::AppState;

/// Build the full router over an already-constructed [`AppState`]. Split
/// out from [`serve`] so tests can mount it without binding a socket.
pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route("/status", get(routes::status::get))
        .route("/agents", get(routes::agents::list).post(routes::agents::create))
        .route("/agents/:id", get(routes::agents::get).delete(routes::agents::delete))
        .route("/agents/:id/status", put(routes::agents::update_status))
        .route("/agents/:id/start", post(routes::agents::start))
        .route("/agents/:id/stop", post(routes::agents::stop))
        .route("/jobs", get(routes::jobs::list).post(routes::jobs::create))
        .route("/jobs/:id", get(routes::jobs::get).delete(routes::jobs::delete))
        .route("/jobs/:id/start", post(routes::jobs::start))
        .route("/jobs/:id/complete", post(routes::jobs::complete))
        .route("/jobs/:id/cancel", post(routes::jobs::cancel))
        .route("/logs", get(routes::logs::list).post(routes::logs::create).delete(routes::logs::delete))
        .route("/metrics", get(routes::metrics::list).post(routes::metrics::create))
        .route("/metrics/summary", get(routes::metrics::summary))
        .route("/projects", get(routes::projects::list).post(routes::projects::create))
        .route("/projects/builds", get(routes::builds::list_all))
        .route("/projects/builds/:id", get(routes::builds::get))
        .route("/projects/builds/:id/retry", post(routes::builds::retry))
        .route("/projects/:id", get(routes::projects::get).put(routes::projects::update).delete(routes::projects::delete))
        .route("/projects/:id/sync", put(routes::projects::sync))
        .route("/projects/:id/build", post(routes::projects::build))
        .route("/projects/:id/scan-dependencies", post(routes::projects::scan_dependencies))
        .route("/projects/:id/dependencies", get(routes::projects::dependencies))
        .route("/projects/:id/dependency-tree", get(routes::projects::dependency_tree))
        .route("/github/webhook", post(routes::webhook::receive));

    let mut app = Router::new()
        .nest("/api", api)
        .route("/ws", get(ws::upgrade))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    if let Some(static_dir) = state.config.static_dir.clone() {
        app = app.fallback_service(ServeDir::new(static_dir));
    }

    app.with_state(state)
}

/// Bootstrap storage, seed the default agents, start the event bus, and
/// serve the router until the process receives a shutdown signal.
pub async fn serve(config: Config) -> anyhow::Result<()> {
    let store = ff_storage::Store::connect(&config.database_url).await?;
    store.agents.seed_defaults().await?;

    let bind_addr = config.bind_addr;
    let state = AppState::new(store, config);
    state.start_bus()?;

    let app = router(state);
    tracing::info!(%bind_addr, "ffoundry server listening");
    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;
    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

/// Install the process-wide tracing subscriber, driven by `RUST_LOG`
/// (default `info`). Call once, before [`serve`].
pub fn init_tracing() {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;
    use tracing_subscriber::EnvFilter;

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();
}
