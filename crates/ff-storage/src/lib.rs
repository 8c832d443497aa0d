// SPDX-License-Identifier: MIT

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! ff-storage: SQLite-backed persistence for every entity in the data model.
//!
//! Migrations are plain embedded SQL run at bootstrap via `sqlx::migrate!`,
//! not a separate migration DSL, matching the preference for readable
//! persisted state over binary encodings.

pub mod agent;
pub mod build;
pub mod dependency;
pub mod error;
pub mod job;
pub mod log;
pub mod metric;
pub mod project;
pub mod webhook_event;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use error::{Result, StorageError};

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;

pub use agent::AgentRepository;
pub use build::BuildRepository;
pub use dependency::DependencyRepository;
pub use job::JobRepository;
pub use log::LogRepository;
pub use metric::{MetricRepository, MetricSummary};
pub use project::ProjectRepository;
pub use webhook_event::WebhookEventRepository;

/// Open (creating if needed) a SQLite database at `url` and run pending
/// migrations. `url` is a full `sqlite:` connection string, e.g.
/// `sqlite://data/ffoundry.db` or `sqlite::memory:`.
pub async fn connect(url: &str) -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true).foreign_keys(true);
    let pool = SqlitePoolOptions::new().max_connections(8).connect_with(options).await?;
    sqlx::migrate!("./src/migrations").run(&pool).await?;
    Ok(pool)
}

/// A handle bundling one repository per entity over a shared connection
/// pool. Cloning is cheap — `SqlitePool` is internally reference-counted.
#[derive(Clone)]
pub struct Store {
    pub projects: ProjectRepository,
    pub dependencies: DependencyRepository,
    pub builds: BuildRepository,
    pub webhook_events: WebhookEventRepository,
    pub agents: AgentRepository,
    pub jobs: JobRepository,
    pub logs: LogRepository,
    pub metrics: MetricRepository,
    pub pool: SqlitePool,
}

impl Store {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            projects: ProjectRepository::new(pool.clone()),
            dependencies: DependencyRepository::new(pool.clone()),
            builds: BuildRepository::new(pool.clone()),
            webhook_events: WebhookEventRepository::new(pool.clone()),
            agents: AgentRepository::new(pool.clone()),
            jobs: JobRepository::new(pool.clone()),
            logs: LogRepository::new(pool.clone()),
            metrics: MetricRepository::new(pool.clone()),
            pool,
        }
    }

    pub async fn connect(url: &str) -> Result<Self> {
        Ok(Self::new(connect(url).await?))
    }
}
