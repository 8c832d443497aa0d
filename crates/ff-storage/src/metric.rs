// SPDX-License-Identifier: MIT

//! Persistence for [`ff_core::Metric`].

use crate::error::{Result, StorageError};
use chrono::{DateTime, Utc};
use ff_core::agent::AgentId;
use ff_core::metric::{Metric, MetricId};
use sqlx::{FromRow, SqlitePool};

#[derive(FromRow)]
struct MetricRow {
    id: String,
    metric_type: String,
    value: f64,
    agent_id: Option<String>,
    recorded_at: String,
}

impl MetricRow {
    fn into_metric(self) -> Result<Metric> {
        Ok(Metric {
            id: MetricId::from_string(&self.id),
            metric_type: self.metric_type,
            value: self.value,
            agent_id: self.agent_id.map(AgentId::from_string),
            recorded_at: parse_ts(&self.recorded_at)?,
        })
    }
}

fn parse_ts(s: &str) -> Result<chrono::DateTime<chrono::Utc>> {
    chrono::DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&chrono::Utc))
        .map_err(|_| StorageError::InvalidValue { field: "timestamp", value: s.to_string() })
}

#[derive(Clone)]
pub struct MetricRepository {
    pool: SqlitePool,
}

impl MetricRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn insert(&self, metric: &Metric) -> Result<()> {
        sqlx::query("INSERT INTO metrics (id, metric_type, value, agent_id, recorded_at) VALUES (?, ?, ?, ?, ?)")
            .bind(metric.id.to_string())
            .bind(&metric.metric_type)
            .bind(metric.value)
            .bind(metric.agent_id.map(|a| a.to_string()))
            .bind(metric.recorded_at.to_rfc3339())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn list_by_type(&self, metric_type: &str, limit: i64) -> Result<Vec<Metric>> {
        let rows: Vec<MetricRow> = sqlx::query_as(
            "SELECT id, metric_type, value, agent_id, recorded_at FROM metrics
             WHERE metric_type = ? ORDER BY rowid DESC LIMIT ?",
        )
        .bind(metric_type)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(MetricRow::into_metric).collect()
    }

    pub async fn list_recent(&self, limit: i64) -> Result<Vec<Metric>> {
        let rows: Vec<MetricRow> =
            sqlx::query_as("SELECT id, metric_type, value, agent_id, recorded_at FROM metrics ORDER BY rowid DESC LIMIT ?")
                .bind(limit)
                .fetch_all(&self.pool)
                .await?;
        rows.into_iter().map(MetricRow::into_metric).collect()
    }

    /// Per-`metric_type` count/min/max/average over the samples recorded in
    /// the last `since_hours`.
    pub async fn summary(&self, since_hours: i64, now: DateTime<Utc>) -> Result<Vec<MetricSummary>> {
        let cutoff = now - chrono::Duration::hours(since_hours);
        let rows: Vec<MetricSummary> = sqlx::query_as(
            "SELECT metric_type, COUNT(*) as count, MIN(value) as min, MAX(value) as max, AVG(value) as average
             FROM metrics WHERE recorded_at >= ? GROUP BY metric_type ORDER BY metric_type",
        )
        .bind(cutoff.to_rfc3339())
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}

#[derive(Debug, Clone, FromRow, serde::Serialize)]
pub struct MetricSummary {
    pub metric_type: String,
    pub count: i64,
    pub min: f64,
    pub max: f64,
    pub average: f64,
}

#[cfg(test)]
#[path = "metric_tests.rs"]
mod tests;
