// SPDX-License-Identifier: MIT

//! Persistence for [`ff_core::WebhookEvent`].

use crate::error::{Result, StorageError};
use chrono::{DateTime, Utc};
use ff_core::build::BuildId;
use ff_core::project::ProjectId;
use ff_core::webhook_event::{ProcessingState, WebhookEvent, WebhookEventId, WebhookEventType};
use sqlx::{FromRow, SqlitePool};
use std::str::FromStr;

#[derive(FromRow)]
struct WebhookEventRow {
    id: String,
    delivery_id: String,
    event_type: String,
    project_id: Option<String>,
    payload: String,
    signature_valid: bool,
    state: String,
    triggered_build_id: Option<String>,
    received_at: String,
    processed_at: Option<String>,
    error: Option<String>,
}

impl WebhookEventRow {
    fn into_event(self) -> Result<WebhookEvent> {
        Ok(WebhookEvent {
            id: WebhookEventId::from_string(&self.id),
            delivery_id: self.delivery_id,
            event_type: WebhookEventType::from_header(&self.event_type),
            project_id: self
                .project_id
                .as_deref()
                .map(ProjectId::from_str)
                .transpose()
                .map_err(|_| StorageError::InvalidValue { field: "project_id", value: "invalid".into() })?,
            payload: serde_json::from_str(&self.payload)
                .map_err(|_| StorageError::InvalidValue { field: "payload", value: self.payload })?,
            signature_valid: self.signature_valid,
            state: ProcessingState::from_str(&self.state)
                .map_err(|_| StorageError::InvalidValue { field: "state", value: self.state })?,
            triggered_build_id: self.triggered_build_id.map(BuildId::from_string),
            received_at: parse_ts(&self.received_at)?,
            processed_at: self.processed_at.as_deref().map(parse_ts).transpose()?,
            error: self.error,
        })
    }
}

fn parse_ts(s: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| StorageError::InvalidValue { field: "timestamp", value: s.to_string() })
}

#[derive(Clone)]
pub struct WebhookEventRepository {
    pool: SqlitePool,
}

impl WebhookEventRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a delivery. Returns [`StorageError::DuplicateDelivery`] if
    /// `delivery_id` was already recorded — the caller's replay guard.
    pub async fn insert(&self, event: &WebhookEvent) -> Result<()> {
        sqlx::query(
            "INSERT INTO webhook_events (id, delivery_id, event_type, project_id, payload,
             signature_valid, state, triggered_build_id, received_at, processed_at, error)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(event.id.to_string())
        .bind(&event.delivery_id)
        .bind(event.event_type.as_str())
        .bind(event.project_id.map(|p| p.to_string()))
        .bind(serde_json::to_string(&event.payload).unwrap_or_default())
        .bind(event.signature_valid)
        .bind(event.state.to_string())
        .bind(event.triggered_build_id.map(|b| b.to_string()))
        .bind(event.received_at.to_rfc3339())
        .bind(event.processed_at.map(|t| t.to_rfc3339()))
        .bind(&event.error)
        .execute(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                StorageError::DuplicateDelivery(event.delivery_id.clone())
            }
            _ => StorageError::Database(e),
        })?;
        Ok(())
    }

    pub async fn update_state(&self, event: &WebhookEvent) -> Result<()> {
        sqlx::query(
            "UPDATE webhook_events SET project_id = ?, state = ?, triggered_build_id = ?,
             processed_at = ?, error = ? WHERE id = ?",
        )
        .bind(event.project_id.map(|p| p.to_string()))
        .bind(event.state.to_string())
        .bind(event.triggered_build_id.map(|b| b.to_string()))
        .bind(event.processed_at.map(|t| t.to_rfc3339()))
        .bind(&event.error)
        .bind(event.id.to_string())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn exists(&self, delivery_id: &str) -> Result<bool> {
        let row = sqlx::query_as::<_, (i64,)>("SELECT COUNT(*) FROM webhook_events WHERE delivery_id = ?")
            .bind(delivery_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(row.0 > 0)
    }

    pub async fn list_recent(&self, limit: i64) -> Result<Vec<WebhookEvent>> {
        let rows: Vec<WebhookEventRow> = sqlx::query_as(
            "SELECT id, delivery_id, event_type, project_id, payload, signature_valid, state,
             triggered_build_id, received_at, processed_at, error FROM webhook_events
             ORDER BY rowid DESC LIMIT ?",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(WebhookEventRow::into_event).collect()
    }
}

#[cfg(test)]
#[path = "webhook_event_tests.rs"]
mod tests;
