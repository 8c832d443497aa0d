// SPDX-License-Identifier: MIT

//! Persistence for [`ff_core::Agent`].

use crate::error::{Result, StorageError};
use chrono::{DateTime, Utc};
use ff_core::agent::{Agent, AgentId, AgentStatus, AgentType};
use sqlx::{FromRow, SqlitePool};
use std::str::FromStr;

#[derive(FromRow)]
struct AgentRow {
    id: String,
    name: String,
    agent_type: String,
    status: String,
    last_active_at: Option<String>,
}

impl AgentRow {
    fn into_agent(self) -> Result<Agent> {
        Ok(Agent {
            id: AgentId::from_string(&self.id),
            name: self.name,
            agent_type: AgentType::from_str(&self.agent_type)
                .map_err(|_| StorageError::InvalidValue { field: "agent_type", value: self.agent_type })?,
            status: parse_status(&self.status)?,
            last_active_at: self.last_active_at.as_deref().map(parse_ts).transpose()?,
        })
    }
}

fn parse_status(s: &str) -> Result<AgentStatus> {
    match s {
        "idle" => Ok(AgentStatus::Idle),
        "active" => Ok(AgentStatus::Active),
        "error" => Ok(AgentStatus::Error),
        other => Err(StorageError::InvalidValue { field: "status", value: other.to_string() }),
    }
}

fn parse_ts(s: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| StorageError::InvalidValue { field: "timestamp", value: s.to_string() })
}

#[derive(Clone)]
pub struct AgentRepository {
    pool: SqlitePool,
}

impl AgentRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn insert(&self, agent: &Agent) -> Result<()> {
        sqlx::query("INSERT INTO agents (id, name, agent_type, status, last_active_at) VALUES (?, ?, ?, ?, ?)")
            .bind(agent.id.to_string())
            .bind(&agent.name)
            .bind(agent.agent_type.to_string())
            .bind(agent.status.to_string())
            .bind(agent.last_active_at.map(|t| t.to_rfc3339()))
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Insert the six default agents if the table is empty.
    pub async fn seed_defaults(&self) -> Result<()> {
        let row = sqlx::query_as::<_, (i64,)>("SELECT COUNT(*) FROM agents").fetch_one(&self.pool).await?;
        if row.0 > 0 {
            return Ok(());
        }
        for agent in ff_core::agent::default_agents() {
            self.insert(&agent).await?;
        }
        Ok(())
    }

    pub async fn list(&self) -> Result<Vec<Agent>> {
        let rows: Vec<AgentRow> =
            sqlx::query_as("SELECT id, name, agent_type, status, last_active_at FROM agents ORDER BY name")
                .fetch_all(&self.pool)
                .await?;
        rows.into_iter().map(AgentRow::into_agent).collect()
    }

    pub async fn update_status(&self, id: AgentId, status: AgentStatus, now: DateTime<Utc>) -> Result<()> {
        sqlx::query("UPDATE agents SET status = ?, last_active_at = ? WHERE id = ?")
            .bind(status.to_string())
            .bind(now.to_rfc3339())
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn get(&self, id: AgentId) -> Result<Agent> {
        let row: AgentRow = sqlx::query_as("SELECT id, name, agent_type, status, last_active_at FROM agents WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StorageError::NotFound(format!("agent {id}")))?;
        row.into_agent()
    }

    pub async fn delete(&self, id: AgentId) -> Result<()> {
        let deleted = sqlx::query("DELETE FROM agents WHERE id = ?").bind(id.to_string()).execute(&self.pool).await?;
        if deleted.rows_affected() == 0 {
            return Err(StorageError::NotFound(format!("agent {id}")));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "agent_tests.rs"]
mod tests;
