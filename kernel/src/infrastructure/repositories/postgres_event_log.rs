// Copyright (c) 2026 Vryndara contributors
// SPDX-License-Identifier: AGPL-3.0

//! PostgreSQL Event Log Repository
//!
//! Append-only persistence of routed signals.
//!
//! # Schema
//!
//! ```sql
//! CREATE TABLE event_log (
//!     id        TEXT PRIMARY KEY,
//!     source    TEXT NOT NULL,
//!     target    TEXT NOT NULL,
//!     type      TEXT NOT NULL,
//!     payload   TEXT NOT NULL,
//!     timestamp BIGINT NOT NULL
//! );
//! ```
//!
//! plus indexes on `source`, `target` and `timestamp`. The table is created
//! on startup by [`PostgresEventLogRepository::ensure_schema`]. Rows are never
//! updated or deleted; inserting an existing id does nothing.

use async_trait::async_trait;
use sqlx::postgres::PgPool;
use sqlx::Row;

use crate::domain::repository::{EventLogRepository, RepositoryError};
use crate::domain::signal::EventLogEntry;

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS event_log (
        id        TEXT PRIMARY KEY,
        source    TEXT NOT NULL,
        target    TEXT NOT NULL,
        type      TEXT NOT NULL,
        payload   TEXT NOT NULL,
        timestamp BIGINT NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_event_log_source ON event_log (source)",
    "CREATE INDEX IF NOT EXISTS idx_event_log_target ON event_log (target)",
    "CREATE INDEX IF NOT EXISTS idx_event_log_timestamp ON event_log (timestamp)",
];

pub struct PostgresEventLogRepository {
    pool: PgPool,
}

impl PostgresEventLogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn ensure_schema(&self) -> Result<(), RepositoryError> {
        for statement in SCHEMA {
            sqlx::query(*statement)
                .execute(&self.pool)
                .await
                .map_err(|e| {
                    RepositoryError::Database(format!("Failed to initialize event_log schema: {}", e))
                })?;
        }
        Ok(())
    }
}

fn row_to_entry(row: &sqlx::postgres::PgRow) -> Result<EventLogEntry, RepositoryError> {
    let get = |e: sqlx::Error| RepositoryError::Database(e.to_string());
    Ok(EventLogEntry {
        id: row.try_get("id").map_err(get)?,
        source: row.try_get("source").map_err(get)?,
        target: row.try_get("target").map_err(get)?,
        signal_type: row.try_get("type").map_err(get)?,
        payload: row.try_get("payload").map_err(get)?,
        timestamp: row.try_get("timestamp").map_err(get)?,
    })
}

#[async_trait]
impl EventLogRepository for PostgresEventLogRepository {
    async fn append(&self, entry: &EventLogEntry) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO event_log (id, source, target, type, payload, timestamp)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(&entry.id)
        .bind(&entry.source)
        .bind(&entry.target)
        .bind(&entry.signal_type)
        .bind(&entry.payload)
        .bind(entry.timestamp)
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError::Database(format!("Failed to append event log entry: {}", e)))?;

        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<EventLogEntry>, RepositoryError> {
        let row = sqlx::query(
            r#"
            SELECT id, source, target, type, payload, timestamp
            FROM event_log
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepositoryError::Database(e.to_string()))?;

        row.as_ref().map(row_to_entry).transpose()
    }

    async fn list_recent(&self, limit: usize) -> Result<Vec<EventLogEntry>, RepositoryError> {
        let rows = sqlx::query(
            r#"
            SELECT id, source, target, type, payload, timestamp
            FROM event_log
            ORDER BY timestamp DESC
            LIMIT $1
            "#,
        )
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepositoryError::Database(e.to_string()))?;

        rows.iter().map(row_to_entry).collect()
    }
}
