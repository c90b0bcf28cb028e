// Copyright (c) 2026 Vryndara contributors
// SPDX-License-Identifier: AGPL-3.0
//! # Event Log Repository Contract
//!
//! The event log is an append-only record of every routed signal, keyed by
//! signal id. Implementations live in `crate::infrastructure::repositories`:
//!
//! | Backend | Implementation |
//! |---------|----------------|
//! | In-memory | `InMemoryEventLogRepository` |
//! | PostgreSQL | `PostgresEventLogRepository` |
//!
//! Appending an id that already exists is a no-op, never an error, so a
//! replayed write cannot fail the writer task.

use async_trait::async_trait;

use crate::domain::signal::EventLogEntry;

/// Storage backend for the event log
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageBackend {
    InMemory,
    PostgreSQL(PostgresConfig),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostgresConfig {
    pub connection_string: String,
}

#[async_trait]
pub trait EventLogRepository: Send + Sync {
    /// Append an entry. Existing ids are left untouched.
    async fn append(&self, entry: &EventLogEntry) -> Result<(), RepositoryError>;

    async fn find_by_id(&self, id: &str) -> Result<Option<EventLogEntry>, RepositoryError>;

    /// Most recent entries first.
    async fn list_recent(&self, limit: usize) -> Result<Vec<EventLogEntry>, RepositoryError>;
}

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Entry not found: {0}")]
    NotFound(String),
}
