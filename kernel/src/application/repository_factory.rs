// Copyright (c) 2026 Vryndara contributors
// SPDX-License-Identifier: AGPL-3.0
//! Repository Factory
//!
//! Creates the event log repository for the configured storage backend.
//! A PostgreSQL backend that cannot be reached at startup degrades to the
//! in-memory log instead of failing startup.

use std::sync::Arc;
use tracing::{error, info};

use crate::domain::repository::{EventLogRepository, StorageBackend};
use crate::infrastructure::db::Database;
use crate::infrastructure::repositories::{InMemoryEventLogRepository, PostgresEventLogRepository};

/// Which repository actually ended up behind the event log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventLogBackend {
    InMemory,
    PostgreSQL,
    /// PostgreSQL was configured but unavailable.
    InMemoryFallback,
}

impl std::fmt::Display for EventLogBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventLogBackend::InMemory => write!(f, "in-memory"),
            EventLogBackend::PostgreSQL => write!(f, "postgres"),
            EventLogBackend::InMemoryFallback => write!(f, "in-memory (postgres unavailable)"),
        }
    }
}

pub async fn create_event_log_repository(
    backend: &StorageBackend,
) -> (Arc<dyn EventLogRepository>, EventLogBackend) {
    match backend {
        StorageBackend::InMemory => (
            Arc::new(InMemoryEventLogRepository::new()),
            EventLogBackend::InMemory,
        ),
        StorageBackend::PostgreSQL(config) => {
            match connect_postgres(&config.connection_string).await {
                Ok(repository) => {
                    info!("Event log persisted to PostgreSQL");
                    (Arc::new(repository), EventLogBackend::PostgreSQL)
                }
                Err(e) => {
                    error!(
                        "Event log database unavailable ({}), falling back to in-memory log",
                        e
                    );
                    (
                        Arc::new(InMemoryEventLogRepository::new()),
                        EventLogBackend::InMemoryFallback,
                    )
                }
            }
        }
    }
}

async fn connect_postgres(connection_string: &str) -> anyhow::Result<PostgresEventLogRepository> {
    let database = Database::new(connection_string).await?;
    let repository = PostgresEventLogRepository::new(database.get_pool().clone());
    repository.ensure_schema().await?;
    Ok(repository)
}
