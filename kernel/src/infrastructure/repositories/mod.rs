// Copyright (c) 2026 Vryndara contributors
// SPDX-License-Identifier: AGPL-3.0

//! Event Log Repository Implementations
//!
//! Infrastructure implementations of `crate::domain::repository::EventLogRepository`.
//!
//! - **InMemoryEventLogRepository** - process-local log for development and tests
//! - **PostgresEventLogRepository** - `event_log` table, see [`postgres_event_log`]

pub mod postgres_event_log;

pub use postgres_event_log::PostgresEventLogRepository;

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::{Arc, RwLock};

use crate::domain::repository::{EventLogRepository, RepositoryError};
use crate::domain::signal::EventLogEntry;

#[derive(Clone, Default)]
pub struct InMemoryEventLogRepository {
    inner: Arc<RwLock<InMemoryLog>>,
}

#[derive(Default)]
struct InMemoryLog {
    entries: Vec<EventLogEntry>,
    ids: HashSet<String>,
}

impl InMemoryEventLogRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Entries in append order
    pub fn entries(&self) -> Vec<EventLogEntry> {
        self.inner
            .read()
            .map(|log| log.entries.clone())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.inner.read().map(|log| log.entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl EventLogRepository for InMemoryEventLogRepository {
    async fn append(&self, entry: &EventLogEntry) -> Result<(), RepositoryError> {
        let mut log = self
            .inner
            .write()
            .map_err(|_| RepositoryError::Database("Lock poisoned".to_string()))?;

        if log.ids.insert(entry.id.clone()) {
            log.entries.push(entry.clone());
        }
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<EventLogEntry>, RepositoryError> {
        let log = self
            .inner
            .read()
            .map_err(|_| RepositoryError::Database("Lock poisoned".to_string()))?;

        Ok(log.entries.iter().find(|e| e.id == id).cloned())
    }

    async fn list_recent(&self, limit: usize) -> Result<Vec<EventLogEntry>, RepositoryError> {
        let log = self
            .inner
            .read()
            .map_err(|_| RepositoryError::Database("Lock poisoned".to_string()))?;

        Ok(log.entries.iter().rev().take(limit).cloned().collect())
    }
}
