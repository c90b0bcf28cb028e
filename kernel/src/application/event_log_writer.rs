// Copyright (c) 2026 Vryndara contributors
// SPDX-License-Identifier: AGPL-3.0

//! Event Log Writer
//!
//! Decouples event logging from routing. The router hands each routed signal
//! to an [`EventLogHandle`], which enqueues it on a bounded channel without
//! waiting; a background task drains the channel into the
//! [`EventLogRepository`].
//!
//! Delivery to the log is best-effort:
//! - a full queue drops the entry (logged, counted);
//! - a repository error is logged and the entry is lost;
//! - routing never waits on, or fails because of, persistence.
//!
//! The task stops once every handle is dropped and the queue is drained.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::domain::repository::EventLogRepository;
use crate::domain::signal::{EventLogEntry, Signal};

#[derive(Debug, Default)]
pub struct EventLogStats {
    pub enqueued: AtomicU64,
    pub dropped: AtomicU64,
    pub persisted: AtomicU64,
    pub failed: AtomicU64,
}

/// Cheap, cloneable sending side of the writer queue.
#[derive(Clone)]
pub struct EventLogHandle {
    sender: mpsc::Sender<EventLogEntry>,
    stats: Arc<EventLogStats>,
}

impl EventLogHandle {
    /// Enqueue a copy of `signal`. Never blocks.
    pub fn record(&self, signal: &Signal) {
        match self.sender.try_send(EventLogEntry::from(signal)) {
            Ok(()) => {
                self.stats.enqueued.fetch_add(1, Ordering::Relaxed);
            }
            Err(mpsc::error::TrySendError::Full(entry)) => {
                let dropped = self.stats.dropped.fetch_add(1, Ordering::Relaxed) + 1;
                warn!(
                    signal_id = %entry.id,
                    dropped_total = dropped,
                    "Event log queue full, dropping entry"
                );
            }
            Err(mpsc::error::TrySendError::Closed(entry)) => {
                let dropped = self.stats.dropped.fetch_add(1, Ordering::Relaxed) + 1;
                warn!(
                    signal_id = %entry.id,
                    dropped_total = dropped,
                    "Event log writer stopped, dropping entry"
                );
            }
        }
    }

    pub fn stats(&self) -> &EventLogStats {
        &self.stats
    }
}

pub struct EventLogWriter {
    repository: Arc<dyn EventLogRepository>,
    receiver: mpsc::Receiver<EventLogEntry>,
    stats: Arc<EventLogStats>,
}

impl EventLogWriter {
    pub fn new(repository: Arc<dyn EventLogRepository>, capacity: usize) -> (Self, EventLogHandle) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        let stats = Arc::new(EventLogStats::default());

        let writer = Self {
            repository,
            receiver,
            stats: stats.clone(),
        };
        (writer, EventLogHandle { sender, stats })
    }

    /// Spawn the background persistence task.
    pub fn start(mut self) -> JoinHandle<()> {
        info!("Starting event log writer background task");

        tokio::spawn(async move {
            while let Some(entry) = self.receiver.recv().await {
                match self.repository.append(&entry).await {
                    Ok(()) => {
                        let persisted = self.stats.persisted.fetch_add(1, Ordering::Relaxed) + 1;
                        if persisted % 100 == 0 {
                            debug!(
                                "Event log writer persisted {} entries ({} failures)",
                                persisted,
                                self.stats.failed.load(Ordering::Relaxed)
                            );
                        }
                    }
                    Err(e) => {
                        let failed = self.stats.failed.fetch_add(1, Ordering::Relaxed) + 1;
                        error!(
                            signal_id = %entry.id,
                            error = %e,
                            "Failed to persist event log entry"
                        );
                        if failed % 10 == 0 {
                            warn!("Event log persistence has failed {} times", failed);
                        }
                    }
                }
            }

            info!(
                "Event log writer shut down (persisted {} entries, {} failures, {} dropped)",
                self.stats.persisted.load(Ordering::Relaxed),
                self.stats.failed.load(Ordering::Relaxed),
                self.stats.dropped.load(Ordering::Relaxed)
            );
        })
    }
}
