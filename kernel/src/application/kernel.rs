// Copyright (c) 2026 Vryndara contributors
// SPDX-License-Identifier: AGPL-3.0
//! Kernel
//!
//! Wires the router, correlator, orchestrator, event log writer and event
//! bus together from a [`KernelConfigManifest`]. Presentation layers (gRPC,
//! HTTP gateway) and tests all start from here.

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::application::correlator::ResponseCorrelator;
use crate::application::event_log_writer::{EventLogHandle, EventLogWriter};
use crate::application::orchestrator::WorkflowOrchestrator;
use crate::application::repository_factory::{create_event_log_repository, EventLogBackend};
use crate::application::router::MailboxRouter;
use crate::domain::kernel_config::KernelConfigManifest;
use crate::domain::repository::EventLogRepository;
use crate::infrastructure::event_bus::EventBus;

const WRITER_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Clone)]
pub struct Kernel {
    config: Arc<KernelConfigManifest>,
    router: Arc<MailboxRouter>,
    orchestrator: Arc<WorkflowOrchestrator>,
    event_bus: EventBus,
    event_log: EventLogHandle,
    event_log_repository: Arc<dyn EventLogRepository>,
    event_log_backend: EventLogBackend,
    writer_task: Arc<Mutex<Option<JoinHandle<()>>>>,
    shutdown_token: CancellationToken,
    started_at: Instant,
}

impl Kernel {
    /// Build the kernel, connecting to the configured event log backend.
    pub async fn from_config(config: KernelConfigManifest) -> anyhow::Result<Self> {
        let backend = config.spec.storage.backend()?;
        let (repository, selected) = create_event_log_repository(&backend).await;
        Ok(Self::with_repository(config, repository, selected))
    }

    /// Build the kernel around an already constructed repository. Must be
    /// called inside a Tokio runtime.
    pub fn with_repository(
        config: KernelConfigManifest,
        repository: Arc<dyn EventLogRepository>,
        event_log_backend: EventLogBackend,
    ) -> Self {
        let event_bus = EventBus::default();
        let (writer, event_log) =
            EventLogWriter::new(repository.clone(), config.spec.storage.queue_capacity);
        let writer_task = writer.start();

        let router = Arc::new(MailboxRouter::new(
            ResponseCorrelator::new(),
            event_log.clone(),
            event_bus.clone(),
            config.spec.orchestrator.agent_id(),
        ));
        let orchestrator = Arc::new(WorkflowOrchestrator::new(
            router.clone(),
            event_bus.clone(),
            config.spec.orchestrator.step_timeout(),
        ));

        info!(
            node = %config.metadata.name,
            event_log = %event_log_backend,
            orchestrator_id = %config.spec.orchestrator.agent_id,
            step_timeout_secs = config.spec.orchestrator.step_timeout_seconds,
            "Kernel initialized"
        );

        Self {
            config: Arc::new(config),
            router,
            orchestrator,
            event_bus,
            event_log,
            event_log_repository: repository,
            event_log_backend,
            writer_task: Arc::new(Mutex::new(Some(writer_task))),
            shutdown_token: CancellationToken::new(),
            started_at: Instant::now(),
        }
    }

    /// In-memory kernel, mostly for tests and local demos.
    pub fn in_memory(config: KernelConfigManifest) -> Self {
        Self::with_repository(
            config,
            Arc::new(crate::infrastructure::repositories::InMemoryEventLogRepository::new()),
            EventLogBackend::InMemory,
        )
    }

    pub fn config(&self) -> &KernelConfigManifest {
        &self.config
    }

    pub fn router(&self) -> &Arc<MailboxRouter> {
        &self.router
    }

    pub fn orchestrator(&self) -> &Arc<WorkflowOrchestrator> {
        &self.orchestrator
    }

    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    pub fn event_log(&self) -> &EventLogHandle {
        &self.event_log
    }

    pub fn event_log_repository(&self) -> &Arc<dyn EventLogRepository> {
        &self.event_log_repository
    }

    pub fn event_log_backend(&self) -> EventLogBackend {
        self.event_log_backend
    }

    pub fn uptime(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Cancelled once the kernel starts shutting down. Long-lived streams
    /// (Subscribe, SSE) end on it so graceful server shutdown can complete.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown_token.clone()
    }

    /// End every open subscriber stream. Idempotent.
    pub fn close_streams(&self) {
        if !self.shutdown_token.is_cancelled() {
            info!("Closing subscriber streams");
        }
        self.shutdown_token.cancel();
    }

    /// Flush the event log writer. Waits until every other handle to the
    /// kernel is gone (or a short timeout) so queued entries are persisted.
    pub async fn shutdown(self) {
        self.close_streams();
        let task = self.writer_task.lock().take();
        drop(self);

        let Some(task) = task else {
            return;
        };

        match tokio::time::timeout(WRITER_DRAIN_TIMEOUT, task).await {
            Ok(Ok(())) => info!("Event log writer drained"),
            Ok(Err(e)) => warn!("Event log writer task failed: {}", e),
            Err(_) => warn!(
                "Event log writer still busy after {:?}, abandoning queued entries",
                WRITER_DRAIN_TIMEOUT
            ),
        }
    }
}
