// Copyright (c) 2026 Vryndara contributors
// SPDX-License-Identifier: AGPL-3.0

// Event Bus - Pub/Sub for kernel progress events
//
// In-memory fan-out over a tokio broadcast channel. Feeds the HTTP gateway's
// SSE endpoint and anything else that wants to watch workflows progress.
// Slow receivers lag and lose events; publishers never block.

use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::domain::events::KernelEvent;
use crate::domain::workflow::WorkflowId;

#[derive(Clone)]
pub struct EventBus {
    sender: Arc<broadcast::Sender<KernelEvent>>,
}

impl EventBus {
    /// Capacity is how many events a receiver may fall behind before it lags
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Create event bus with default capacity (1000)
    pub fn with_default_capacity() -> Self {
        Self::new(1000)
    }

    pub fn publish(&self, event: KernelEvent) {
        debug!("Publishing event: {:?}", event);

        let receiver_count = self.sender.send(event).unwrap_or(0);
        if receiver_count == 0 {
            debug!("No subscribers listening to event");
        }
    }

    pub fn subscribe(&self) -> EventReceiver {
        EventReceiver {
            receiver: self.sender.subscribe(),
        }
    }

    /// Only events belonging to `workflow_id`
    pub fn subscribe_workflow(&self, workflow_id: WorkflowId) -> WorkflowEventReceiver {
        WorkflowEventReceiver {
            receiver: self.sender.subscribe(),
            workflow_id,
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::with_default_capacity()
    }
}

pub struct EventReceiver {
    receiver: broadcast::Receiver<KernelEvent>,
}

impl EventReceiver {
    pub async fn recv(&mut self) -> Result<KernelEvent, EventBusError> {
        self.receiver.recv().await.map_err(map_recv_error)
    }

    pub fn into_inner(self) -> broadcast::Receiver<KernelEvent> {
        self.receiver
    }
}

pub struct WorkflowEventReceiver {
    receiver: broadcast::Receiver<KernelEvent>,
    workflow_id: WorkflowId,
}

impl WorkflowEventReceiver {
    pub async fn recv(&mut self) -> Result<KernelEvent, EventBusError> {
        loop {
            let event = self.receiver.recv().await.map_err(map_recv_error)?;
            if event.workflow_id() == Some(&self.workflow_id) {
                return Ok(event);
            }
        }
    }
}

fn map_recv_error(e: broadcast::error::RecvError) -> EventBusError {
    match e {
        broadcast::error::RecvError::Closed => EventBusError::Closed,
        broadcast::error::RecvError::Lagged(n) => {
            warn!("Event receiver lagged by {} events", n);
            EventBusError::Lagged(n)
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum EventBusError {
    #[error("Event bus is closed")]
    Closed,

    #[error("Receiver lagged by {0} events (events were dropped)")]
    Lagged(u64),
}
