// Copyright (c) 2026 Vryndara contributors
// SPDX-License-Identifier: AGPL-3.0

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::agent::AgentId;
use crate::domain::signal::{SignalId, SignalType};
use crate::domain::workflow::WorkflowId;

/// Progress and audit events published on the kernel event bus.
///
/// These are observational only; nothing in the routing path depends on
/// anyone listening.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum KernelEvent {
    AgentRegistered {
        agent_id: AgentId,
        capabilities: Vec<String>,
        registered_at: DateTime<Utc>,
    },
    AgentSubscribed {
        agent_id: AgentId,
        subscribed_at: DateTime<Utc>,
    },
    SignalRouted {
        signal_id: SignalId,
        source: AgentId,
        target: AgentId,
        signal_type: SignalType,
        routed_at: DateTime<Utc>,
    },
    SignalUndeliverable {
        signal_id: SignalId,
        source: AgentId,
        target: AgentId,
        reason: String,
    },
    WorkflowStarted {
        workflow_id: WorkflowId,
        step_count: usize,
        started_at: DateTime<Utc>,
    },
    StepDispatched {
        workflow_id: WorkflowId,
        step_order: i32,
        agent_id: AgentId,
        signal_id: SignalId,
    },
    StepResolved {
        workflow_id: WorkflowId,
        step_order: i32,
        agent_id: AgentId,
        elapsed_ms: u64,
    },
    StepTimedOut {
        workflow_id: WorkflowId,
        step_order: i32,
        agent_id: AgentId,
        timeout_ms: u64,
    },
    StepUndeliverable {
        workflow_id: WorkflowId,
        step_order: i32,
        agent_id: AgentId,
        reason: String,
    },
    WorkflowCompleted {
        workflow_id: WorkflowId,
        resolved_steps: usize,
        total_steps: usize,
        completed_at: DateTime<Utc>,
    },
}

impl KernelEvent {
    /// Workflow this event belongs to, if any.
    pub fn workflow_id(&self) -> Option<&WorkflowId> {
        match self {
            KernelEvent::WorkflowStarted { workflow_id, .. }
            | KernelEvent::StepDispatched { workflow_id, .. }
            | KernelEvent::StepResolved { workflow_id, .. }
            | KernelEvent::StepTimedOut { workflow_id, .. }
            | KernelEvent::StepUndeliverable { workflow_id, .. }
            | KernelEvent::WorkflowCompleted { workflow_id, .. } => Some(workflow_id),
            _ => None,
        }
    }
}
