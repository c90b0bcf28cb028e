// Copyright (c) 2026 Vryndara contributors
// SPDX-License-Identifier: AGPL-3.0
//! gRPC surface: generated `vryndara.v1` types and the conversions between
//! them and the domain model.
//!
//! Conversions apply the kernel's defaults for sloppy clients: an empty
//! signal id gets a fresh UUID, a zero timestamp gets the arrival time, an
//! empty `correlation_id` means none and an empty `workflow_id` gets
//! `wf-<unix seconds>`.

pub mod server;

use chrono::Utc;

use crate::domain::agent::AgentId;
use crate::domain::signal::{Signal, SignalId, SignalType};
use crate::domain::workflow::{WorkflowId, WorkflowRequest, WorkflowStep};

pub mod proto {
    tonic::include_proto!("vryndara.v1");
}

impl proto::Ack {
    pub fn ok() -> Self {
        Self {
            success: true,
            error: String::new(),
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
        }
    }
}

impl From<&Signal> for proto::Signal {
    fn from(signal: &Signal) -> Self {
        Self {
            id: signal.id.to_string(),
            source_agent_id: signal.source.to_string(),
            target_agent_id: signal.target.to_string(),
            r#type: signal.signal_type.to_string(),
            payload: signal.payload.clone(),
            timestamp: signal.timestamp,
            correlation_id: signal
                .correlation_id
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_default(),
        }
    }
}

impl From<proto::Signal> for Signal {
    fn from(wire: proto::Signal) -> Self {
        let id = if wire.id.is_empty() {
            SignalId::new()
        } else {
            SignalId::from(wire.id)
        };
        let timestamp = if wire.timestamp == 0 {
            Utc::now().timestamp()
        } else {
            wire.timestamp
        };
        let correlation_id = Some(wire.correlation_id)
            .filter(|c| !c.is_empty())
            .map(SignalId::from);

        Signal {
            id,
            source: AgentId::from(wire.source_agent_id),
            target: AgentId::from(wire.target_agent_id),
            signal_type: SignalType::from(wire.r#type.as_str()),
            payload: wire.payload,
            timestamp,
            correlation_id,
        }
    }
}

impl From<proto::WorkflowStep> for WorkflowStep {
    fn from(step: proto::WorkflowStep) -> Self {
        WorkflowStep::new(step.agent_id, step.task_payload, step.step_order)
    }
}

impl From<&WorkflowStep> for proto::WorkflowStep {
    fn from(step: &WorkflowStep) -> Self {
        Self {
            agent_id: step.agent_id.to_string(),
            task_payload: step.task_payload.clone(),
            step_order: step.step_order,
        }
    }
}

impl From<proto::WorkflowRequest> for WorkflowRequest {
    fn from(request: proto::WorkflowRequest) -> Self {
        let workflow_id = if request.workflow_id.is_empty() {
            WorkflowId::generate()
        } else {
            WorkflowId::new(request.workflow_id)
        };
        WorkflowRequest::new(
            workflow_id,
            request.steps.into_iter().map(WorkflowStep::from).collect(),
        )
    }
}

impl From<&WorkflowRequest> for proto::WorkflowRequest {
    fn from(request: &WorkflowRequest) -> Self {
        Self {
            workflow_id: request.workflow_id.to_string(),
            steps: request.steps.iter().map(proto::WorkflowStep::from).collect(),
        }
    }
}
