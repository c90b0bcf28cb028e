// Copyright (c) 2026 Vryndara contributors
// SPDX-License-Identifier: AGPL-3.0
//! # Workflow Domain
//!
//! A workflow is an ordered chain of task requests. Each step names the agent
//! that should do the work and the task text; the orchestrator runs the steps
//! one at a time and hands every step's result to the next one as context
//! (the *baton*).
//!
//! Steps arrive unordered and carry an explicit `step_order`. Ordering is a
//! stable sort, so steps sharing an order keep their submission order.
//!
//! There is no failed terminal state: a workflow always completes. Per-step
//! outcomes are recorded in the [`WorkflowReport`] so callers can tell a
//! clean run from one where every step timed out.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use crate::domain::agent::AgentId;

/// Header placed between a step's own task and the previous step's result.
pub const CONTEXT_HEADER: &str = "[Context from previous step]";

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkflowId(String);

impl WorkflowId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// `wf-<unix seconds>`, the id the kernel assigns when the caller gives none.
    pub fn generate() -> Self {
        Self(format!("wf-{}", Utc::now().timestamp()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for WorkflowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for WorkflowId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowStep {
    pub agent_id: AgentId,
    #[serde(alias = "task")]
    pub task_payload: String,
    #[serde(alias = "order")]
    pub step_order: i32,
}

impl WorkflowStep {
    pub fn new(agent_id: impl Into<AgentId>, task_payload: impl Into<String>, step_order: i32) -> Self {
        Self {
            agent_id: agent_id.into(),
            task_payload: task_payload.into(),
            step_order,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowRequest {
    #[serde(default = "WorkflowId::generate")]
    pub workflow_id: WorkflowId,
    #[serde(default)]
    pub steps: Vec<WorkflowStep>,
}

impl WorkflowRequest {
    pub fn new(workflow_id: impl Into<WorkflowId>, steps: Vec<WorkflowStep>) -> Self {
        Self {
            workflow_id: workflow_id.into(),
            steps,
        }
    }

    /// Steps in execution order (ascending `step_order`, ties keep input order).
    pub fn ordered_steps(&self) -> Vec<WorkflowStep> {
        let mut steps = self.steps.clone();
        steps.sort_by_key(|s| s.step_order);
        steps
    }
}

/// Result text carried from one step to the next.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContextBaton(Option<String>);

impl ContextBaton {
    pub fn empty() -> Self {
        Self(None)
    }

    pub fn is_empty(&self) -> bool {
        self.0.as_deref().map_or(true, str::is_empty)
    }

    pub fn carry(&mut self, result: String) {
        self.0 = Some(result);
    }

    pub fn reset(&mut self) {
        self.0 = None;
    }

    pub fn as_deref(&self) -> Option<&str> {
        self.0.as_deref()
    }

    /// Payload actually dispatched for `task`: the task alone when the baton
    /// is empty, otherwise the task followed by the previous result.
    pub fn apply(&self, task: &str) -> String {
        match self.0.as_deref() {
            Some(context) if !context.is_empty() => {
                format!("{task}\n\n{CONTEXT_HEADER}\n{context}")
            }
            _ => task.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StepOutcome {
    Resolved { payload: String },
    TimedOut,
    Undeliverable { reason: String },
}

impl StepOutcome {
    pub fn is_resolved(&self) -> bool {
        matches!(self, StepOutcome::Resolved { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepReport {
    pub step_order: i32,
    pub agent_id: AgentId,
    /// Payload as dispatched, baton included
    pub dispatched_payload: String,
    pub outcome: StepOutcome,
    #[serde(with = "duration_millis")]
    pub elapsed: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowReport {
    pub workflow_id: WorkflowId,
    pub steps: Vec<StepReport>,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
}

impl WorkflowReport {
    pub fn resolved_count(&self) -> usize {
        self.steps.iter().filter(|s| s.outcome.is_resolved()).count()
    }

    pub fn all_resolved(&self) -> bool {
        self.resolved_count() == self.steps.len()
    }

    /// Result of the last step, if it resolved.
    pub fn final_output(&self) -> Option<&str> {
        match self.steps.last().map(|s| &s.outcome) {
            Some(StepOutcome::Resolved { payload }) => Some(payload),
            _ => None,
        }
    }

    /// Text carried in the completion Ack.
    pub fn completion_message(&self) -> String {
        format!("Completed: {}", self.workflow_id)
    }
}

mod duration_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(d)?))
    }
}
