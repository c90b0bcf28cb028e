// Copyright (c) 2026 Vryndara contributors
// SPDX-License-Identifier: AGPL-3.0
//! Workflow Orchestrator
//!
//! Runs a [`WorkflowRequest`] step by step:
//!
//! ```text
//! INIT -> { SEND -> WAIT -> (RESOLVED | TIMED_OUT | UNDELIVERABLE) }* -> COMPLETED
//! ```
//!
//! Steps run in ascending `step_order`, never overlapping. Each step opens a
//! correlator slot keyed by the outgoing request id, publishes a
//! `TASK_REQUEST` from the orchestrator's sentinel identity and waits for
//! the reply. A reply becomes the baton for the next step; a timeout or an
//! undeliverable step resets the baton and the run moves on.
//!
//! A workflow always completes. Callers that care about partial failure
//! inspect the returned [`WorkflowReport`].

use chrono::Utc;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

use crate::application::router::MailboxRouter;
use crate::domain::events::KernelEvent;
use crate::domain::signal::Signal;
use crate::domain::workflow::{
    ContextBaton, StepOutcome, StepReport, WorkflowReport, WorkflowRequest, WorkflowStep,
};
use crate::infrastructure::event_bus::EventBus;

pub struct WorkflowOrchestrator {
    router: Arc<MailboxRouter>,
    event_bus: EventBus,
    step_timeout: Duration,
}

impl WorkflowOrchestrator {
    pub fn new(router: Arc<MailboxRouter>, event_bus: EventBus, step_timeout: Duration) -> Self {
        Self {
            router,
            event_bus,
            step_timeout,
        }
    }

    pub fn step_timeout(&self) -> Duration {
        self.step_timeout
    }

    pub async fn execute(&self, request: WorkflowRequest) -> WorkflowReport {
        let workflow_id = request.workflow_id.clone();
        let steps = request.ordered_steps();
        let started_at = Utc::now();

        info!(workflow_id = %workflow_id, steps = steps.len(), "Starting workflow");
        self.event_bus.publish(KernelEvent::WorkflowStarted {
            workflow_id: workflow_id.clone(),
            step_count: steps.len(),
            started_at,
        });

        let mut baton = ContextBaton::empty();
        let mut reports = Vec::with_capacity(steps.len());

        for step in &steps {
            let report = self.run_step(&request, step, &baton).await;
            match &report.outcome {
                StepOutcome::Resolved { payload } => baton.carry(payload.clone()),
                StepOutcome::TimedOut | StepOutcome::Undeliverable { .. } => baton.reset(),
            }
            reports.push(report);
        }

        let report = WorkflowReport {
            workflow_id: workflow_id.clone(),
            steps: reports,
            started_at,
            completed_at: Utc::now(),
        };

        info!(
            workflow_id = %workflow_id,
            resolved = report.resolved_count(),
            total = report.steps.len(),
            "Workflow completed"
        );
        self.event_bus.publish(KernelEvent::WorkflowCompleted {
            workflow_id,
            resolved_steps: report.resolved_count(),
            total_steps: report.steps.len(),
            completed_at: report.completed_at,
        });

        report
    }

    async fn run_step(
        &self,
        request: &WorkflowRequest,
        step: &WorkflowStep,
        baton: &ContextBaton,
    ) -> StepReport {
        let workflow_id = &request.workflow_id;
        let payload = baton.apply(&step.task_payload);
        let signal = Signal::task_request(
            self.router.orchestrator_id().clone(),
            step.agent_id.clone(),
            payload.clone(),
        );
        let started = Instant::now();

        // Open the slot before publishing so a fast reply is not missed.
        let pending = self
            .router
            .correlator()
            .expect(step.agent_id.clone(), signal.id.clone());

        info!(
            workflow_id = %workflow_id,
            step_order = step.step_order,
            agent_id = %step.agent_id,
            signal_id = %signal.id,
            "Dispatching workflow step"
        );
        let signal_id = signal.id.clone();

        let outcome = match self.router.publish(signal) {
            Ok(_) => {
                self.event_bus.publish(KernelEvent::StepDispatched {
                    workflow_id: workflow_id.clone(),
                    step_order: step.step_order,
                    agent_id: step.agent_id.clone(),
                    signal_id,
                });

                match pending.wait(self.step_timeout).await {
                    Some(result) => {
                        let elapsed = started.elapsed();
                        info!(
                            workflow_id = %workflow_id,
                            step_order = step.step_order,
                            agent_id = %step.agent_id,
                            elapsed_ms = elapsed.as_millis() as u64,
                            "Workflow step resolved"
                        );
                        self.event_bus.publish(KernelEvent::StepResolved {
                            workflow_id: workflow_id.clone(),
                            step_order: step.step_order,
                            agent_id: step.agent_id.clone(),
                            elapsed_ms: elapsed.as_millis() as u64,
                        });
                        StepOutcome::Resolved { payload: result }
                    }
                    None => {
                        warn!(
                            workflow_id = %workflow_id,
                            step_order = step.step_order,
                            agent_id = %step.agent_id,
                            timeout_secs = self.step_timeout.as_secs_f64(),
                            "Workflow step timed out, dropping context"
                        );
                        self.event_bus.publish(KernelEvent::StepTimedOut {
                            workflow_id: workflow_id.clone(),
                            step_order: step.step_order,
                            agent_id: step.agent_id.clone(),
                            timeout_ms: self.step_timeout.as_millis() as u64,
                        });
                        StepOutcome::TimedOut
                    }
                }
            }
            Err(e) => {
                drop(pending);
                warn!(
                    workflow_id = %workflow_id,
                    step_order = step.step_order,
                    agent_id = %step.agent_id,
                    error = %e,
                    "Workflow step undeliverable, dropping context"
                );
                self.event_bus.publish(KernelEvent::StepUndeliverable {
                    workflow_id: workflow_id.clone(),
                    step_order: step.step_order,
                    agent_id: step.agent_id.clone(),
                    reason: e.to_string(),
                });
                StepOutcome::Undeliverable {
                    reason: e.to_string(),
                }
            }
        };

        StepReport {
            step_order: step.step_order,
            agent_id: step.agent_id.clone(),
            dispatched_payload: payload,
            outcome,
            elapsed: started.elapsed(),
        }
    }
}
