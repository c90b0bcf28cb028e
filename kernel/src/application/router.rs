// Copyright (c) 2026 Vryndara contributors
// SPDX-License-Identifier: AGPL-3.0
//! Mailbox Router
//!
//! Owns the agent registry and one [`Mailbox`] per agent identity.
//!
//! # Publish path
//!
//! 1. Hand a copy of the signal to the event log writer (never waits).
//! 2. If it is a `TASK_RESULT`, offer it to the [`ResponseCorrelator`].
//!    This does not short-circuit delivery.
//! 3. Deliver to the target's mailbox; absorb signals addressed to the
//!    orchestrator sentinel; otherwise fail with [`RoutingError::TargetOffline`].
//!
//! Mailboxes are created on first register or subscribe and live for the
//! lifetime of the process.

use chrono::Utc;
use futures::stream::{self, Stream};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::application::correlator::ResponseCorrelator;
use crate::application::event_log_writer::EventLogHandle;
use crate::domain::agent::{AgentId, AgentRegistration};
use crate::domain::events::KernelEvent;
use crate::domain::signal::Signal;
use crate::infrastructure::event_bus::EventBus;
use crate::infrastructure::mailbox::Mailbox;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RoutingError {
    #[error("Target offline: {0}")]
    TargetOffline(AgentId),
}

/// What happened to a successfully published signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteOutcome {
    Delivered,
    /// Addressed to the orchestrator sentinel; accepted, not queued.
    Absorbed,
}

/// Snapshot row for status endpoints.
#[derive(Debug, Clone)]
pub struct AgentStatus {
    pub registration: AgentRegistration,
    pub mailbox_depth: usize,
    pub subscribers: usize,
}

pub struct MailboxRouter {
    registry: RwLock<HashMap<AgentId, AgentRegistration>>,
    mailboxes: RwLock<HashMap<AgentId, Arc<Mailbox>>>,
    correlator: ResponseCorrelator,
    event_log: EventLogHandle,
    event_bus: EventBus,
    orchestrator_id: AgentId,
}

impl MailboxRouter {
    pub fn new(
        correlator: ResponseCorrelator,
        event_log: EventLogHandle,
        event_bus: EventBus,
        orchestrator_id: AgentId,
    ) -> Self {
        Self {
            registry: RwLock::new(HashMap::new()),
            mailboxes: RwLock::new(HashMap::new()),
            correlator,
            event_log,
            event_bus,
            orchestrator_id,
        }
    }

    pub fn correlator(&self) -> &ResponseCorrelator {
        &self.correlator
    }

    pub fn orchestrator_id(&self) -> &AgentId {
        &self.orchestrator_id
    }

    /// Record the agent and make sure its mailbox exists. Re-registering
    /// replaces the capability set and keeps the queued signals.
    pub fn register<I, S>(&self, agent_id: AgentId, capabilities: I) -> AgentRegistration
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut registration = AgentRegistration::new(agent_id.clone(), capabilities);
        let replaced = {
            let mut registry = self.registry.write();
            if let Some(previous) = registry.get(&agent_id) {
                registration.registered_at = previous.registered_at;
            }
            registry.insert(agent_id.clone(), registration.clone()).is_some()
        };
        self.mailbox_for(&agent_id);

        info!(
            agent_id = %agent_id,
            capabilities = ?registration.capabilities,
            reregistered = replaced,
            "Agent registered"
        );

        self.event_bus.publish(KernelEvent::AgentRegistered {
            agent_id,
            capabilities: registration.capabilities.iter().cloned().collect(),
            registered_at: Utc::now(),
        });

        registration
    }

    pub fn publish(&self, signal: Signal) -> Result<RouteOutcome, RoutingError> {
        self.event_log.record(&signal);

        if signal.is_task_result() && self.correlator.resolve(&signal) {
            debug!(signal_id = %signal.id, source = %signal.source, "TASK_RESULT resolved a pending wait");
        }

        let mailbox = self.mailboxes.read().get(&signal.target).cloned();
        match mailbox {
            Some(mailbox) => {
                debug!(
                    signal_id = %signal.id,
                    source = %signal.source,
                    target = %signal.target,
                    signal_type = %signal.signal_type,
                    "Routing signal"
                );
                let event = KernelEvent::SignalRouted {
                    signal_id: signal.id.clone(),
                    source: signal.source.clone(),
                    target: signal.target.clone(),
                    signal_type: signal.signal_type.clone(),
                    routed_at: Utc::now(),
                };
                mailbox.push(signal);
                self.event_bus.publish(event);
                Ok(RouteOutcome::Delivered)
            }
            None if signal.target == self.orchestrator_id => {
                debug!(signal_id = %signal.id, source = %signal.source, "Signal absorbed by orchestrator");
                Ok(RouteOutcome::Absorbed)
            }
            None => {
                let error = RoutingError::TargetOffline(signal.target.clone());
                warn!(
                    signal_id = %signal.id,
                    source = %signal.source,
                    target = %signal.target,
                    "Target offline, signal not delivered"
                );
                self.event_bus.publish(KernelEvent::SignalUndeliverable {
                    signal_id: signal.id,
                    source: signal.source,
                    target: signal.target,
                    reason: error.to_string(),
                });
                Err(error)
            }
        }
    }

    /// Attach a consumer to the agent's mailbox, creating it if needed.
    pub fn subscribe(&self, agent_id: AgentId) -> Subscription {
        let mailbox = self.mailbox_for(&agent_id);
        let consumers = mailbox.attach_consumer();
        if consumers > 1 {
            warn!(
                agent_id = %agent_id,
                consumers,
                "Multiple subscribers on one mailbox; they will compete for signals"
            );
        }

        info!(agent_id = %agent_id, queued = mailbox.len(), "Agent subscribed");
        self.event_bus.publish(KernelEvent::AgentSubscribed {
            agent_id,
            subscribed_at: Utc::now(),
        });

        Subscription { mailbox }
    }

    pub fn is_registered(&self, agent_id: &AgentId) -> bool {
        self.registry.read().contains_key(agent_id)
    }

    pub fn has_mailbox(&self, agent_id: &AgentId) -> bool {
        self.mailboxes.read().contains_key(agent_id)
    }

    pub fn mailbox_depth(&self, agent_id: &AgentId) -> Option<usize> {
        self.mailboxes.read().get(agent_id).map(|m| m.len())
    }

    /// Registered agents sorted by id.
    pub fn list_agents(&self) -> Vec<AgentStatus> {
        let registry = self.registry.read();
        let mailboxes = self.mailboxes.read();

        let mut agents: Vec<_> = registry
            .values()
            .map(|registration| {
                let mailbox = mailboxes.get(&registration.id);
                AgentStatus {
                    registration: registration.clone(),
                    mailbox_depth: mailbox.map_or(0, |m| m.len()),
                    subscribers: mailbox.map_or(0, |m| m.consumer_count()),
                }
            })
            .collect();
        agents.sort_by(|a, b| a.registration.id.cmp(&b.registration.id));
        agents
    }

    pub fn agent_count(&self) -> usize {
        self.registry.read().len()
    }

    fn mailbox_for(&self, agent_id: &AgentId) -> Arc<Mailbox> {
        if let Some(mailbox) = self.mailboxes.read().get(agent_id) {
            return mailbox.clone();
        }
        self.mailboxes
            .write()
            .entry(agent_id.clone())
            .or_insert_with(|| Arc::new(Mailbox::new(agent_id.clone())))
            .clone()
    }
}

/// A live consumer of one agent's mailbox. Dropping it detaches.
pub struct Subscription {
    mailbox: Arc<Mailbox>,
}

impl Subscription {
    pub fn agent_id(&self) -> &AgentId {
        self.mailbox.owner()
    }

    /// Next signal in FIFO order; suspends while the mailbox is empty.
    /// Cancel-safe.
    pub async fn recv(&self) -> Signal {
        self.mailbox.recv().await
    }

    pub fn try_recv(&self) -> Option<Signal> {
        self.mailbox.try_recv()
    }

    /// Return a signal that could not be handed on, ahead of everything else.
    pub fn requeue(&self, signal: Signal) {
        self.mailbox.requeue_front(signal);
    }

    /// Endless stream of signals; ends only when dropped.
    pub fn into_stream(self) -> impl Stream<Item = Signal> + Send + 'static {
        stream::unfold(self, |subscription| async move {
            let signal = subscription.recv().await;
            Some((signal, subscription))
        })
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.mailbox.detach_consumer();
        debug!(agent_id = %self.mailbox.owner(), "Subscriber detached");
    }
}
