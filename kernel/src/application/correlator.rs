// Copyright (c) 2026 Vryndara contributors
// SPDX-License-Identifier: AGPL-3.0
//! Response Correlator
//!
//! Turns fire-and-forget mailbox delivery into a wait for one specific reply.
//!
//! A waiter calls [`ResponseCorrelator::expect`] with the agent it expects to
//! answer and the id of the request it sent (the token). The router calls
//! [`ResponseCorrelator::resolve`] for every `TASK_RESULT` it routes:
//!
//! - a result carrying `correlation_id` resolves the slot with that token,
//!   provided the result comes from the expected agent;
//! - a result without one resolves the oldest pending slot for its source
//!   agent, so replies from agents that do not echo tokens are matched in
//!   arrival order.
//!
//! Each slot resolves at most once. Slots are removed when resolved, and the
//! [`PendingResponse`] guard removes its slot when the wait returns or is
//! dropped, so a late reply can never land in a finished wait.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tracing::{debug, warn};

use crate::domain::agent::AgentId;
use crate::domain::signal::{Signal, SignalId};

struct Slot {
    agent: AgentId,
    seq: u64,
    response_tx: oneshot::Sender<String>,
}

#[derive(Default)]
struct Slots {
    by_token: HashMap<SignalId, Slot>,
    next_seq: u64,
}

impl Slots {
    fn oldest_for(&self, agent: &AgentId) -> Option<SignalId> {
        self.by_token
            .iter()
            .filter(|(_, slot)| &slot.agent == agent)
            .min_by_key(|(_, slot)| slot.seq)
            .map(|(token, _)| token.clone())
    }
}

#[derive(Clone, Default)]
pub struct ResponseCorrelator {
    slots: Arc<Mutex<Slots>>,
}

impl ResponseCorrelator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a slot for a reply from `agent` to the request `token`.
    ///
    /// Must be called before the request is published, otherwise a fast
    /// reply can arrive before anyone is waiting for it.
    pub fn expect(&self, agent: AgentId, token: SignalId) -> PendingResponse {
        let (response_tx, response_rx) = oneshot::channel();
        {
            let mut slots = self.slots.lock();
            let seq = slots.next_seq;
            slots.next_seq += 1;

            let slot = Slot {
                agent: agent.clone(),
                seq,
                response_tx,
            };
            if slots.by_token.insert(token.clone(), slot).is_some() {
                warn!(token = %token, "Replaced an existing correlator slot with the same token");
            }
        }

        debug!(agent_id = %agent, token = %token, "Correlator slot opened");

        PendingResponse {
            token,
            agent,
            response_rx,
            slots: self.slots.clone(),
        }
    }

    /// Offer a routed `TASK_RESULT` to the pending waiters. Returns whether a
    /// slot was resolved.
    pub fn resolve(&self, signal: &Signal) -> bool {
        if !signal.is_task_result() {
            return false;
        }

        let slot = {
            let mut slots = self.slots.lock();
            let token = match &signal.correlation_id {
                Some(token) => match slots.by_token.get(token) {
                    Some(slot) if slot.agent == signal.source => Some(token.clone()),
                    Some(slot) => {
                        warn!(
                            token = %token,
                            expected = %slot.agent,
                            source = %signal.source,
                            "TASK_RESULT token belongs to a different agent, ignoring"
                        );
                        None
                    }
                    None => None,
                },
                None => slots.oldest_for(&signal.source),
            };
            token.and_then(|token| slots.by_token.remove(&token).map(|slot| (token, slot)))
        };

        match slot {
            Some((token, slot)) => {
                debug!(agent_id = %slot.agent, token = %token, "Correlator slot resolved");
                // The waiter may have given up in the meantime.
                let _ = slot.response_tx.send(signal.payload.clone());
                true
            }
            None => false,
        }
    }

    pub fn pending_count(&self) -> usize {
        self.slots.lock().by_token.len()
    }

    pub fn pending_for(&self, agent: &AgentId) -> usize {
        self.slots
            .lock()
            .by_token
            .values()
            .filter(|slot| &slot.agent == agent)
            .count()
    }
}

/// Wait handle for one expected reply. Dropping it closes the slot.
pub struct PendingResponse {
    token: SignalId,
    agent: AgentId,
    response_rx: oneshot::Receiver<String>,
    slots: Arc<Mutex<Slots>>,
}

impl PendingResponse {
    pub fn token(&self) -> &SignalId {
        &self.token
    }

    pub fn agent(&self) -> &AgentId {
        &self.agent
    }

    /// Wait up to `timeout` for the reply payload. `None` means no reply in
    /// time; the slot is gone either way once this returns.
    pub async fn wait(mut self, timeout: Duration) -> Option<String> {
        match tokio::time::timeout(timeout, &mut self.response_rx).await {
            Ok(Ok(payload)) => Some(payload),
            Ok(Err(_)) => None,
            Err(_) => {
                debug!(agent_id = %self.agent, token = %self.token, "Correlator slot timed out");
                None
            }
        }
    }
}

impl Drop for PendingResponse {
    fn drop(&mut self) {
        self.slots.lock().by_token.remove(&self.token);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result_from(agent: &str, payload: &str) -> Signal {
        Signal::new(agent, "vryndara-orchestrator", "TASK_RESULT".into(), payload)
    }

    #[tokio::test]
    async fn test_token_resolves_exact_slot() {
        let correlator = ResponseCorrelator::new();
        let first = correlator.expect(AgentId::from("z"), SignalId::from("req-1"));
        let second = correlator.expect(AgentId::from("z"), SignalId::from("req-2"));

        let reply = result_from("z", "for two").with_correlation_id(SignalId::from("req-2"));
        assert!(correlator.resolve(&reply));

        assert_eq!(second.wait(Duration::from_millis(50)).await.as_deref(), Some("for two"));
        assert_eq!(first.wait(Duration::from_millis(50)).await, None);
        assert_eq!(correlator.pending_count(), 0);
    }

    #[tokio::test]
    async fn test_untokened_reply_resolves_oldest_slot() {
        let correlator = ResponseCorrelator::new();
        let first = correlator.expect(AgentId::from("z"), SignalId::from("req-1"));
        let second = correlator.expect(AgentId::from("z"), SignalId::from("req-2"));

        assert!(correlator.resolve(&result_from("z", "a")));
        assert_eq!(correlator.pending_for(&AgentId::from("z")), 1);
        assert!(correlator.resolve(&result_from("z", "b")));

        assert_eq!(first.wait(Duration::from_millis(50)).await.as_deref(), Some("a"));
        assert_eq!(second.wait(Duration::from_millis(50)).await.as_deref(), Some("b"));
    }

    #[tokio::test]
    async fn test_resolves_at_most_once() {
        let correlator = ResponseCorrelator::new();
        let pending = correlator.expect(AgentId::from("x"), SignalId::from("req"));

        let reply = result_from("x", "R1").with_correlation_id(SignalId::from("req"));
        assert!(correlator.resolve(&reply));
        assert!(!correlator.resolve(&reply));
        assert!(!correlator.resolve(&result_from("x", "R1")));

        assert_eq!(pending.wait(Duration::from_millis(50)).await.as_deref(), Some("R1"));
    }

    #[tokio::test]
    async fn test_timeout_removes_slot() {
        let correlator = ResponseCorrelator::new();
        let pending = correlator.expect(AgentId::from("x"), SignalId::from("req"));

        assert_eq!(pending.wait(Duration::from_millis(20)).await, None);
        assert_eq!(correlator.pending_count(), 0);
        assert!(!correlator.resolve(&result_from("x", "late")));
    }

    #[tokio::test]
    async fn test_ignores_other_agents_and_types() {
        let correlator = ResponseCorrelator::new();
        let _pending = correlator.expect(AgentId::from("x"), SignalId::from("req"));

        let wrong_agent = result_from("y", "nope").with_correlation_id(SignalId::from("req"));
        assert!(!correlator.resolve(&wrong_agent));

        let request = Signal::task_request("x", "vryndara-orchestrator", "nope");
        assert!(!correlator.resolve(&request));
        assert_eq!(correlator.pending_count(), 1);
    }
}
