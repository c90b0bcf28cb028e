// Copyright (c) 2026 Vryndara contributors
// SPDX-License-Identifier: AGPL-3.0
//! # Mailbox
//!
//! Unbounded FIFO queue of signals owned by one agent identity.
//!
//! Producers never wait: [`Mailbox::push`] appends and wakes the consumer.
//! The consumer awaits [`Mailbox::recv`], which suspends while the queue is
//! empty. `recv` is cancel-safe (a signal is only removed from the queue in
//! the same synchronous step that returns it), so it can sit inside
//! `tokio::select!` next to a disconnect check.
//!
//! A consumer that took a signal but could not hand it on puts it back with
//! [`Mailbox::requeue_front`], which preserves arrival order.

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Notify;

use crate::domain::agent::AgentId;
use crate::domain::signal::Signal;

#[derive(Debug)]
pub struct Mailbox {
    owner: AgentId,
    queue: Mutex<VecDeque<Signal>>,
    notify: Notify,
    consumers: AtomicUsize,
}

impl Mailbox {
    pub fn new(owner: AgentId) -> Self {
        Self {
            owner,
            queue: Mutex::new(VecDeque::new()),
            notify: Notify::new(),
            consumers: AtomicUsize::new(0),
        }
    }

    pub fn owner(&self) -> &AgentId {
        &self.owner
    }

    pub fn push(&self, signal: Signal) {
        self.queue.lock().push_back(signal);
        self.notify.notify_one();
    }

    pub fn requeue_front(&self, signal: Signal) {
        self.queue.lock().push_front(signal);
        self.notify.notify_one();
    }

    pub fn try_recv(&self) -> Option<Signal> {
        self.queue.lock().pop_front()
    }

    /// Wait for the next signal in arrival order.
    pub async fn recv(&self) -> Signal {
        loop {
            let notified = self.notify.notified();
            tokio::pin!(notified);
            // Register interest before checking the queue so a push that
            // lands between the check and the await is not missed.
            notified.as_mut().enable();

            if let Some(signal) = self.try_recv() {
                return signal;
            }

            notified.await;
        }
    }

    pub fn len(&self) -> usize {
        self.queue.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.lock().is_empty()
    }

    /// Number of live consumers after attaching this one.
    pub(crate) fn attach_consumer(&self) -> usize {
        self.consumers.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub(crate) fn detach_consumer(&self) {
        self.consumers.fetch_sub(1, Ordering::SeqCst);
    }

    pub fn consumer_count(&self) -> usize {
        self.consumers.load(Ordering::SeqCst)
    }
}
