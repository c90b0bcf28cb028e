// Copyright (c) 2026 Vryndara contributors
// SPDX-License-Identifier: AGPL-3.0

//! Mailbox router behaviour seen from outside the crate:
//! - per-mailbox FIFO delivery
//! - failed Ack for unknown targets
//! - the register / publish / subscribe round trip for `coder-alpha`
//! - duplicate TASK_RESULTs resolving at most one wait
//! - event log entries written for every publish
//! - delivery unaffected by a failing event log

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use vryndara_kernel::application::kernel::Kernel;
use vryndara_kernel::application::repository_factory::EventLogBackend;
use vryndara_kernel::application::router::{RouteOutcome, RoutingError};
use vryndara_kernel::domain::agent::AgentId;
use vryndara_kernel::domain::kernel_config::KernelConfigManifest;
use vryndara_kernel::domain::repository::{EventLogRepository, RepositoryError};
use vryndara_kernel::domain::signal::{EventLogEntry, Signal, SignalType};

fn kernel() -> Kernel {
    Kernel::in_memory(KernelConfigManifest::default())
}

/// Event log whose every append fails, like an unreachable database.
struct FailingRepository;

#[async_trait]
impl EventLogRepository for FailingRepository {
    async fn append(&self, _entry: &EventLogEntry) -> Result<(), RepositoryError> {
        Err(RepositoryError::Database("connection refused".to_string()))
    }

    async fn find_by_id(&self, _id: &str) -> Result<Option<EventLogEntry>, RepositoryError> {
        Ok(None)
    }

    async fn list_recent(&self, _limit: usize) -> Result<Vec<EventLogEntry>, RepositoryError> {
        Ok(vec![])
    }
}

#[tokio::test]
async fn test_coder_alpha_receives_first_request() {
    let kernel = kernel();
    let router = kernel.router();

    router.register(AgentId::from("coder-alpha"), vec!["python.clean"]);
    let outcome = router
        .publish(Signal::task_request("User", "coder-alpha", "add two numbers"))
        .unwrap();
    assert_eq!(outcome, RouteOutcome::Delivered);

    let subscription = router.subscribe(AgentId::from("coder-alpha"));
    let first = tokio::time::timeout(Duration::from_secs(1), subscription.recv())
        .await
        .expect("signal should be queued");

    assert_eq!(first.source.as_str(), "User");
    assert_eq!(first.signal_type, SignalType::TaskRequest);
    assert_eq!(first.payload, "add two numbers");
}

#[tokio::test]
async fn test_fifo_per_mailbox_across_interleaved_publishes() {
    let kernel = kernel();
    let router = kernel.router();
    router.register(AgentId::from("a"), Vec::<String>::new());
    router.register(AgentId::from("b"), Vec::<String>::new());

    for i in 0..20 {
        let target = if i % 3 == 0 { "b" } else { "a" };
        router
            .publish(Signal::task_request("u", target, i.to_string()))
            .unwrap();
    }

    let a = router.subscribe(AgentId::from("a"));
    let b = router.subscribe(AgentId::from("b"));

    let drain = |sub: &vryndara_kernel::application::router::Subscription| {
        let mut out = Vec::new();
        while let Some(signal) = sub.try_recv() {
            out.push(signal.payload.parse::<u32>().unwrap());
        }
        out
    };

    let from_a = drain(&a);
    let from_b = drain(&b);
    assert!(from_a.windows(2).all(|w| w[0] < w[1]));
    assert!(from_b.windows(2).all(|w| w[0] < w[1]));
    assert_eq!(from_a.len() + from_b.len(), 20);
}

#[tokio::test]
async fn test_subscriber_wakes_on_publish() {
    let kernel = kernel();
    let router = kernel.router().clone();
    let subscription = router.subscribe(AgentId::from("sleeper"));

    let waiter = tokio::spawn(async move { subscription.recv().await });
    tokio::time::sleep(Duration::from_millis(20)).await;
    router
        .publish(Signal::task_request("u", "sleeper", "wake up"))
        .unwrap();

    let signal = tokio::time::timeout(Duration::from_secs(1), waiter)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(signal.payload, "wake up");
}

#[tokio::test]
async fn test_unknown_target_is_reported_not_raised() {
    let kernel = kernel();

    match kernel
        .router()
        .publish(Signal::task_request("User", "nobody-home", "hello"))
    {
        Err(RoutingError::TargetOffline(target)) => assert_eq!(target.as_str(), "nobody-home"),
        other => panic!("Expected TargetOffline, got {:?}", other),
    }
}

#[tokio::test]
async fn test_duplicate_task_result_resolves_once() {
    let kernel = kernel();
    let router = kernel.router();
    let correlator = router.correlator();

    let request = Signal::task_request("vryndara-orchestrator", "x", "work");
    let pending = correlator.expect(AgentId::from("x"), request.id.clone());

    let reply = Signal::reply_to(&request, "R1");
    router.publish(reply.clone()).unwrap();
    // Second copy: absorbed by the sentinel, nothing left to resolve.
    assert_eq!(router.publish(reply).unwrap(), RouteOutcome::Absorbed);

    assert_eq!(
        pending.wait(Duration::from_millis(100)).await.as_deref(),
        Some("R1")
    );
    assert_eq!(correlator.pending_count(), 0);
}

#[tokio::test]
async fn test_every_publish_reaches_the_event_log() {
    let kernel = kernel();
    let repository = kernel.event_log_repository().clone();
    kernel.router().register(AgentId::from("a"), vec!["x"]);

    let delivered = Signal::task_request("u", "a", "one");
    let undeliverable = Signal::task_request("u", "ghost", "two");
    kernel.router().publish(delivered.clone()).unwrap();
    let _ = kernel.router().publish(undeliverable.clone());

    kernel.shutdown().await;

    assert!(repository
        .find_by_id(delivered.id.as_str())
        .await
        .unwrap()
        .is_some());
    assert!(repository
        .find_by_id(undeliverable.id.as_str())
        .await
        .unwrap()
        .is_some());
}

#[tokio::test]
async fn test_failing_event_log_does_not_affect_delivery() {
    let kernel = Kernel::with_repository(
        KernelConfigManifest::default(),
        Arc::new(FailingRepository),
        EventLogBackend::InMemory,
    );
    let router = kernel.router();
    router.register(AgentId::from("a"), vec!["x"]);
    let subscription = router.subscribe(AgentId::from("a"));

    for payload in ["first", "second"] {
        let outcome = router
            .publish(Signal::task_request("u", "a", payload))
            .unwrap();
        assert_eq!(outcome, RouteOutcome::Delivered);

        let received = tokio::time::timeout(Duration::from_secs(1), subscription.recv())
            .await
            .expect("signal should be delivered despite the failing log");
        assert_eq!(received.payload, payload);
    }

    // Both appends were attempted and failed without surfacing to publishers.
    let stats = kernel.event_log().stats();
    for _ in 0..50 {
        if stats.failed.load(Ordering::Relaxed) == 2 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(stats.failed.load(Ordering::Relaxed), 2);
}
