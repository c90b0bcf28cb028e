// Copyright (c) 2026 Vryndara contributors
// SPDX-License-Identifier: AGPL-3.0

//! HTTP gateway tests driven through `tower::ServiceExt::oneshot`.

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use std::time::Duration;
use tower::ServiceExt;

use vryndara_kernel::application::kernel::Kernel;
use vryndara_kernel::domain::agent::AgentId;
use vryndara_kernel::domain::kernel_config::KernelConfigManifest;
use vryndara_kernel::presentation::api::app;

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_health_reports_agents() {
    let kernel = Kernel::in_memory(KernelConfigManifest::default());
    kernel.router().register(AgentId::from("a"), vec!["x"]);

    let (status, body) = send(app(kernel), get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["agents"], 1);
}

#[tokio::test]
async fn test_publish_signal_delivers_or_404s() {
    let kernel = Kernel::in_memory(KernelConfigManifest::default());
    kernel.router().register(AgentId::from("coder-alpha"), vec!["python.clean"]);

    let (status, body) = send(
        app(kernel.clone()),
        post_json(
            "/api/v1/signals",
            json!({"source": "User", "target": "coder-alpha", "payload": "add two numbers"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(kernel.router().mailbox_depth(&AgentId::from("coder-alpha")), Some(1));

    let (status, body) = send(
        app(kernel),
        post_json(
            "/api/v1/signals",
            json!({"source": "User", "target": "ghost", "type": "PING", "payload": ""}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Target offline: ghost");
}

#[tokio::test]
async fn test_list_agents_shows_mailbox_depth() {
    let kernel = Kernel::in_memory(KernelConfigManifest::default());
    kernel.router().register(AgentId::from("b"), vec!["render"]);
    kernel.router().register(AgentId::from("a"), vec!["search"]);
    kernel
        .router()
        .publish(vryndara_kernel::domain::signal::Signal::task_request("u", "b", "x"))
        .unwrap();

    let (status, body) = send(app(kernel), get("/api/v1/agents")).await;
    assert_eq!(status, StatusCode::OK);

    let agents = body.as_array().unwrap();
    assert_eq!(agents.len(), 2);
    assert_eq!(agents[0]["id"], "a");
    assert_eq!(agents[1]["id"], "b");
    assert_eq!(agents[1]["mailbox_depth"], 1);
    assert_eq!(agents[1]["capabilities"], json!(["render"]));
}

#[tokio::test]
async fn test_workflow_submission_starts_in_background() {
    let kernel = Kernel::in_memory(KernelConfigManifest::default());
    let subscription = kernel.router().subscribe(AgentId::from("researcher-1"));

    let (status, body) = send(
        app(kernel.clone()),
        post_json(
            "/api/v1/workflow",
            json!({"steps": [{"agent_id": "researcher-1", "task": "Great Wall facts", "order": 1}]}),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(body["status"], "started");
    assert!(body["id"].as_str().unwrap().starts_with("wf-"));

    let dispatched = tokio::time::timeout(Duration::from_secs(2), subscription.recv())
        .await
        .unwrap();
    assert_eq!(dispatched.payload, "Great Wall facts");
    assert_eq!(dispatched.source.as_str(), "vryndara-orchestrator");
}

#[tokio::test]
async fn test_workflow_submission_rejects_empty_agent() {
    let kernel = Kernel::in_memory(KernelConfigManifest::default());

    let (status, body) = send(
        app(kernel),
        post_json(
            "/api/v1/workflow",
            json!({"steps": [{"agent_id": "", "task": "x", "order": 1}]}),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "rejected");
}

#[tokio::test]
async fn test_recent_log_lists_newest_first() {
    let kernel = Kernel::in_memory(KernelConfigManifest::default());
    kernel.router().register(AgentId::from("a"), vec!["x"]);
    for payload in ["first", "second"] {
        kernel
            .router()
            .publish(vryndara_kernel::domain::signal::Signal::task_request("u", "a", payload))
            .unwrap();
    }
    // Let the background writer catch up.
    tokio::time::sleep(Duration::from_millis(50)).await;

    let (status, body) = send(app(kernel), get("/api/v1/log?limit=1")).await;
    assert_eq!(status, StatusCode::OK);
    let entries = body.as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["payload"], "second");
    assert_eq!(entries[0]["type"], "TASK_REQUEST");
}

#[tokio::test]
async fn test_event_stream_ends_when_kernel_closes_streams() {
    let kernel = Kernel::in_memory(KernelConfigManifest::default());

    let response = app(kernel.clone()).oneshot(get("/api/v1/events")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    kernel.close_streams();
    let body = tokio::time::timeout(
        Duration::from_secs(2),
        axum::body::to_bytes(response.into_body(), usize::MAX),
    )
    .await
    .expect("event stream should end after close_streams");
    assert!(body.is_ok());
}
