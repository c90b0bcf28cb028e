// Copyright (c) 2026 Vryndara contributors
// SPDX-License-Identifier: AGPL-3.0
//! HTTP gateway
//!
//! JSON front door for callers that do not speak gRPC (dashboards, scripts,
//! the voice front end):
//!
//! | Method | Path | |
//! |--------|------|-|
//! | GET  | `/health` | liveness, uptime, agent count |
//! | GET  | `/api/v1/agents` | registered agents and mailbox depth |
//! | POST | `/api/v1/signals` | publish a signal (404 when the target is offline) |
//! | POST | `/api/v1/workflow` | start a workflow in the background (202) |
//! | GET  | `/api/v1/events` | SSE feed of kernel events |
//! | GET  | `/api/v1/log` | most recent event log entries |

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive},
        IntoResponse, Sse,
    },
    routing::{get, post},
    Json, Router,
};
use futures::stream::Stream;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;
use tracing::{error, info};

use crate::application::kernel::Kernel;
use crate::domain::signal::{Signal, SignalId, SignalType};
use crate::infrastructure::workflow_parser::WorkflowSubmission;

const DEFAULT_LOG_LIMIT: usize = 50;
const MAX_LOG_LIMIT: usize = 1000;

pub fn app(kernel: Kernel) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/v1/agents", get(list_agents))
        .route("/api/v1/signals", post(publish_signal))
        .route("/api/v1/workflow", post(start_workflow))
        .route("/api/v1/events", get(stream_events))
        .route("/api/v1/log", get(recent_log))
        .with_state(kernel)
}

async fn health(State(kernel): State<Kernel>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "uptime_seconds": kernel.uptime().as_secs(),
        "agents": kernel.router().agent_count(),
        "event_log": kernel.event_log_backend().to_string(),
    }))
}

#[derive(Debug, Serialize)]
struct AgentView {
    id: String,
    capabilities: Vec<String>,
    registered_at: chrono::DateTime<chrono::Utc>,
    mailbox_depth: usize,
    subscribers: usize,
}

async fn list_agents(State(kernel): State<Kernel>) -> impl IntoResponse {
    let agents: Vec<AgentView> = kernel
        .router()
        .list_agents()
        .into_iter()
        .map(|status| AgentView {
            id: status.registration.id.to_string(),
            capabilities: status.registration.capabilities.into_iter().collect(),
            registered_at: status.registration.registered_at,
            mailbox_depth: status.mailbox_depth,
            subscribers: status.subscribers,
        })
        .collect();
    Json(agents)
}

#[derive(Debug, Deserialize)]
pub struct SignalSubmission {
    pub source: String,
    pub target: String,
    #[serde(rename = "type", default = "default_signal_type")]
    pub signal_type: String,
    #[serde(default)]
    pub payload: String,
    #[serde(default)]
    pub correlation_id: Option<String>,
}

fn default_signal_type() -> String {
    SignalType::TASK_REQUEST.to_string()
}

async fn publish_signal(
    State(kernel): State<Kernel>,
    Json(submission): Json<SignalSubmission>,
) -> impl IntoResponse {
    let mut signal = Signal::new(
        submission.source,
        submission.target,
        SignalType::from(submission.signal_type.as_str()),
        submission.payload,
    );
    if let Some(correlation_id) = submission.correlation_id.filter(|c| !c.is_empty()) {
        signal = signal.with_correlation_id(SignalId::from(correlation_id));
    }
    let signal_id = signal.id.to_string();

    match kernel.router().publish(signal) {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({ "success": true, "error": "", "id": signal_id })),
        ),
        Err(e) => (
            StatusCode::NOT_FOUND,
            Json(json!({ "success": false, "error": e.to_string(), "id": signal_id })),
        ),
    }
}

async fn start_workflow(
    State(kernel): State<Kernel>,
    Json(submission): Json<WorkflowSubmission>,
) -> impl IntoResponse {
    let request = match submission.into_request() {
        Ok(request) => request,
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "status": "rejected", "error": e.to_string() })),
            )
        }
    };

    let workflow_id = request.workflow_id.to_string();
    let orchestrator = kernel.orchestrator().clone();
    tokio::spawn(async move {
        orchestrator.execute(request).await;
    });

    (
        StatusCode::ACCEPTED,
        Json(json!({ "status": "started", "id": workflow_id })),
    )
}

async fn stream_events(
    State(kernel): State<Kernel>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let receiver = kernel.event_bus().subscribe().into_inner();
    let stream = BroadcastStream::new(receiver)
        // Lagged receivers skip what they missed.
        .filter_map(|event| event.ok())
        .filter_map(|event| Event::default().json_data(&event).ok())
        .map(Ok);
    // Ends with the kernel so graceful shutdown is not held open.
    let stream =
        futures::StreamExt::take_until(stream, kernel.shutdown_token().cancelled_owned());

    Sse::new(stream).keep_alive(KeepAlive::default())
}

#[derive(Debug, Deserialize)]
struct LogQuery {
    limit: Option<usize>,
}

async fn recent_log(
    State(kernel): State<Kernel>,
    Query(query): Query<LogQuery>,
) -> impl IntoResponse {
    let limit = query.limit.unwrap_or(DEFAULT_LOG_LIMIT).min(MAX_LOG_LIMIT);

    match kernel.event_log_repository().list_recent(limit).await {
        Ok(entries) => (StatusCode::OK, Json(json!(entries))),
        Err(e) => {
            error!("Failed to read event log: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": e.to_string() })),
            )
        }
    }
}

/// Serve the gateway on `addr` until `shutdown` resolves
pub async fn start_http_server(
    addr: SocketAddr,
    kernel: Kernel,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Starting Vryndara HTTP gateway on {}", addr);

    let closing = kernel.clone();
    axum::serve(listener, app(kernel))
        .with_graceful_shutdown(async move {
            shutdown.await;
            closing.close_streams();
        })
        .await?;

    Ok(())
}
