// Copyright (c) 2026 Vryndara contributors
// SPDX-License-Identifier: AGPL-3.0

//! gRPC Server Implementation for the Vryndara Kernel
//! Exposes Register, Publish, Subscribe, ExecuteWorkflow

use std::future::Future;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_stream::wrappers::{ReceiverStream, TcpListenerStream};
use tokio_util::sync::CancellationToken;
use tonic::{Request, Response, Status};
use tracing::{debug, info, warn};

use super::proto;
use super::proto::kernel_server::{Kernel as KernelRpc, KernelServer};
use crate::application::kernel::Kernel;
use crate::application::router::Subscription;
use crate::domain::agent::AgentId;
use crate::domain::signal::Signal;
use crate::domain::workflow::WorkflowRequest;

/// Implementation of the `vryndara.v1.Kernel` service
#[derive(Clone)]
pub struct KernelService {
    kernel: Kernel,
}

impl KernelService {
    pub fn new(kernel: Kernel) -> Self {
        Self { kernel }
    }

    pub fn into_server(self) -> KernelServer<Self> {
        KernelServer::new(self)
    }
}

#[tonic::async_trait]
impl KernelRpc for KernelService {
    type SubscribeStream = ReceiverStream<Result<proto::Signal, Status>>;

    /// Always succeeds, except that an empty id is deliberately rejected
    /// with `INVALID_ARGUMENT` as input validation.
    async fn register(
        &self,
        request: Request<proto::AgentInfo>,
    ) -> Result<Response<proto::Ack>, Status> {
        let info = request.into_inner();
        if info.id.is_empty() {
            return Err(Status::invalid_argument("agent id must not be empty"));
        }

        self.kernel
            .router()
            .register(AgentId::from(info.id), info.capabilities);

        Ok(Response::new(proto::Ack::ok()))
    }

    async fn publish(
        &self,
        request: Request<proto::Signal>,
    ) -> Result<Response<proto::Ack>, Status> {
        let signal = Signal::from(request.into_inner());

        let ack = match self.kernel.router().publish(signal) {
            Ok(_) => proto::Ack::ok(),
            Err(e) => proto::Ack::failure(e.to_string()),
        };
        Ok(Response::new(ack))
    }

    async fn subscribe(
        &self,
        request: Request<proto::AgentInfo>,
    ) -> Result<Response<Self::SubscribeStream>, Status> {
        let info = request.into_inner();
        if info.id.is_empty() {
            return Err(Status::invalid_argument("agent id must not be empty"));
        }

        let subscription = self.kernel.router().subscribe(AgentId::from(info.id));
        let buffer = self.kernel.config().spec.subscription.stream_buffer.max(1);
        let (tx, rx) = mpsc::channel(buffer);

        tokio::spawn(pump_subscription(
            subscription,
            tx,
            self.kernel.shutdown_token(),
        ));

        Ok(Response::new(ReceiverStream::new(rx)))
    }

    async fn execute_workflow(
        &self,
        request: Request<proto::WorkflowRequest>,
    ) -> Result<Response<proto::Ack>, Status> {
        let workflow = WorkflowRequest::from(request.into_inner());
        let workflow_id = workflow.workflow_id.clone();
        let orchestrator = self.kernel.orchestrator().clone();

        // Detached so a caller hanging up does not cancel a running workflow.
        let report = tokio::spawn(async move { orchestrator.execute(workflow).await })
            .await
            .map_err(|e| {
                Status::internal(format!("Workflow {} task failed: {}", workflow_id, e))
            })?;

        Ok(Response::new(proto::Ack {
            success: true,
            error: report.completion_message(),
        }))
    }
}

/// Move signals from the mailbox to the response stream until the client
/// goes away or the kernel shuts down. A signal taken from the mailbox but
/// not accepted by the stream is put back at the front.
async fn pump_subscription(
    subscription: Subscription,
    tx: mpsc::Sender<Result<proto::Signal, Status>>,
    shutdown: CancellationToken,
) {
    let agent_id = subscription.agent_id().clone();
    debug!(agent_id = %agent_id, "Subscription pump started");

    loop {
        let signal = tokio::select! {
            _ = tx.closed() => break,
            _ = shutdown.cancelled() => {
                debug!(agent_id = %agent_id, "Kernel shutting down, ending subscription");
                break;
            }
            signal = subscription.recv() => signal,
        };

        if tx.send(Ok(proto::Signal::from(&signal))).await.is_err() {
            warn!(
                agent_id = %agent_id,
                signal_id = %signal.id,
                "Subscriber disconnected mid-delivery, requeueing signal"
            );
            subscription.requeue(signal);
            break;
        }
    }

    info!(agent_id = %agent_id, "Subscriber disconnected");
}

/// Resolves with `shutdown` after ending open Subscribe streams, which
/// tonic would otherwise wait on forever.
fn closing_streams(
    kernel: &Kernel,
    shutdown: impl Future<Output = ()> + Send,
) -> impl Future<Output = ()> + Send {
    let kernel = kernel.clone();
    async move {
        shutdown.await;
        kernel.close_streams();
    }
}

/// Start the gRPC server and run it until `shutdown` resolves
pub async fn start_grpc_server(
    addr: SocketAddr,
    kernel: Kernel,
    shutdown: impl Future<Output = ()> + Send,
) -> anyhow::Result<()> {
    let shutdown = closing_streams(&kernel, shutdown);
    let server = KernelService::new(kernel).into_server();

    info!("Starting Vryndara gRPC server on {}", addr);

    tonic::transport::Server::builder()
        .add_service(server)
        .serve_with_shutdown(addr, shutdown)
        .await?;

    Ok(())
}

/// Same as [`start_grpc_server`] on an already bound listener (port 0 in tests)
pub async fn serve_with_listener(
    listener: TcpListener,
    kernel: Kernel,
    shutdown: impl Future<Output = ()> + Send,
) -> anyhow::Result<()> {
    let shutdown = closing_streams(&kernel, shutdown);
    let server = KernelService::new(kernel).into_server();

    if let Ok(addr) = listener.local_addr() {
        info!("Starting Vryndara gRPC server on {}", addr);
    }

    tonic::transport::Server::builder()
        .add_service(server)
        .serve_with_incoming_shutdown(TcpListenerStream::new(listener), shutdown)
        .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::kernel_config::KernelConfigManifest;
    use std::time::Duration;
    use tokio_stream::StreamExt;

    fn service() -> KernelService {
        KernelService::new(Kernel::in_memory(KernelConfigManifest::default()))
    }

    #[tokio::test]
    async fn test_register_rejects_empty_id() {
        let status = service()
            .register(Request::new(proto::AgentInfo {
                id: String::new(),
                capabilities: vec![],
            }))
            .await
            .unwrap_err();
        assert_eq!(status.code(), tonic::Code::InvalidArgument);
    }

    #[tokio::test]
    async fn test_publish_to_unknown_target_returns_failed_ack() {
        let ack = service()
            .publish(Request::new(proto::Signal {
                source_agent_id: "User".into(),
                target_agent_id: "ghost".into(),
                r#type: "TASK_REQUEST".into(),
                payload: "x".into(),
                ..Default::default()
            }))
            .await
            .unwrap()
            .into_inner();

        assert!(!ack.success);
        assert_eq!(ack.error, "Target offline: ghost");
    }

    #[tokio::test]
    async fn test_dropped_stream_requeues_pending_signal() {
        let service = service();
        let router = service.kernel.router().clone();

        let stream = service
            .subscribe(Request::new(proto::AgentInfo {
                id: "a".into(),
                capabilities: vec![],
            }))
            .await
            .unwrap()
            .into_inner();
        drop(stream);

        // Give the pump a moment to notice the closed channel.
        tokio::time::sleep(Duration::from_millis(50)).await;
        router.publish(Signal::task_request("u", "a", "kept")).unwrap();
        assert_eq!(router.mailbox_depth(&AgentId::from("a")), Some(1));
    }

    #[tokio::test]
    async fn test_stream_ends_when_kernel_closes_streams() {
        let service = service();
        let kernel = service.kernel.clone();

        let mut stream = service
            .subscribe(Request::new(proto::AgentInfo {
                id: "a".into(),
                capabilities: vec![],
            }))
            .await
            .unwrap()
            .into_inner();

        kernel.close_streams();
        let next = tokio::time::timeout(Duration::from_secs(1), stream.next())
            .await
            .expect("stream should end after close_streams");
        assert!(next.is_none());

        // Nothing was consumed, so later signals stay queued.
        kernel
            .router()
            .publish(Signal::task_request("u", "a", "kept"))
            .unwrap();
        assert_eq!(kernel.router().mailbox_depth(&AgentId::from("a")), Some(1));
    }

    #[tokio::test]
    async fn test_stream_yields_in_fifo_order() {
        let service = service();
        let router = service.kernel.router().clone();

        let mut stream = service
            .subscribe(Request::new(proto::AgentInfo {
                id: "a".into(),
                capabilities: vec![],
            }))
            .await
            .unwrap()
            .into_inner();

        for payload in ["1", "2", "3"] {
            router.publish(Signal::task_request("u", "a", payload)).unwrap();
        }

        let mut received = Vec::new();
        for _ in 0..3 {
            let signal = tokio::time::timeout(Duration::from_secs(1), stream.next())
                .await
                .unwrap()
                .unwrap()
                .unwrap();
            received.push(signal.payload);
        }
        assert_eq!(received, vec!["1", "2", "3"]);
    }
}
