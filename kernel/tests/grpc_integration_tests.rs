// Copyright (c) 2026 Vryndara contributors
// SPDX-License-Identifier: AGPL-3.0

//! End-to-end tests over a real loopback gRPC connection.

use std::net::SocketAddr;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio_stream::StreamExt;
use tonic::transport::Channel;

use vryndara_kernel::application::kernel::Kernel;
use vryndara_kernel::domain::kernel_config::KernelConfigManifest;
use vryndara_kernel::presentation::grpc::proto::kernel_client::KernelClient;
use vryndara_kernel::presentation::grpc::proto::{AgentInfo, Signal, WorkflowRequest, WorkflowStep};
use vryndara_kernel::presentation::grpc::server::serve_with_listener;

struct TestServer {
    addr: SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

async fn start_server(config: KernelConfigManifest) -> TestServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let kernel = Kernel::in_memory(config);
    let (tx, rx) = oneshot::channel::<()>();

    tokio::spawn(async move {
        serve_with_listener(listener, kernel, async {
            let _ = rx.await;
        })
        .await
        .unwrap();
    });

    TestServer {
        addr,
        shutdown: Some(tx),
    }
}

async fn client(server: &TestServer) -> KernelClient<Channel> {
    KernelClient::connect(format!("http://{}", server.addr))
        .await
        .unwrap()
}

fn agent(id: &str) -> AgentInfo {
    AgentInfo {
        id: id.to_string(),
        capabilities: vec!["python.clean".to_string()],
    }
}

#[tokio::test]
async fn test_register_publish_subscribe_over_grpc() {
    let server = start_server(KernelConfigManifest::default()).await;
    let mut client = client(&server).await;

    let ack = client.register(agent("coder-alpha")).await.unwrap().into_inner();
    assert!(ack.success);

    let ack = client
        .publish(Signal {
            source_agent_id: "User".into(),
            target_agent_id: "coder-alpha".into(),
            r#type: "TASK_REQUEST".into(),
            payload: "add two numbers".into(),
            ..Default::default()
        })
        .await
        .unwrap()
        .into_inner();
    assert!(ack.success, "publish failed: {}", ack.error);

    let mut stream = client
        .subscribe(agent("coder-alpha"))
        .await
        .unwrap()
        .into_inner();
    let first = tokio::time::timeout(Duration::from_secs(2), stream.next())
        .await
        .unwrap()
        .unwrap()
        .unwrap();

    assert_eq!(first.source_agent_id, "User");
    assert_eq!(first.payload, "add two numbers");
    assert!(!first.id.is_empty());
    assert!(first.timestamp > 0);
}

#[tokio::test]
async fn test_publish_to_offline_agent_fails_ack() {
    let server = start_server(KernelConfigManifest::default()).await;
    let mut client = client(&server).await;

    let ack = client
        .publish(Signal {
            source_agent_id: "User".into(),
            target_agent_id: "ghost".into(),
            r#type: "TASK_REQUEST".into(),
            payload: "hello".into(),
            ..Default::default()
        })
        .await
        .unwrap()
        .into_inner();

    assert!(!ack.success);
    assert_eq!(ack.error, "Target offline: ghost");
}

#[tokio::test]
async fn test_register_with_empty_id_is_invalid() {
    let server = start_server(KernelConfigManifest::default()).await;
    let mut client = client(&server).await;

    let status = client.register(agent("")).await.unwrap_err();
    assert_eq!(status.code(), tonic::Code::InvalidArgument);
}

#[tokio::test]
async fn test_execute_workflow_with_remote_agents() {
    let server = start_server(KernelConfigManifest::default()).await;

    // Remote agents: echo the task back, upper-cased, with the request id.
    for id in ["researcher-1", "director-1"] {
        let mut agent_client = client(&server).await;
        agent_client.register(agent(id)).await.unwrap();
        let mut stream = agent_client.subscribe(agent(id)).await.unwrap().into_inner();

        tokio::spawn(async move {
            while let Some(Ok(request)) = stream.next().await {
                let reply = Signal {
                    source_agent_id: request.target_agent_id.clone(),
                    target_agent_id: request.source_agent_id.clone(),
                    r#type: "TASK_RESULT".into(),
                    payload: format!("{} done", request.target_agent_id),
                    correlation_id: request.id.clone(),
                    ..Default::default()
                };
                let _ = agent_client.publish(reply).await;
            }
        });
    }

    let mut caller = client(&server).await;
    let ack = tokio::time::timeout(
        Duration::from_secs(10),
        caller.execute_workflow(WorkflowRequest {
            workflow_id: "wf-grpc".into(),
            steps: vec![
                WorkflowStep {
                    agent_id: "director-1".into(),
                    task_payload: "Write a shot list".into(),
                    step_order: 2,
                },
                WorkflowStep {
                    agent_id: "researcher-1".into(),
                    task_payload: "Find facts".into(),
                    step_order: 1,
                },
            ],
        }),
    )
    .await
    .unwrap()
    .unwrap()
    .into_inner();

    assert!(ack.success);
    assert_eq!(ack.error, "Completed: wf-grpc");
}

#[tokio::test]
async fn test_execute_workflow_without_id_reports_generated_id() {
    let server = start_server(KernelConfigManifest::default()).await;
    let mut caller = client(&server).await;

    let ack = caller
        .execute_workflow(WorkflowRequest {
            workflow_id: String::new(),
            steps: vec![],
        })
        .await
        .unwrap()
        .into_inner();

    assert!(ack.success);
    assert!(ack.error.starts_with("Completed: wf-"));
}

#[tokio::test]
async fn test_shutdown_completes_with_live_subscriber() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let kernel = Kernel::in_memory(KernelConfigManifest::default());
    let (tx, rx) = oneshot::channel::<()>();

    let server = tokio::spawn(serve_with_listener(listener, kernel.clone(), async {
        let _ = rx.await;
    }));

    let mut client = KernelClient::connect(format!("http://{}", addr))
        .await
        .unwrap();
    let mut stream = client.subscribe(agent("a")).await.unwrap().into_inner();

    tx.send(()).unwrap();
    let served = tokio::time::timeout(Duration::from_secs(5), server)
        .await
        .expect("server still running 5s after shutdown with a subscriber attached");
    served.unwrap().unwrap();

    // The subscriber sees its stream end instead of hanging.
    let next = tokio::time::timeout(Duration::from_secs(1), stream.next())
        .await
        .unwrap();
    assert!(matches!(next, None | Some(Err(_))));

    // The event log can still be drained afterwards.
    kernel.shutdown().await;
}
