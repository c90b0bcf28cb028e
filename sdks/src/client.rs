// Copyright (c) 2026 Vryndara contributors
// SPDX-License-Identifier: AGPL-3.0

use futures::stream::{Stream, StreamExt};
use tonic::transport::{Channel, Endpoint};
use tracing::{debug, info};

use vryndara_kernel::domain::agent::AgentId;
use vryndara_kernel::domain::signal::{Signal, SignalType};
use vryndara_kernel::domain::workflow::WorkflowRequest;
use vryndara_kernel::presentation::grpc::proto::{self, kernel_client::KernelClient};

use crate::error::ClientError;

/// Connection to a Vryndara kernel on behalf of one agent identity.
///
/// Cheap to clone; clones share the underlying HTTP/2 channel.
#[derive(Clone)]
pub struct AgentClient {
    agent_id: AgentId,
    client: KernelClient<Channel>,
}

impl AgentClient {
    /// Connect to the kernel. `kernel_address` may omit the scheme
    /// (`localhost:50051`).
    pub async fn connect(
        agent_id: impl Into<AgentId>,
        kernel_address: impl Into<String>,
    ) -> Result<Self, ClientError> {
        let address = normalize_address(kernel_address.into());
        let endpoint = Endpoint::from_shared(address.clone())
            .map_err(|_| ClientError::InvalidAddress(address.clone()))?;
        let channel = endpoint.connect().await?;

        let agent_id = agent_id.into();
        debug!(agent_id = %agent_id, kernel = %address, "Connected to kernel");

        Ok(Self {
            agent_id,
            client: KernelClient::new(channel),
        })
    }

    pub fn agent_id(&self) -> &AgentId {
        &self.agent_id
    }

    pub async fn register<I, S>(&self, capabilities: I) -> Result<(), ClientError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let info = proto::AgentInfo {
            id: self.agent_id.to_string(),
            capabilities: capabilities.into_iter().map(Into::into).collect(),
        };
        self.client.clone().register(info).await?;

        info!(agent_id = %self.agent_id, "Registered with kernel");
        Ok(())
    }

    /// Send a new signal from this agent. A failed Ack (target offline) is
    /// returned, not raised.
    pub async fn send(
        &self,
        target: impl Into<AgentId>,
        signal_type: SignalType,
        payload: impl Into<String>,
    ) -> Result<proto::Ack, ClientError> {
        let signal = Signal::new(self.agent_id.clone(), target, signal_type, payload);
        self.publish(&signal).await
    }

    /// Answer `request` with a `TASK_RESULT` that carries the request id.
    pub async fn reply(
        &self,
        request: &Signal,
        payload: impl Into<String>,
    ) -> Result<proto::Ack, ClientError> {
        let mut reply = Signal::reply_to(request, payload);
        reply.source = self.agent_id.clone();
        self.publish(&reply).await
    }

    pub async fn publish(&self, signal: &Signal) -> Result<proto::Ack, ClientError> {
        let ack = self
            .client
            .clone()
            .publish(proto::Signal::from(signal))
            .await?
            .into_inner();
        Ok(ack)
    }

    /// Stream of signals addressed to this agent, in arrival order. Ends
    /// only if the kernel goes away.
    pub async fn listen(
        &self,
    ) -> Result<impl Stream<Item = Result<Signal, ClientError>> + Send + 'static, ClientError> {
        let info = proto::AgentInfo {
            id: self.agent_id.to_string(),
            capabilities: vec![],
        };
        let stream = self.client.clone().subscribe(info).await?.into_inner();

        info!(agent_id = %self.agent_id, "Listening for signals");
        Ok(stream.map(|item| item.map(Signal::from).map_err(ClientError::from)))
    }

    /// Run a workflow to completion. The Ack's `error` field carries
    /// `Completed: <workflow id>`.
    pub async fn execute_workflow(
        &self,
        request: &WorkflowRequest,
    ) -> Result<proto::Ack, ClientError> {
        let ack = self
            .client
            .clone()
            .execute_workflow(proto::WorkflowRequest::from(request))
            .await?
            .into_inner();
        Ok(ack)
    }
}

fn normalize_address(address: String) -> String {
    if address.starts_with("http://") || address.starts_with("https://") {
        address
    } else {
        format!("http://{}", address)
    }
}
