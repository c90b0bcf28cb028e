// Copyright (c) 2026 Vryndara contributors
// SPDX-License-Identifier: AGPL-3.0
//! Worker loop for agents that answer task requests.

use futures::StreamExt;
use std::future::Future;
use tracing::{debug, error, info, warn};

use vryndara_kernel::domain::signal::{Signal, SignalType};

use crate::client::AgentClient;
use crate::error::ClientError;

/// Listen forever and answer every `TASK_REQUEST` with the handler's output.
///
/// Other signal types are logged and skipped. A handler error is sent back as
/// the result text (`Error: ...`) so whoever is waiting does not sit out the
/// full timeout. Returns when the kernel closes the stream.
pub async fn run_agent<F, Fut>(client: &AgentClient, handler: F) -> Result<(), ClientError>
where
    F: Fn(Signal) -> Fut,
    Fut: Future<Output = anyhow::Result<String>>,
{
    let mut signals = Box::pin(client.listen().await?);

    while let Some(signal) = signals.next().await {
        let signal = signal?;
        info!(
            agent_id = %client.agent_id(),
            signal_type = %signal.signal_type,
            source = %signal.source,
            "Received signal"
        );

        if signal.signal_type != SignalType::TaskRequest {
            debug!(signal_id = %signal.id, "Not a task request, skipping");
            continue;
        }

        let output = match handler(signal.clone()).await {
            Ok(output) => output,
            Err(e) => {
                error!(signal_id = %signal.id, "Task handler failed: {:#}", e);
                format!("Error: {:#}", e)
            }
        };

        let ack = client.reply(&signal, output).await?;
        if !ack.success {
            warn!(
                signal_id = %signal.id,
                target = %signal.source,
                "Reply not delivered: {}",
                ack.error
            );
        }
    }

    info!(agent_id = %client.agent_id(), "Kernel closed the signal stream");
    Ok(())
}
