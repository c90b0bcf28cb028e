// Copyright (c) 2026 Vryndara contributors
// SPDX-License-Identifier: AGPL-3.0

//! `vryndara signal send|listen`

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use futures::StreamExt;

use vryndara_sdk::{AgentClient, Signal, SignalType};

#[derive(Subcommand)]
pub enum SignalCommand {
    /// Publish one signal
    Send {
        /// Source agent id
        #[arg(long, value_name = "AGENT_ID")]
        from: String,

        /// Target agent id
        #[arg(long, value_name = "AGENT_ID")]
        to: String,

        /// Signal type tag
        #[arg(long = "type", default_value = SignalType::TASK_REQUEST)]
        signal_type: String,

        /// Id of the request this signal answers
        #[arg(long, value_name = "SIGNAL_ID")]
        correlation_id: Option<String>,

        #[arg(value_name = "PAYLOAD")]
        payload: String,
    },

    /// Register as an agent and print every signal it receives
    Listen {
        #[arg(long = "as", value_name = "AGENT_ID")]
        agent_id: String,

        /// Advertised capability (repeatable)
        #[arg(long = "capability", value_name = "NAME")]
        capabilities: Vec<String>,

        /// Print signals as JSON lines
        #[arg(long)]
        json: bool,
    },
}

pub async fn handle_command(command: SignalCommand, kernel: &str) -> Result<()> {
    match command {
        SignalCommand::Send {
            from,
            to,
            signal_type,
            correlation_id,
            payload,
        } => send(from, to, signal_type, correlation_id, payload, kernel).await,
        SignalCommand::Listen {
            agent_id,
            capabilities,
            json,
        } => listen(agent_id, capabilities, json, kernel).await,
    }
}

async fn send(
    from: String,
    to: String,
    signal_type: String,
    correlation_id: Option<String>,
    payload: String,
    kernel: &str,
) -> Result<()> {
    let client = AgentClient::connect(from.clone(), kernel)
        .await
        .with_context(|| format!("Failed to connect to kernel at {}", kernel))?;

    let mut signal = Signal::new(from, to, SignalType::from(signal_type.as_str()), payload);
    if let Some(id) = correlation_id.filter(|id| !id.is_empty()) {
        signal = signal.with_correlation_id(id.into());
    }

    let ack = client.publish(&signal).await.context("Publish failed")?;
    if !ack.success {
        anyhow::bail!("Signal not delivered: {}", ack.error);
    }

    println!("{}", format!("✓ Signal {} delivered", signal.id).green());
    Ok(())
}

async fn listen(
    agent_id: String,
    capabilities: Vec<String>,
    json: bool,
    kernel: &str,
) -> Result<()> {
    let client = AgentClient::connect(agent_id.clone(), kernel)
        .await
        .with_context(|| format!("Failed to connect to kernel at {}", kernel))?;
    client
        .register(capabilities)
        .await
        .context("Failed to register agent")?;

    let mut signals = Box::pin(client.listen().await.context("Subscribe failed")?);
    eprintln!(
        "{}",
        format!("Listening as '{}' (Ctrl+C to stop)", agent_id).dimmed()
    );

    loop {
        tokio::select! {
            next = signals.next() => match next {
                Some(signal) => {
                    let signal = signal.context("Signal stream failed")?;
                    println!("{}", render(&signal, json)?);
                }
                None => {
                    eprintln!("{}", "Kernel closed the stream".yellow());
                    break;
                }
            },
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    Ok(())
}

/// One line per signal, either JSON or a human summary
pub fn render(signal: &Signal, json: bool) -> Result<String> {
    if json {
        return Ok(serde_json::to_string(signal)?);
    }

    let time = chrono::DateTime::from_timestamp(signal.timestamp, 0)
        .map(|t| t.format("%H:%M:%S").to_string())
        .unwrap_or_else(|| signal.timestamp.to_string());

    Ok(format!(
        "[{}] {} {} -> {}: {}",
        time,
        signal.signal_type.to_string().bold(),
        signal.source,
        signal.target,
        signal.payload
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_json_uses_type_field() {
        let signal = Signal::new("User", "coder-alpha", SignalType::TaskRequest, "hi");
        let line = render(&signal, true).unwrap();
        let value: serde_json::Value = serde_json::from_str(&line).unwrap();

        assert_eq!(value["type"], "TASK_REQUEST");
        assert_eq!(value["payload"], "hi");
        assert!(value.get("correlation_id").is_none());
    }

    #[test]
    fn test_render_text_contains_route() {
        colored::control::set_override(false);
        let signal = Signal::new("User", "coder-alpha", SignalType::TaskRequest, "hi");
        let line = render(&signal, false).unwrap();

        assert!(line.ends_with("TASK_REQUEST User -> coder-alpha: hi"));
    }
}
