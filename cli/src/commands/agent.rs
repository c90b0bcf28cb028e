// Copyright (c) 2026 Vryndara contributors
// SPDX-License-Identifier: AGPL-3.0

//! `vryndara agent run`: a scripted worker for demos and smoke tests

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use std::time::Duration;
use tracing::info;

use vryndara_sdk::{run_agent, AgentClient, Signal};

const DEFAULT_REPLY: &str = "def clean_code(): pass";

#[derive(Subcommand)]
pub enum AgentCommand {
    /// Register an agent and answer every task request it receives
    Run {
        /// Agent id to register as
        #[arg(long, value_name = "AGENT_ID")]
        id: String,

        /// Advertised capability (repeatable)
        #[arg(long = "capability", value_name = "NAME")]
        capabilities: Vec<String>,

        /// Fixed reply text
        #[arg(long, default_value = DEFAULT_REPLY, conflicts_with = "echo")]
        reply: String,

        /// Reply with the request payload instead of a fixed text
        #[arg(long)]
        echo: bool,

        /// Pause before each reply, in milliseconds
        #[arg(long, default_value_t = 0)]
        delay_ms: u64,
    },
}

/// How a scripted agent turns a request into its result
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Responder {
    Fixed(String),
    Echo,
}

impl Responder {
    pub fn respond(&self, request: &Signal) -> String {
        match self {
            Responder::Fixed(text) => text.clone(),
            Responder::Echo => request.payload.clone(),
        }
    }
}

pub async fn handle_command(command: AgentCommand, kernel: &str) -> Result<()> {
    match command {
        AgentCommand::Run {
            id,
            capabilities,
            reply,
            echo,
            delay_ms,
        } => {
            let responder = if echo {
                Responder::Echo
            } else {
                Responder::Fixed(reply)
            };
            run(id, capabilities, responder, Duration::from_millis(delay_ms), kernel).await
        }
    }
}

async fn run(
    id: String,
    capabilities: Vec<String>,
    responder: Responder,
    delay: Duration,
    kernel: &str,
) -> Result<()> {
    let client = AgentClient::connect(id.clone(), kernel)
        .await
        .with_context(|| format!("Failed to connect to kernel at {}", kernel))?;
    client
        .register(capabilities)
        .await
        .context("Failed to register agent")?;

    println!(
        "{}",
        format!("✓ Agent '{}' online, waiting for tasks", id).green()
    );

    let handler = |request: Signal| {
        let responder = responder.clone();
        async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            let output = responder.respond(&request);
            info!(request_id = %request.id, source = %request.source, "Answering task");
            Ok(output)
        }
    };

    tokio::select! {
        result = run_agent(&client, handler) => {
            result.context("Agent stream failed")?;
            println!("{}", "Kernel closed the stream".yellow());
        }
        _ = tokio::signal::ctrl_c() => {
            println!("{}", "Agent stopped".dimmed());
        }
    }

    Ok(())
}
