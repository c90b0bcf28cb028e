// Copyright (c) 2026 Vryndara contributors
// SPDX-License-Identifier: AGPL-3.0

//! Workflow commands
//!
//! - `vryndara workflow validate <file>` - parse a manifest and show its steps
//! - `vryndara workflow run <file>` - execute it on a running kernel and wait

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use std::path::{Path, PathBuf};

use vryndara_kernel::domain::workflow::{WorkflowId, WorkflowRequest};
use vryndara_kernel::infrastructure::workflow_parser::WorkflowParser;
use vryndara_sdk::AgentClient;

const CLI_AGENT_ID: &str = "vryndara-cli";

#[derive(Subcommand)]
pub enum WorkflowCommand {
    /// Validate a workflow manifest (YAML, or JSON by extension)
    Validate {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Execute a workflow manifest and wait for it to finish
    Run {
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Override the workflow id from the manifest
        #[arg(long, value_name = "ID")]
        id: Option<String>,
    },
}

pub async fn handle_command(command: WorkflowCommand, kernel: &str) -> Result<()> {
    match command {
        WorkflowCommand::Validate { file } => validate_workflow(&file),
        WorkflowCommand::Run { file, id } => run_workflow(&file, id, kernel).await,
    }
}

/// Parse the manifest, applying an id override if one was given.
pub fn load_workflow(file: &Path, id: Option<String>) -> Result<WorkflowRequest> {
    let mut request = WorkflowParser::parse_file(file)
        .with_context(|| format!("Failed to parse workflow manifest {}", file.display()))?;
    if let Some(id) = id.filter(|id| !id.is_empty()) {
        request.workflow_id = WorkflowId::new(id);
    }
    Ok(request)
}

fn validate_workflow(file: &Path) -> Result<()> {
    println!("{}", "Validating workflow manifest...".cyan());
    println!("   File: {}", file.display());
    println!();

    let request = load_workflow(file, None)?;

    println!("{}", "✓ Workflow is valid!".green().bold());
    println!();
    print_steps(&request);

    Ok(())
}

async fn run_workflow(file: &Path, id: Option<String>, kernel: &str) -> Result<()> {
    let request = load_workflow(file, id)?;
    print_steps(&request);
    println!();

    let client = AgentClient::connect(CLI_AGENT_ID, kernel)
        .await
        .with_context(|| format!("Failed to connect to kernel at {}", kernel))?;

    println!("{}", "Running workflow...".cyan());
    let ack = client
        .execute_workflow(&request)
        .await
        .context("Workflow execution failed")?;

    if ack.success {
        println!("{}", format!("✓ {}", ack.error).green().bold());
        Ok(())
    } else {
        anyhow::bail!("Kernel rejected workflow: {}", ack.error)
    }
}

fn print_steps(request: &WorkflowRequest) {
    println!("Workflow: {}", request.workflow_id.as_str().bold());
    for step in request.ordered_steps() {
        println!(
            "  {:>3}. {} <- {}",
            step.step_order,
            step.agent_id,
            truncate(&step.task_payload, 60)
        );
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let head: String = text.chars().take(max_chars).collect();
        format!("{}...", head)
    }
}
