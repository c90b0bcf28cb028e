// Copyright (c) 2026 Vryndara contributors
// SPDX-License-Identifier: AGPL-3.0

//! # Vryndara
//!
//! The `vryndara` binary runs the kernel and talks to a running one.
//!
//! - `vryndara serve` - start the kernel (gRPC plus optional HTTP gateway)
//! - `vryndara signal send|listen` - publish or watch signals
//! - `vryndara agent run` - run a simple scripted agent
//! - `vryndara workflow run|validate` - submit workflow manifests
//! - `vryndara config show|validate|generate` - configuration management

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::path::PathBuf;

use vryndara_cli::commands::{
    self, AgentCommand, ConfigCommand, ServeArgs, SignalCommand, WorkflowCommand,
};

/// Vryndara - signal routing kernel for cooperating agents
#[derive(Parser)]
#[command(name = "vryndara")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to configuration file (overrides discovery)
    #[arg(
        short,
        long,
        global = true,
        env = "VRYNDARA_CONFIG_PATH",
        value_name = "FILE"
    )]
    config: Option<PathBuf>,

    /// Kernel gRPC address used by client commands
    #[arg(
        long,
        global = true,
        env = "VRYNDARA_KERNEL_ADDRESS",
        default_value = "localhost:50051"
    )]
    kernel: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, env = "VRYNDARA_LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Log output format
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Clone, Copy, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the kernel
    #[command(name = "serve")]
    Serve(ServeArgs),

    /// Publish or watch signals
    #[command(name = "signal")]
    Signal {
        #[command(subcommand)]
        command: SignalCommand,
    },

    /// Run a scripted agent
    #[command(name = "agent")]
    Agent {
        #[command(subcommand)]
        command: AgentCommand,
    },

    /// Workflow management
    #[command(name = "workflow")]
    Workflow {
        #[command(subcommand)]
        command: WorkflowCommand,
    },

    /// Configuration management
    #[command(name = "config")]
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env is normal
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    init_logging(&cli.log_level, cli.log_format)?;

    match cli.command {
        Some(Commands::Serve(args)) => commands::serve::execute(args, cli.config).await,
        Some(Commands::Signal { command }) => {
            commands::signal::handle_command(command, &cli.kernel).await
        }
        Some(Commands::Agent { command }) => {
            commands::agent::handle_command(command, &cli.kernel).await
        }
        Some(Commands::Workflow { command }) => {
            commands::workflow::handle_command(command, &cli.kernel).await
        }
        Some(Commands::Config { command }) => {
            commands::config::handle_command(command, cli.config).await
        }
        None => {
            eprintln!("{}", "No command specified. Use --help for usage.".yellow());
            std::process::exit(1);
        }
    }
}

fn init_logging(level: &str, format: LogFormat) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(level))
        .context("Failed to create log filter")?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false);

    match format {
        LogFormat::Text => builder.compact().init(),
        LogFormat::Json => builder.json().init(),
    }

    Ok(())
}
