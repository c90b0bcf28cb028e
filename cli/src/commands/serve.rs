// Copyright (c) 2026 Vryndara contributors
// SPDX-License-Identifier: AGPL-3.0

//! `vryndara serve`: run the kernel until SIGINT/SIGTERM

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;
use tokio::sync::watch;
use tracing::{info, warn};

use vryndara_kernel::application::kernel::Kernel;
use vryndara_kernel::domain::kernel_config::KernelConfigManifest;
use vryndara_kernel::presentation::api::start_http_server;
use vryndara_kernel::presentation::grpc::server::start_grpc_server;

#[derive(Args)]
pub struct ServeArgs {
    /// gRPC port (overrides config)
    #[arg(long)]
    pub grpc_port: Option<u16>,

    /// HTTP gateway port (overrides config)
    #[arg(long)]
    pub http_port: Option<u16>,

    /// Do not start the HTTP gateway
    #[arg(long)]
    pub no_gateway: bool,
}

impl ServeArgs {
    /// Fold command line overrides into the loaded config.
    pub fn apply(&self, config: &mut KernelConfigManifest) {
        if let Some(port) = self.grpc_port {
            config.spec.network.grpc_port = port;
        }
        if let Some(port) = self.http_port {
            config.spec.network.http_port = port;
        }
        if self.no_gateway {
            config.spec.network.gateway = false;
        }
    }
}

pub async fn execute(args: ServeArgs, config_path: Option<PathBuf>) -> Result<()> {
    let mut config = KernelConfigManifest::load_or_default(config_path)
        .context("Failed to load configuration")?;
    args.apply(&mut config);
    config
        .validate()
        .context("Configuration validation failed")?;

    let grpc_addr = config.spec.network.grpc_addr()?;
    let http_addr = if config.spec.network.gateway {
        Some(config.spec.network.http_addr()?)
    } else {
        None
    };

    let kernel = Kernel::from_config(config)
        .await
        .context("Failed to start kernel")?;

    println!("{}", "Vryndara kernel online".green().bold());
    println!("  gRPC:    {}", grpc_addr);
    match http_addr {
        Some(addr) => println!("  Gateway: http://{}", addr),
        None => println!("  Gateway: {}", "(disabled)".dimmed()),
    }
    println!("  Storage: {}", kernel.event_log_backend());
    println!();

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        shutdown_signal().await;
        let _ = shutdown_tx.send(true);
    });

    let grpc = start_grpc_server(grpc_addr, kernel.clone(), wait_for(shutdown_rx.clone()));
    let served = match http_addr {
        Some(addr) => {
            let http = start_http_server(addr, kernel.clone(), wait_for(shutdown_rx));
            tokio::try_join!(grpc, http).map(|_| ())
        }
        None => grpc.await,
    };

    info!("Servers stopped, flushing event log");
    kernel.shutdown().await;

    served
}

async fn wait_for(mut rx: watch::Receiver<bool>) {
    while !*rx.borrow() {
        if rx.changed().await.is_err() {
            break;
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down"),
        _ = terminate => info!("Received SIGTERM, shutting down"),
    }
}
