// Copyright (c) 2026 Vryndara contributors
// SPDX-License-Identifier: AGPL-3.0
//! Vryndara Rust SDK
//!
//! Build agents that talk to a Vryndara kernel over gRPC.
//!
//! ```no_run
//! use vryndara_sdk::{run_agent, AgentClient};
//!
//! # async fn demo() -> Result<(), vryndara_sdk::ClientError> {
//! let client = AgentClient::connect("coder-alpha", "localhost:50051").await?;
//! client.register(["python.clean"]).await?;
//! run_agent(&client, |request| async move {
//!     Ok(format!("def solve(): pass  # {}", request.payload))
//! })
//! .await
//! # }
//! ```

pub mod agent;
pub mod client;
pub mod error;

pub use agent::run_agent;
pub use client::AgentClient;
pub use error::ClientError;

pub use vryndara_kernel::domain::agent::AgentId;
pub use vryndara_kernel::domain::signal::{Signal, SignalId, SignalType};
pub use vryndara_kernel::domain::workflow::{WorkflowRequest, WorkflowStep};
pub use vryndara_kernel::presentation::grpc::proto::Ack;
