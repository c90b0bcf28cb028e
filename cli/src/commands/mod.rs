// Copyright (c) 2026 Vryndara contributors
// SPDX-License-Identifier: AGPL-3.0

//! Command implementations for the Vryndara CLI

pub mod agent;
pub mod config;
pub mod serve;
pub mod signal;
pub mod workflow;

pub use self::agent::AgentCommand;
pub use self::config::ConfigCommand;
pub use self::serve::ServeArgs;
pub use self::signal::SignalCommand;
pub use self::workflow::WorkflowCommand;
