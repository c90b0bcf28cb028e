// Copyright (c) 2026 Vryndara contributors
// SPDX-License-Identifier: AGPL-3.0

pub mod correlator;
pub mod event_log_writer;
pub mod kernel;
pub mod orchestrator;
pub mod repository_factory;
pub mod router;

pub use correlator::{PendingResponse, ResponseCorrelator};
pub use kernel::Kernel;
pub use orchestrator::WorkflowOrchestrator;
pub use router::{MailboxRouter, RouteOutcome, RoutingError, Subscription};
