// Copyright (c) 2026 Vryndara contributors
// SPDX-License-Identifier: AGPL-3.0
//! # Vryndara Kernel
//!
//! Central message router that lets independent agent processes exchange
//! task requests and results, plus a workflow orchestrator that chains those
//! exchanges step by step.
//!
//! | Layer | Contents |
//! |-------|----------|
//! | [`domain`] | Agents, signals, workflows, events, config, repository contracts |
//! | [`application`] | Mailbox router, response correlator, workflow orchestrator, event log writer |
//! | [`infrastructure`] | Mailboxes, event bus, PostgreSQL pool, event log repositories, workflow files |
//! | [`presentation`] | gRPC `Kernel` service and the HTTP gateway |

pub mod domain;
pub mod application;
pub mod infrastructure;
pub mod presentation;

pub use domain::*;
