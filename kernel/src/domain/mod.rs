// Copyright (c) 2026 Vryndara contributors
// SPDX-License-Identifier: AGPL-3.0
//! Domain Layer
//!
//! Plain data types and contracts. Nothing in here touches the network,
//! the database or the runtime.

pub mod agent;
pub mod signal;
pub mod workflow;
pub mod events;
pub mod repository;
pub mod kernel_config;
