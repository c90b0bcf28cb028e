// Copyright (c) 2026 Vryndara contributors
// SPDX-License-Identifier: AGPL-3.0
//! # Presentation Layer
//!
//! Network surfaces over the [`Kernel`](crate::application::kernel::Kernel).
//! No routing or workflow logic lives here.
//!
//! | Module | Transport | Description |
//! |--------|-----------|-------------|
//! | [`grpc`] | gRPC (Tonic) | `vryndara.v1.Kernel`: Register, Publish, Subscribe, ExecuteWorkflow |
//! | [`api`] | HTTP/SSE (Axum) | JSON gateway and live event feed |

pub mod api;
pub mod grpc;
