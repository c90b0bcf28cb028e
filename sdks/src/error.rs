// Copyright (c) 2026 Vryndara contributors
// SPDX-License-Identifier: AGPL-3.0

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("Invalid kernel address '{0}'")]
    InvalidAddress(String),

    #[error("Failed to connect to kernel: {0}")]
    Transport(#[from] tonic::transport::Error),

    #[error("Kernel returned {}: {}", .0.code(), .0.message())]
    Status(#[from] tonic::Status),
}
