// Copyright (c) 2026 Vryndara contributors
// SPDX-License-Identifier: AGPL-3.0
//! Vryndara CLI library, split out of the binary so commands can be tested.

pub mod commands;
