// Copyright (c) 2026 Vryndara contributors
// SPDX-License-Identifier: AGPL-3.0

pub mod mailbox;
pub mod event_bus;
pub mod db;
pub mod repositories;
pub mod workflow_parser;

pub use event_bus::EventBus;
pub use mailbox::Mailbox;
