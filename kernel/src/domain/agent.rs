// Copyright (c) 2026 Vryndara contributors
// SPDX-License-Identifier: AGPL-3.0

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Identity the workflow orchestrator uses as `source_agent_id` when it
/// dispatches steps. Signals addressed to it are absorbed by the router.
pub const DEFAULT_ORCHESTRATOR_AGENT_ID: &str = "vryndara-orchestrator";

/// Opaque, caller-chosen agent identity (e.g. `"coder-alpha"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AgentId(String);

impl AgentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AgentId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for AgentId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// What the kernel knows about a registered agent.
///
/// Capabilities are informational only; the router never matches on them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentRegistration {
    pub id: AgentId,
    pub capabilities: BTreeSet<String>,
    pub registered_at: DateTime<Utc>,
}

impl AgentRegistration {
    pub fn new<I, S>(id: AgentId, capabilities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            id,
            capabilities: capabilities.into_iter().map(Into::into).collect(),
            registered_at: Utc::now(),
        }
    }
}
