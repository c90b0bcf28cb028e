// Copyright (c) 2026 Vryndara contributors
// SPDX-License-Identifier: AGPL-3.0
//! # Signals
//!
//! A [`Signal`] is the only unit of communication between agents. Once built
//! it is never mutated; the router clones it into mailboxes and into the
//! event log.
//!
//! The type tag is open-ended. `TASK_REQUEST` and `TASK_RESULT` drive the
//! workflow machinery, anything else is routed verbatim.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::domain::agent::AgentId;

/// Unique signal identifier. Clients usually send a UUID string, but any
/// non-empty string is accepted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SignalId(String);

impl SignalId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for SignalId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SignalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SignalId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for SignalId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SignalType {
    TaskRequest,
    TaskResult,
    Other(String),
}

impl SignalType {
    pub const TASK_REQUEST: &'static str = "TASK_REQUEST";
    pub const TASK_RESULT: &'static str = "TASK_RESULT";

    pub fn as_str(&self) -> &str {
        match self {
            SignalType::TaskRequest => Self::TASK_REQUEST,
            SignalType::TaskResult => Self::TASK_RESULT,
            SignalType::Other(tag) => tag,
        }
    }
}

impl From<&str> for SignalType {
    fn from(tag: &str) -> Self {
        match tag {
            Self::TASK_REQUEST => SignalType::TaskRequest,
            Self::TASK_RESULT => SignalType::TaskResult,
            other => SignalType::Other(other.to_string()),
        }
    }
}

impl fmt::Display for SignalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for SignalType {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for SignalType {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let tag = String::deserialize(deserializer)?;
        Ok(SignalType::from(tag.as_str()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signal {
    pub id: SignalId,
    pub source: AgentId,
    pub target: AgentId,
    #[serde(rename = "type")]
    pub signal_type: SignalType,
    pub payload: String,
    /// Unix time in seconds
    pub timestamp: i64,
    /// Id of the request this signal answers, if the sender knows it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<SignalId>,
}

impl Signal {
    /// Build a signal with a fresh id and the current timestamp.
    pub fn new(
        source: impl Into<AgentId>,
        target: impl Into<AgentId>,
        signal_type: SignalType,
        payload: impl Into<String>,
    ) -> Self {
        Self {
            id: SignalId::new(),
            source: source.into(),
            target: target.into(),
            signal_type,
            payload: payload.into(),
            timestamp: Utc::now().timestamp(),
            correlation_id: None,
        }
    }

    pub fn task_request(
        source: impl Into<AgentId>,
        target: impl Into<AgentId>,
        payload: impl Into<String>,
    ) -> Self {
        Self::new(source, target, SignalType::TaskRequest, payload)
    }

    /// `TASK_RESULT` addressed back to whoever sent `request`, carrying the
    /// request id so the kernel can match it to the right waiter.
    pub fn reply_to(request: &Signal, payload: impl Into<String>) -> Self {
        let mut reply = Self::new(
            request.target.clone(),
            request.source.clone(),
            SignalType::TaskResult,
            payload,
        );
        reply.correlation_id = Some(request.id.clone());
        reply
    }

    pub fn with_correlation_id(mut self, id: SignalId) -> Self {
        self.correlation_id = Some(id);
        self
    }

    pub fn is_task_result(&self) -> bool {
        self.signal_type == SignalType::TaskResult
    }
}

/// Persisted copy of a routed signal, keyed by the signal id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventLogEntry {
    pub id: String,
    pub source: String,
    pub target: String,
    #[serde(rename = "type")]
    pub signal_type: String,
    pub payload: String,
    pub timestamp: i64,
}

impl From<&Signal> for EventLogEntry {
    fn from(signal: &Signal) -> Self {
        Self {
            id: signal.id.to_string(),
            source: signal.source.to_string(),
            target: signal.target.to_string(),
            signal_type: signal.signal_type.to_string(),
            payload: signal.payload.clone(),
            timestamp: signal.timestamp,
        }
    }
}
