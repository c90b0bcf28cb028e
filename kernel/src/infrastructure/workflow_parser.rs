// Copyright (c) 2026 Vryndara contributors
// SPDX-License-Identifier: AGPL-3.0
//! Workflow Definition Parser
//!
//! Turns workflow files into [`WorkflowRequest`]s for `vryndara workflow run`.
//!
//! # Manifest Format
//!
//! ```yaml
//! apiVersion: vryndara.ai/v1
//! kind: Workflow
//! metadata:
//!   name: historabook-movie
//! spec:
//!   steps:
//!     - agent_id: researcher-1
//!       task: Find interesting facts about the Great Wall of China
//!       order: 1
//!     - agent_id: director-1
//!       task: Write a shot list from the facts
//!       order: 2
//! ```
//!
//! `task`/`order` may also be spelled `task_payload`/`step_order`. Files
//! ending in `.json` are read as the gateway's plain `{"steps": [...]}` body.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::domain::workflow::{WorkflowId, WorkflowRequest, WorkflowStep};

pub const WORKFLOW_API_VERSION: &str = "vryndara.ai/v1";
pub const WORKFLOW_KIND: &str = "Workflow";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowManifest {
    pub api_version: String,
    pub kind: String,
    pub metadata: WorkflowMetadataYaml,
    pub spec: WorkflowSpecYaml,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowMetadataYaml {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowSpecYaml {
    /// Fixed id; defaults to `<metadata.name>-<unix seconds>`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workflow_id: Option<String>,
    #[serde(default)]
    pub steps: Vec<WorkflowStep>,
}

/// Body accepted by the HTTP gateway and by `.json` workflow files
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowSubmission {
    #[serde(default)]
    pub workflow_id: Option<String>,
    pub steps: Vec<WorkflowStep>,
}

impl WorkflowSubmission {
    pub fn into_request(self) -> Result<WorkflowRequest, WorkflowParseError> {
        let workflow_id = match self.workflow_id.filter(|id| !id.is_empty()) {
            Some(id) => WorkflowId::new(id),
            None => WorkflowId::generate(),
        };
        validate_steps(&self.steps)?;
        Ok(WorkflowRequest::new(workflow_id, self.steps))
    }
}

pub struct WorkflowParser;

impl WorkflowParser {
    pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<WorkflowRequest, WorkflowParseError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| WorkflowParseError::IoError {
            path: path.display().to_string(),
            error: e.to_string(),
        })?;

        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        if is_json {
            Self::parse_json(&content)
        } else {
            Self::parse_yaml(&content)
        }
    }

    pub fn parse_yaml(yaml: &str) -> Result<WorkflowRequest, WorkflowParseError> {
        let manifest: WorkflowManifest =
            serde_yaml::from_str(yaml).map_err(|e| WorkflowParseError::YamlError(e.to_string()))?;

        Self::validate_and_convert(manifest)
    }

    pub fn parse_json(json: &str) -> Result<WorkflowRequest, WorkflowParseError> {
        let submission: WorkflowSubmission =
            serde_json::from_str(json).map_err(|e| WorkflowParseError::JsonError(e.to_string()))?;

        submission.into_request()
    }

    fn validate_and_convert(manifest: WorkflowManifest) -> Result<WorkflowRequest, WorkflowParseError> {
        if manifest.api_version != WORKFLOW_API_VERSION {
            return Err(WorkflowParseError::InvalidApiVersion {
                expected: WORKFLOW_API_VERSION.to_string(),
                got: manifest.api_version,
            });
        }

        if manifest.kind != WORKFLOW_KIND {
            return Err(WorkflowParseError::InvalidKind {
                expected: WORKFLOW_KIND.to_string(),
                got: manifest.kind,
            });
        }

        if manifest.metadata.name.trim().is_empty() {
            return Err(WorkflowParseError::ValidationError(
                "metadata.name cannot be empty".to_string(),
            ));
        }

        validate_steps(&manifest.spec.steps)?;

        let workflow_id = match manifest.spec.workflow_id.filter(|id| !id.is_empty()) {
            Some(id) => WorkflowId::new(id),
            None => WorkflowId::new(format!("{}-{}", manifest.metadata.name, Utc::now().timestamp())),
        };

        Ok(WorkflowRequest::new(workflow_id, manifest.spec.steps))
    }
}

fn validate_steps(steps: &[WorkflowStep]) -> Result<(), WorkflowParseError> {
    for step in steps {
        if step.agent_id.is_empty() {
            return Err(WorkflowParseError::ValidationError(format!(
                "step {} has an empty agent_id",
                step.step_order
            )));
        }
    }
    Ok(())
}

#[derive(Debug, thiserror::Error)]
pub enum WorkflowParseError {
    #[error("IO error reading {path}: {error}")]
    IoError { path: String, error: String },

    #[error("YAML parse error: {0}")]
    YamlError(String),

    #[error("JSON parse error: {0}")]
    JsonError(String),

    #[error("Invalid API version: expected '{expected}', got '{got}'")]
    InvalidApiVersion { expected: String, got: String },

    #[error("Invalid kind: expected '{expected}', got '{got}'")]
    InvalidKind { expected: String, got: String },

    #[error("Validation error: {0}")]
    ValidationError(String),
}
