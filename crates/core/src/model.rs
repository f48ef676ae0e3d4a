//! Registered model lifecycle and input validation.
//!
//! A model is registered from a notebook while it trains. The training job
//! reports the outcome through [`ModelStatus::complete`]; only `ready`
//! models can be deployed.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Maximum model name length.
pub const MAX_MODEL_NAME_LEN: usize = 100;

/// Maximum length of the free-form model type, e.g. `pytorch`.
pub const MAX_MODEL_TYPE_LEN: usize = 50;

/// Maximum number of pinned requirements.
pub const MAX_REQUIREMENTS: usize = 100;

/// Lifecycle status stored in `models.status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelStatus {
    Training,
    Ready,
    Failed,
}

impl ModelStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Training => "training",
            Self::Ready => "ready",
            Self::Failed => "failed",
        }
    }

    /// Status after the training job reports `reported`.
    pub fn complete(self, reported: Self) -> Result<Self, CoreError> {
        match (self, reported) {
            (Self::Training, Self::Ready | Self::Failed) => Ok(reported),
            (from, to) => Err(CoreError::Conflict(format!(
                "Invalid status report: {from} -> {to}"
            ))),
        }
    }

    /// Deployments can only be created from a ready model.
    pub fn ensure_deployable(self) -> Result<(), CoreError> {
        match self {
            Self::Ready => Ok(()),
            other => Err(CoreError::Conflict(format!(
                "Model is {other}, only ready models can be deployed"
            ))),
        }
    }
}

impl fmt::Display for ModelStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "training" => Ok(Self::Training),
            "ready" => Ok(Self::Ready),
            "failed" => Ok(Self::Failed),
            other => Err(CoreError::Validation(format!(
                "Unknown model status '{other}'"
            ))),
        }
    }
}

/// Validate a model name: non-blank and at most [`MAX_MODEL_NAME_LEN`] chars.
pub fn validate_model_name(name: &str) -> Result<(), CoreError> {
    if name.trim().is_empty() {
        return Err(CoreError::Validation(
            "Model name must not be empty".to_string(),
        ));
    }
    let len = name.chars().count();
    if len > MAX_MODEL_NAME_LEN {
        return Err(CoreError::Validation(format!(
            "Model name too long: {len} chars (max {MAX_MODEL_NAME_LEN})"
        )));
    }
    Ok(())
}

/// Validate the model type and requirement list.
pub fn validate_model_spec(model_type: &str, requirements: &[String]) -> Result<(), CoreError> {
    if model_type.trim().is_empty() || model_type.len() > MAX_MODEL_TYPE_LEN {
        return Err(CoreError::Validation(format!(
            "Model type must be 1 to {MAX_MODEL_TYPE_LEN} chars"
        )));
    }
    if requirements.len() > MAX_REQUIREMENTS {
        return Err(CoreError::Validation(format!(
            "Too many requirements: {} (max {MAX_REQUIREMENTS})",
            requirements.len()
        )));
    }
    if requirements.iter().any(|r| r.trim().is_empty()) {
        return Err(CoreError::Validation(
            "Requirements must not contain blank entries".to_string(),
        ));
    }
    Ok(())
}
