//! Model deployments: lifecycle, instance pricing, scaling bounds and
//! endpoint credentials.
//!
//! A deployment starts in `deploying` and the serving runtime reports
//! `running` or `failed`. Users can stop a deployment and start it again.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::access_token::hash_token;
use crate::error::CoreError;

/// Upper bound for `max_instances`.
pub const MAX_INSTANCES: i32 = 10;

/// Maximum deployment name length.
pub const MAX_DEPLOYMENT_NAME_LEN: usize = 100;

/// Prefix of deployment API keys.
pub const API_KEY_PREFIX: &str = "ml_";

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// Lifecycle status stored in `deployments.status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeploymentStatus {
    Deploying,
    Running,
    Stopped,
    Failed,
}

/// User-initiated deployment actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeploymentAction {
    Start,
    Stop,
}

impl DeploymentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Deploying => "deploying",
            Self::Running => "running",
            Self::Stopped => "stopped",
            Self::Failed => "failed",
        }
    }

    /// Status after applying a user action. Stopping takes effect at once.
    pub fn apply(self, action: DeploymentAction) -> Result<Self, CoreError> {
        match (action, self) {
            (DeploymentAction::Start, Self::Stopped | Self::Failed) => Ok(Self::Deploying),
            (DeploymentAction::Stop, Self::Running | Self::Deploying) => Ok(Self::Stopped),
            (DeploymentAction::Start, Self::Running | Self::Deploying) => Err(
                CoreError::Conflict(format!("Deployment is already {self}")),
            ),
            (DeploymentAction::Stop, _) => Err(CoreError::Conflict(format!(
                "Cannot stop a deployment that is {self}"
            ))),
        }
    }

    /// Status after the serving runtime reports `reported`.
    pub fn complete(self, reported: Self) -> Result<Self, CoreError> {
        match (self, reported) {
            (Self::Deploying, Self::Running | Self::Failed) => Ok(reported),
            (Self::Running, Self::Failed) => Ok(Self::Failed),
            (from, to) => Err(CoreError::Conflict(format!(
                "Invalid status report: {from} -> {to}"
            ))),
        }
    }
}

impl fmt::Display for DeploymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeploymentStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "deploying" => Ok(Self::Deploying),
            "running" => Ok(Self::Running),
            "stopped" => Ok(Self::Stopped),
            "failed" => Ok(Self::Failed),
            other => Err(CoreError::Validation(format!(
                "Unknown deployment status '{other}'"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Instance types
// ---------------------------------------------------------------------------

/// Serving hardware for a deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InstanceType {
    #[serde(rename = "cpu")]
    Cpu,
    #[serde(rename = "gpu-t4")]
    GpuT4,
}

impl InstanceType {
    pub const ALL: [Self; 2] = [Self::Cpu, Self::GpuT4];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cpu => "cpu",
            Self::GpuT4 => "gpu-t4",
        }
    }

    pub fn hourly_cost(self) -> f64 {
        match self {
            Self::Cpu => 0.10,
            Self::GpuT4 => 0.60,
        }
    }

    pub fn per_request_cost(self) -> f64 {
        match self {
            Self::Cpu => 0.001,
            Self::GpuT4 => 0.01,
        }
    }
}

impl fmt::Display for InstanceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InstanceType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "cpu" => Ok(Self::Cpu),
            "gpu-t4" => Ok(Self::GpuT4),
            _ => Err(CoreError::Validation(format!(
                "Unknown instance type '{s}'. Expected one of: cpu, gpu-t4"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

pub fn validate_deployment_name(name: &str) -> Result<(), CoreError> {
    let len = name.trim().chars().count();
    if len == 0 || len > MAX_DEPLOYMENT_NAME_LEN {
        return Err(CoreError::Validation(format!(
            "Deployment name must be 1 to {MAX_DEPLOYMENT_NAME_LEN} chars"
        )));
    }
    Ok(())
}

/// Validate `1 <= min_instances <= max_instances <= MAX_INSTANCES`.
pub fn validate_scaling(min_instances: i32, max_instances: i32) -> Result<(), CoreError> {
    if min_instances < 1 {
        return Err(CoreError::Validation(
            "min_instances must be at least 1".to_string(),
        ));
    }
    if max_instances < min_instances {
        return Err(CoreError::Validation(format!(
            "max_instances ({max_instances}) must not be below min_instances ({min_instances})"
        )));
    }
    if max_instances > MAX_INSTANCES {
        return Err(CoreError::Validation(format!(
            "max_instances must be at most {MAX_INSTANCES}"
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Endpoint credentials
// ---------------------------------------------------------------------------

/// A fresh prediction endpoint and its API key.
///
/// Only the key's hash is stored; the key is shown once at creation.
pub struct EndpointCredentials {
    pub api_endpoint: String,
    pub api_key: String,
    pub api_key_hash: String,
}

impl EndpointCredentials {
    pub fn generate() -> Self {
        let api_key = format!("{API_KEY_PREFIX}{}", Uuid::new_v4().simple());
        let api_key_hash = hash_token(&api_key);
        Self {
            api_endpoint: format!("/predict/{}", Uuid::new_v4().simple()),
            api_key,
            api_key_hash,
        }
    }
}

impl fmt::Debug for EndpointCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EndpointCredentials")
            .field("api_endpoint", &self.api_endpoint)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn stop_and_restart() {
        use DeploymentStatus::*;
        assert_eq!(Running.apply(DeploymentAction::Stop).unwrap(), Stopped);
        assert_eq!(Deploying.apply(DeploymentAction::Stop).unwrap(), Stopped);
        assert_eq!(Stopped.apply(DeploymentAction::Start).unwrap(), Deploying);
        assert_eq!(Failed.apply(DeploymentAction::Start).unwrap(), Deploying);
    }

    #[test]
    fn redundant_actions_conflict() {
        use DeploymentStatus::*;
        assert_matches!(
            Running.apply(DeploymentAction::Start),
            Err(CoreError::Conflict(msg)) if msg == "Deployment is already running"
        );
        assert_matches!(Stopped.apply(DeploymentAction::Stop), Err(CoreError::Conflict(_)));
        assert_matches!(Failed.apply(DeploymentAction::Stop), Err(CoreError::Conflict(_)));
    }

    #[test]
    fn runtime_reports() {
        use DeploymentStatus::*;
        assert_eq!(Deploying.complete(Running).unwrap(), Running);
        assert_eq!(Deploying.complete(Failed).unwrap(), Failed);
        assert_eq!(Running.complete(Failed).unwrap(), Failed);
        assert_matches!(Stopped.complete(Running), Err(CoreError::Conflict(_)));
        assert_matches!(Running.complete(Stopped), Err(CoreError::Conflict(_)));
    }

    #[test]
    fn instance_types_parse_and_price() {
        assert_eq!("GPU-T4".parse::<InstanceType>().unwrap(), InstanceType::GpuT4);
        assert_matches!("tpu".parse::<InstanceType>(), Err(CoreError::Validation(_)));
        assert_eq!(InstanceType::Cpu.hourly_cost(), 0.10);
        assert_eq!(InstanceType::GpuT4.per_request_cost(), 0.01);
    }

    #[test]
    fn deployment_names() {
        assert!(validate_deployment_name("churn-api").is_ok());
        assert!(validate_deployment_name("  ").is_err());
        assert!(validate_deployment_name(&"x".repeat(MAX_DEPLOYMENT_NAME_LEN + 1)).is_err());
    }

    #[test]
    fn scaling_bounds() {
        assert!(validate_scaling(1, 1).is_ok());
        assert!(validate_scaling(2, MAX_INSTANCES).is_ok());
        assert!(validate_scaling(0, 3).is_err());
        assert!(validate_scaling(4, 3).is_err());
        assert!(validate_scaling(1, MAX_INSTANCES + 1).is_err());
    }

    #[test]
    fn credentials_store_only_the_hash() {
        let creds = EndpointCredentials::generate();
        assert!(creds.api_key.starts_with(API_KEY_PREFIX));
        assert!(creds.api_endpoint.starts_with("/predict/"));
        assert_eq!(creds.api_key_hash, hash_token(&creds.api_key));
        assert!(!format!("{creds:?}").contains(&creds.api_key));
    }
}
