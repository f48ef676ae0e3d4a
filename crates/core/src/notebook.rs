//! Notebook lifecycle rules, GPU pricing and access URL construction.
//!
//! Provisioning is driven by explicit signals rather than timers: user
//! actions move a notebook into a transitional status (`starting`,
//! `stopping`) and the runtime reports completion through
//! [`NotebookStatus::complete`].

use std::fmt;
use std::str::FromStr;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::OwnerId;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// First port handed out to Jupyter servers.
pub const JUPYTER_PORT_MIN: i32 = 8888;

/// One past the last port handed out to Jupyter servers.
pub const JUPYTER_PORT_MAX: i32 = 9888;

/// Maximum notebook name length.
pub const MAX_NAME_LEN: usize = 100;

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// Lifecycle status stored in `notebooks.status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotebookStatus {
    Creating,
    Starting,
    Running,
    Stopping,
    Stopped,
    Failed,
}

/// User-initiated lifecycle actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotebookAction {
    Start,
    Stop,
}

impl NotebookStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Creating => "creating",
            Self::Starting => "starting",
            Self::Running => "running",
            Self::Stopping => "stopping",
            Self::Stopped => "stopped",
            Self::Failed => "failed",
        }
    }

    /// Settled states wait for a user action; the others wait for the runtime.
    pub fn is_transitional(self) -> bool {
        matches!(self, Self::Creating | Self::Starting | Self::Stopping)
    }

    /// Status after applying a user action.
    pub fn apply(self, action: NotebookAction) -> Result<Self, CoreError> {
        match (action, self) {
            (NotebookAction::Start, Self::Stopped | Self::Failed) => Ok(Self::Starting),
            (NotebookAction::Start, Self::Running) => {
                Err(CoreError::Conflict("Notebook is already running".into()))
            }
            (NotebookAction::Stop, Self::Running | Self::Starting) => Ok(Self::Stopping),
            (NotebookAction::Stop, Self::Stopped) => {
                Err(CoreError::Conflict("Notebook is already stopped".into()))
            }
            (action, status) => Err(CoreError::Conflict(format!(
                "Cannot {} a notebook that is {status}",
                match action {
                    NotebookAction::Start => "start",
                    NotebookAction::Stop => "stop",
                }
            ))),
        }
    }

    /// Status after the runtime reports `reported` for a pending transition.
    pub fn complete(self, reported: Self) -> Result<Self, CoreError> {
        match (self, reported) {
            (Self::Creating | Self::Starting, Self::Running) => Ok(Self::Running),
            (Self::Stopping, Self::Stopped) => Ok(Self::Stopped),
            (from, Self::Failed) if from.is_transitional() => Ok(Self::Failed),
            (from, to) => Err(CoreError::Conflict(format!(
                "Invalid status report: {from} -> {to}"
            ))),
        }
    }
}

impl fmt::Display for NotebookStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NotebookStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "creating" => Ok(Self::Creating),
            "starting" => Ok(Self::Starting),
            "running" => Ok(Self::Running),
            "stopping" => Ok(Self::Stopping),
            "stopped" => Ok(Self::Stopped),
            "failed" => Ok(Self::Failed),
            other => Err(CoreError::Validation(format!(
                "Unknown notebook status '{other}'"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// GPU types
// ---------------------------------------------------------------------------

/// GPU classes a notebook can be provisioned on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GpuType {
    T4,
    V100,
    A100,
}

impl GpuType {
    pub const ALL: [Self; 3] = [Self::T4, Self::V100, Self::A100];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::T4 => "T4",
            Self::V100 => "V100",
            Self::A100 => "A100",
        }
    }

    /// Cost charged per usage unit. T4 is the free tier.
    pub fn hourly_cost(self) -> f64 {
        match self {
            Self::T4 => 0.0,
            Self::V100 => 0.5,
            Self::A100 => 1.2,
        }
    }
}

impl fmt::Display for GpuType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GpuType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "T4" => Ok(Self::T4),
            "V100" => Ok(Self::V100),
            "A100" => Ok(Self::A100),
            _ => Err(CoreError::Validation(format!(
                "Unknown GPU type '{s}'. Expected one of: T4, V100, A100"
            ))),
        }
    }
}

/// Validate a notebook name: non-blank and at most [`MAX_NAME_LEN`] chars.
pub fn validate_notebook_name(name: &str) -> Result<(), CoreError> {
    if name.trim().is_empty() {
        return Err(CoreError::Validation(
            "Notebook name must not be empty".to_string(),
        ));
    }
    let len = name.chars().count();
    if len > MAX_NAME_LEN {
        return Err(CoreError::Validation(format!(
            "Notebook name too long: {len} chars (max {MAX_NAME_LEN})"
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Endpoint helpers
// ---------------------------------------------------------------------------

/// Pick a Jupyter port in `[JUPYTER_PORT_MIN, JUPYTER_PORT_MAX)`.
pub fn allocate_jupyter_port() -> i32 {
    rand::rng().random_range(JUPYTER_PORT_MIN..JUPYTER_PORT_MAX)
}

/// Base Jupyter URL for an owner's notebook host.
pub fn jupyter_base_url(domain: &str, owner_id: OwnerId) -> String {
    let simple = owner_id.simple().to_string();
    format!("https://jupyter-{}.{domain}", &simple[..8])
}

/// Append the access token to a notebook's Jupyter URL.
pub fn access_url(jupyter_url: &str, token: &str) -> String {
    format!("{jupyter_url}?token={token}")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
