//! Server-reported states and the actions that change them.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The lifecycle state of a build as reported by the backend.
///
/// The set is closed on our side but the backend may grow new values, so any
/// unrecognised string survives as [`BuildState::Other`] and is displayed as-is.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum BuildState {
    Stopped,
    Running,
    Deleted,
    Success,
    Failure,
    Verified,
    Other(String),
}

impl BuildState {
    /// Wire value.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Stopped => "STOPPED",
            Self::Running => "RUNNING",
            Self::Deleted => "DELETE",
            Self::Success => "SUCCESS",
            Self::Failure => "FAILURE",
            Self::Verified => "VERIFIED",
            Self::Other(raw) => raw,
        }
    }

    /// Whether the backend will not move this build any further.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Stopped | Self::Deleted | Self::Success | Self::Failure | Self::Verified
        )
    }
}

impl From<String> for BuildState {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "STOPPED" => Self::Stopped,
            "RUNNING" => Self::Running,
            "DELETE" => Self::Deleted,
            "SUCCESS" => Self::Success,
            "FAILURE" => Self::Failure,
            "VERIFIED" => Self::Verified,
            _ => Self::Other(raw),
        }
    }
}

impl From<&str> for BuildState {
    fn from(raw: &str) -> Self {
        Self::from(raw.to_string())
    }
}

impl From<BuildState> for String {
    fn from(state: BuildState) -> Self {
        match state {
            BuildState::Other(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl Default for BuildState {
    fn default() -> Self {
        Self::Other(String::new())
    }
}

impl fmt::Display for BuildState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Visual weight of a state badge.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StateTone {
    Neutral,
    Active,
    Danger,
    Success,
    Failure,
    Verified,
    /// Fallback for states we do not recognise.
    Warning,
}

/// Mutations accepted by `PUT /build/`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildAction {
    /// Protect the build's artifacts from cleanup.
    Lock,
    Unlock,
    Delete,
    /// Stop a running build task.
    Revoke,
}

impl BuildAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Lock => "lock",
            Self::Unlock => "unlock",
            Self::Delete => "delete",
            Self::Revoke => "revoke",
        }
    }
}

impl fmt::Display for BuildAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Power state of an inventory VM.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum VmPowerState {
    PoweredOn,
    PoweredOff,
    Other(String),
}

impl VmPowerState {
    pub fn as_str(&self) -> &str {
        match self {
            Self::PoweredOn => "poweredOn",
            Self::PoweredOff => "poweredOff",
            Self::Other(raw) => raw,
        }
    }
}

impl From<String> for VmPowerState {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "poweredOn" => Self::PoweredOn,
            "poweredOff" => Self::PoweredOff,
            _ => Self::Other(raw),
        }
    }
}

impl From<VmPowerState> for String {
    fn from(state: VmPowerState) -> Self {
        match state {
            VmPowerState::Other(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for VmPowerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Power operations accepted by `POST /vm_action`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VmAction {
    PowerOn,
    PowerOff,
}

impl VmAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PowerOn => "poweron",
            Self::PowerOff => "poweroff",
        }
    }

    /// The power state a VM is left in after this action succeeds.
    pub fn target_state(&self) -> VmPowerState {
        match self {
            Self::PowerOn => VmPowerState::PoweredOn,
            Self::PowerOff => VmPowerState::PoweredOff,
        }
    }
}

impl fmt::Display for VmAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
