//! Shared types for receiver discovery and control.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A cast-capable receiver, keyed by `id`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceHandle {
    /// Stable device identity (UDN or equivalent).
    pub id: String,
    /// Human-readable name shown in the picker.
    pub name: String,
    /// Network location of the receiver, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

impl DeviceHandle {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            address: None,
        }
    }
}

impl std::fmt::Display for DeviceHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.name, self.id)
    }
}

/// Discovery notification delivered to a registered listener.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryEvent {
    /// A device appeared on the network.
    Added(DeviceHandle),
    /// A device went away.
    Removed(DeviceHandle),
}

/// Connection-state notification for a control point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionEvent {
    /// The control-point handshake with the device completed.
    Connected(DeviceHandle),
    /// The device connection was torn down.
    Disconnected(DeviceHandle),
}

impl ConnectionEvent {
    pub fn device(&self) -> &DeviceHandle {
        match self {
            Self::Connected(device) | Self::Disconnected(device) => device,
        }
    }
}

/// Commands a control point accepts, used for logging and diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlCommand {
    Play,
    Stop,
    SetMute(bool),
    SetTarget { uri: String, title: String },
}

impl ControlCommand {
    /// Command name as reported in diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Play => "play",
            Self::Stop => "stop",
            Self::SetMute(_) => "setMute",
            Self::SetTarget { .. } => "setTarget",
        }
    }
}

/// Errors from the discovery/control subsystem.
#[derive(Debug, Clone, Error)]
pub enum CastError {
    /// Binding to the discovery service failed.
    #[error("failed to bind discovery service: {0}")]
    Bind(String),
    /// Could not open a control point for a device.
    #[error("failed to connect to {device_id}: {reason}")]
    Connect { device_id: String, reason: String },
    /// A remote command reported failure.
    #[error("{0}")]
    Command(String),
}

/// Result type for discovery/control operations.
pub type CastResult<T> = Result<T, CastError>;

/// Outcome of a single remote command: success, or failure with a message.
pub type CommandResult = CastResult<()>;
