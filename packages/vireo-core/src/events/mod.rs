//! Event system for session observers.
//!
//! This module provides:
//! - [`EventEmitter`] trait for session services to emit events
//! - [`BroadcastEventBridge`] for channel-based transport
//! - Event types for session, device and diagnostic domains

mod bridge;
mod emitter;

pub use bridge::BroadcastEventBridge;
pub use emitter::{EventEmitter, LoggingEventEmitter, NoopEventEmitter};

use serde::Serialize;

use crate::cast::DeviceHandle;

/// Events broadcast to observers.
///
/// Each category has its own inner event type with specific variants.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "category", rename_all = "camelCase")]
pub enum BroadcastEvent {
    /// Session state transitions.
    Session(SessionEvent),

    /// Receiver discovery and connection.
    Device(DeviceEvent),

    /// Non-fatal conditions worth surfacing.
    Diagnostic(DiagnosticEvent),
}

/// Events related to session state changes.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum SessionEvent {
    /// An initialization request was resolved and published.
    #[serde(rename_all = "camelCase")]
    InitResolved {
        /// `single` or `playlist`.
        mode: String,
        /// Number of resolved items.
        item_count: usize,
        /// Unix timestamp in milliseconds.
        timestamp: u64,
    },
    /// The mute flag changed.
    MuteChanged {
        muted: bool,
        /// Unix timestamp in milliseconds.
        timestamp: u64,
    },
    /// The device picker was opened.
    PickerOpened {
        /// Unix timestamp in milliseconds.
        timestamp: u64,
    },
    /// The device picker was closed.
    PickerClosed {
        /// Unix timestamp in milliseconds.
        timestamp: u64,
    },
}

/// Events related to receiver discovery and connections.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum DeviceEvent {
    /// A receiver was discovered.
    Appeared {
        device: DeviceHandle,
        /// Unix timestamp in milliseconds.
        timestamp: u64,
    },
    /// A receiver went away.
    Removed {
        #[serde(rename = "deviceId")]
        device_id: String,
        /// Unix timestamp in milliseconds.
        timestamp: u64,
    },
    /// A control-point handshake completed.
    Connected {
        device: DeviceHandle,
        /// Unix timestamp in milliseconds.
        timestamp: u64,
    },
    /// A receiver connection was torn down.
    Disconnected {
        #[serde(rename = "deviceId")]
        device_id: String,
        /// Unix timestamp in milliseconds.
        timestamp: u64,
    },
}

/// Diagnostics for conditions that never fail the session.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum DiagnosticEvent {
    /// A remote-control action is not supported in the current mode.
    UnsupportedOperation {
        operation: String,
        reason: String,
        /// Unix timestamp in milliseconds.
        timestamp: u64,
    },
    /// A dependent action was skipped because its target is absent.
    TargetUnavailable {
        reason: String,
        /// Unix timestamp in milliseconds.
        timestamp: u64,
    },
    /// A remote command reported failure.
    CommandFailed {
        #[serde(rename = "deviceId")]
        device_id: String,
        command: String,
        message: String,
        /// Unix timestamp in milliseconds.
        timestamp: u64,
    },
    /// A collaborator (catalog, registry) call failed.
    CollaboratorFailed {
        operation: String,
        message: String,
        /// Unix timestamp in milliseconds.
        timestamp: u64,
    },
}

// From implementations for converting inner events to BroadcastEvent
impl From<SessionEvent> for BroadcastEvent {
    fn from(event: SessionEvent) -> Self {
        BroadcastEvent::Session(event)
    }
}

impl From<DeviceEvent> for BroadcastEvent {
    fn from(event: DeviceEvent) -> Self {
        BroadcastEvent::Device(event)
    }
}

impl From<DiagnosticEvent> for BroadcastEvent {
    fn from(event: DiagnosticEvent) -> Self {
        BroadcastEvent::Diagnostic(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_event_serializes_with_category_and_type() {
        let event: BroadcastEvent = DeviceEvent::Removed {
            device_id: "tv".into(),
            timestamp: 5,
        }
        .into();
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["category"], "device");
        assert_eq!(json["type"], "removed");
        assert_eq!(json["deviceId"], "tv");
    }

    #[test]
    fn init_resolved_uses_camel_case_fields() {
        let event: BroadcastEvent = SessionEvent::InitResolved {
            mode: "playlist".into(),
            item_count: 2,
            timestamp: 1,
        }
        .into();
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "initResolved");
        assert_eq!(json["itemCount"], 2);
    }
}
