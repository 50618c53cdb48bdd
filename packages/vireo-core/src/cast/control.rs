//! The single active control point.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

use super::traits::ControlPoint;
use super::types::{CommandResult, ControlCommand, DeviceHandle};

/// A connected control point and the token scoping its in-flight commands.
#[derive(Clone)]
pub(crate) struct ActiveControl {
    /// Distinguishes successive connections, including to the same device.
    pub id: u64,
    pub control_point: Arc<dyn ControlPoint>,
    /// Cancelled when the connection is released; pending commands are abandoned.
    pub token: CancellationToken,
}

impl ActiveControl {
    pub fn new(id: u64, control_point: Arc<dyn ControlPoint>, token: CancellationToken) -> Self {
        Self {
            id,
            control_point,
            token,
        }
    }

    pub fn device(&self) -> &DeviceHandle {
        self.control_point.device()
    }
}

/// Holds at most one live control point.
///
/// Only one handle is ever stored, so no two tasks can drive two different
/// receivers through the session at the same time.
#[derive(Default)]
pub(crate) struct ControlPointSlot {
    active: Mutex<Option<ActiveControl>>,
}

impl ControlPointSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `active`, returning the control point it replaced.
    pub fn replace(&self, active: ActiveControl) -> Option<ActiveControl> {
        self.active.lock().replace(active)
    }

    /// Removes and returns the active control point.
    pub fn take(&self) -> Option<ActiveControl> {
        self.active.lock().take()
    }

    /// Removes the active control point only if it is connection `id`.
    pub fn take_if(&self, id: u64) -> Option<ActiveControl> {
        let mut active = self.active.lock();
        if active.as_ref().is_some_and(|a| a.id == id) {
            return active.take();
        }
        None
    }

    pub fn current(&self) -> Option<ActiveControl> {
        self.active.lock().clone()
    }

    /// Whether connection `id` is the active one.
    pub fn is_current(&self, id: u64) -> bool {
        self.active.lock().as_ref().is_some_and(|a| a.id == id)
    }

    /// Device of the active control point.
    pub fn device(&self) -> Option<DeviceHandle> {
        self.active.lock().as_ref().map(|a| a.device().clone())
    }
}

/// Runs `command` against `control_point`.
pub(crate) async fn execute(
    control_point: &dyn ControlPoint,
    command: &ControlCommand,
) -> CommandResult {
    match command {
        ControlCommand::Play => control_point.play().await,
        ControlCommand::Stop => control_point.stop().await,
        ControlCommand::SetMute(mute) => control_point.set_mute(*mute).await,
        ControlCommand::SetTarget { uri, title } => control_point.set_target(uri, title).await,
    }
}
