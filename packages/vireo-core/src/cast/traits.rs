//! Trait abstractions over the discovery/control subsystem.
//!
//! These traits enable dependency injection for testability. The session
//! depends on them rather than on any concrete protocol implementation.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::types::{CastResult, CommandResult, ConnectionEvent, DeviceHandle, RegistryEvent};

/// One live connection to a remote receiver.
///
/// Every command resolves to a [`CommandResult`]: `Ok` on the receiver's
/// success callback, `Err(CastError::Command(message))` on failure.
#[async_trait]
pub trait ControlPoint: Send + Sync {
    /// The device this control point talks to.
    fn device(&self) -> &DeviceHandle;

    /// Starts playback of the current target.
    async fn play(&self) -> CommandResult;

    /// Stops playback.
    async fn stop(&self) -> CommandResult;

    /// Mutes or unmutes the receiver.
    async fn set_mute(&self, mute: bool) -> CommandResult;

    /// Sets the media the receiver should load.
    ///
    /// # Arguments
    /// * `uri` - Stream URL the receiver fetches
    /// * `title` - Display title
    async fn set_target(&self, uri: &str, title: &str) -> CommandResult;
}

/// The discovery-and-control subsystem.
///
/// Used by [`DeviceRegistryClient`](super::DeviceRegistryClient) for the
/// picker lifecycle and by the session coordinator to open control points.
#[async_trait]
pub trait DeviceRegistry: Send + Sync {
    /// Binds to the discovery service.
    async fn bind(&self) -> CastResult<()>;

    /// Releases the discovery service binding.
    async fn unbind(&self);

    /// Registers for device added/removed notifications.
    ///
    /// Replaces any previously registered listener.
    fn register_listener(&self, listener: mpsc::UnboundedSender<RegistryEvent>);

    /// Stops delivering device notifications.
    fn unregister_listener(&self);

    /// Opens a control point for `device`.
    ///
    /// The handshake completes asynchronously; `listener` receives
    /// [`ConnectionEvent::Connected`] once the device is usable and
    /// [`ConnectionEvent::Disconnected`] when the connection goes away.
    async fn connect(
        &self,
        device: &DeviceHandle,
        listener: mpsc::UnboundedSender<ConnectionEvent>,
    ) -> CastResult<Arc<dyn ControlPoint>>;

    /// Tears down the connection to `device`.
    async fn disconnect(&self, device: &DeviceHandle);
}
