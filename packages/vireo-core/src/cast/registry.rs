//! Picker-scoped client of the discovery subsystem.
//!
//! While the device picker is open the client holds a binding to the
//! registry, a registered listener, and a forwarder task that folds
//! added/removed notifications into the [`DiscoveredDeviceSet`]. Closing the
//! picker tears all three down and clears the set.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::runtime::{TaskSpawner, TokioSpawner};

use super::devices::DiscoveredDeviceSet;
use super::traits::{ControlPoint, DeviceRegistry};
use super::types::{CastResult, ConnectionEvent, DeviceHandle, RegistryEvent};

/// An effective change to the discovered device set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceSetChange {
    Appeared(DeviceHandle),
    Removed(DeviceHandle),
}

/// Callback invoked by the forwarder after each effective change.
pub type DeviceSetListener = Arc<dyn Fn(DeviceSetChange, &DiscoveredDeviceSet) + Send + Sync>;

/// Wraps bind/listen/connect against a [`DeviceRegistry`].
pub struct DeviceRegistryClient {
    registry: Arc<dyn DeviceRegistry>,
    devices: Arc<DiscoveredDeviceSet>,
    /// Cancels the forwarder; `Some` while open.
    forwarder: Mutex<Option<CancellationToken>>,
    spawner: TokioSpawner,
}

impl DeviceRegistryClient {
    pub fn new(registry: Arc<dyn DeviceRegistry>, spawner: TokioSpawner) -> Self {
        Self {
            registry,
            devices: Arc::new(DiscoveredDeviceSet::new()),
            forwarder: Mutex::new(None),
            spawner,
        }
    }

    /// The discovered device set.
    pub fn devices(&self) -> &Arc<DiscoveredDeviceSet> {
        &self.devices
    }

    pub fn is_open(&self) -> bool {
        self.forwarder.lock().is_some()
    }

    /// Binds, registers for notifications and starts forwarding them.
    ///
    /// Opening an already open client is a no-op. The forwarder runs under a
    /// child of `parent`, so session teardown stops it too.
    ///
    /// # Errors
    ///
    /// Returns the registry's bind error; nothing is registered in that case.
    pub async fn open(
        &self,
        parent: &CancellationToken,
        listener: DeviceSetListener,
    ) -> CastResult<()> {
        if self.is_open() {
            log::debug!("[Picker] Registry client already open");
            return Ok(());
        }

        self.registry.bind().await?;

        let token = parent.child_token();
        let (tx, rx) = mpsc::unbounded_channel();
        {
            let mut forwarder = self.forwarder.lock();
            if forwarder.is_some() {
                // Lost a race with a concurrent open; that one owns the binding.
                return Ok(());
            }
            *forwarder = Some(token.clone());
        }
        self.registry.register_listener(tx);

        let devices = Arc::clone(&self.devices);
        let forward_token = token.clone();
        self.spawner.spawn_cancellable(token, async move {
            forward_notifications(rx, devices, listener, forward_token).await;
        });

        log::info!("[Picker] Listening for devices");
        Ok(())
    }

    /// Stops forwarding, unregisters, clears the device set and unbinds.
    ///
    /// Returns the number of devices that were cleared. Closing a client that
    /// is not open only clears the set.
    pub async fn close(&self) -> usize {
        let token = self.forwarder.lock().take();
        let Some(token) = token else {
            return self.devices.clear();
        };

        token.cancel();
        self.registry.unregister_listener();
        let cleared = self.devices.clear();
        self.registry.unbind().await;

        log::info!("[Picker] Stopped listening ({} device(s) cleared)", cleared);
        cleared
    }

    /// Opens a control point for `device`.
    pub async fn connect(
        &self,
        device: &DeviceHandle,
        listener: mpsc::UnboundedSender<ConnectionEvent>,
    ) -> CastResult<Arc<dyn ControlPoint>> {
        self.registry.connect(device, listener).await
    }

    /// Tears down the connection to `device`.
    pub async fn disconnect(&self, device: &DeviceHandle) {
        self.registry.disconnect(device).await;
    }
}

async fn forward_notifications(
    mut rx: mpsc::UnboundedReceiver<RegistryEvent>,
    devices: Arc<DiscoveredDeviceSet>,
    listener: DeviceSetListener,
    token: CancellationToken,
) {
    while let Some(event) = rx.recv().await {
        if token.is_cancelled() {
            break;
        }
        let change = match event {
            RegistryEvent::Added(device) => {
                if !devices.insert(device.clone()) {
                    log::trace!("[Picker] Device {} re-announced", device);
                    continue;
                }
                DeviceSetChange::Appeared(device)
            }
            RegistryEvent::Removed(device) => match devices.remove(&device.id) {
                Some(removed) => DeviceSetChange::Removed(removed),
                None => continue,
            },
        };
        listener(change, &devices);
    }
}
