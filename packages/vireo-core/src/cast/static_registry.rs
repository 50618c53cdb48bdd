//! A registry that advertises a fixed list of receivers.
//!
//! Backs the headless driver, where devices come from configuration rather
//! than network discovery. Control points only log and acknowledge commands.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::Mutex;
use tokio::sync::mpsc;

use super::traits::{ControlPoint, DeviceRegistry};
use super::types::{
    CastError, CastResult, CommandResult, ConnectionEvent, ControlCommand, DeviceHandle,
    RegistryEvent,
};

/// Control point that records and logs every command it receives.
pub struct LoggingControlPoint {
    device: DeviceHandle,
    history: Mutex<Vec<ControlCommand>>,
}

impl LoggingControlPoint {
    pub fn new(device: DeviceHandle) -> Self {
        Self {
            device,
            history: Mutex::new(Vec::new()),
        }
    }

    /// Commands received so far, oldest first.
    pub fn history(&self) -> Vec<ControlCommand> {
        self.history.lock().clone()
    }

    fn record(&self, command: ControlCommand) -> CommandResult {
        log::info!("[Control] {} <- {:?}", self.device, command);
        self.history.lock().push(command);
        Ok(())
    }
}

#[async_trait]
impl ControlPoint for LoggingControlPoint {
    fn device(&self) -> &DeviceHandle {
        &self.device
    }

    async fn play(&self) -> CommandResult {
        self.record(ControlCommand::Play)
    }

    async fn stop(&self) -> CommandResult {
        self.record(ControlCommand::Stop)
    }

    async fn set_mute(&self, mute: bool) -> CommandResult {
        self.record(ControlCommand::SetMute(mute))
    }

    async fn set_target(&self, uri: &str, title: &str) -> CommandResult {
        self.record(ControlCommand::SetTarget {
            uri: uri.to_string(),
            title: title.to_string(),
        })
    }
}

/// Registry over a configured device list.
pub struct StaticDeviceRegistry {
    devices: Vec<DeviceHandle>,
    bound: AtomicBool,
    listener: Mutex<Option<mpsc::UnboundedSender<RegistryEvent>>>,
    /// device id -> connection listener
    connections: DashMap<String, mpsc::UnboundedSender<ConnectionEvent>>,
}

impl StaticDeviceRegistry {
    pub fn new(devices: Vec<DeviceHandle>) -> Self {
        Self {
            devices,
            bound: AtomicBool::new(false),
            listener: Mutex::new(None),
            connections: DashMap::new(),
        }
    }

    pub fn is_bound(&self) -> bool {
        self.bound.load(Ordering::SeqCst)
    }

    /// Number of devices with an open connection.
    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }
}

#[async_trait]
impl DeviceRegistry for StaticDeviceRegistry {
    async fn bind(&self) -> CastResult<()> {
        self.bound.store(true, Ordering::SeqCst);
        log::debug!("[Registry] Bound ({} configured devices)", self.devices.len());
        Ok(())
    }

    async fn unbind(&self) {
        self.bound.store(false, Ordering::SeqCst);
        log::debug!("[Registry] Unbound");
    }

    fn register_listener(&self, listener: mpsc::UnboundedSender<RegistryEvent>) {
        for device in &self.devices {
            if listener.send(RegistryEvent::Added(device.clone())).is_err() {
                break;
            }
        }
        *self.listener.lock() = Some(listener);
    }

    fn unregister_listener(&self) {
        self.listener.lock().take();
    }

    async fn connect(
        &self,
        device: &DeviceHandle,
        listener: mpsc::UnboundedSender<ConnectionEvent>,
    ) -> CastResult<Arc<dyn ControlPoint>> {
        if !self.devices.iter().any(|d| d.id == device.id) {
            return Err(CastError::Connect {
                device_id: device.id.clone(),
                reason: "unknown device".to_string(),
            });
        }

        let control_point = Arc::new(LoggingControlPoint::new(device.clone()));
        if listener
            .send(ConnectionEvent::Connected(device.clone()))
            .is_err()
        {
            log::debug!("[Registry] Connection listener for {} already closed", device);
        }
        self.connections.insert(device.id.clone(), listener);
        Ok(control_point)
    }

    async fn disconnect(&self, device: &DeviceHandle) {
        if let Some((_, listener)) = self.connections.remove(&device.id) {
            let _ = listener.send(ConnectionEvent::Disconnected(device.clone()));
        }
    }
}
