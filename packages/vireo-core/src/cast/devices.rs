//! The set of receivers discovered while the device picker is open.

use dashmap::DashMap;

use super::types::DeviceHandle;

/// Discovered devices keyed by device identity.
///
/// Insertion is idempotent per identity: re-announcing a known device
/// refreshes its handle but is not reported as a new appearance.
#[derive(Debug, Default)]
pub struct DiscoveredDeviceSet {
    devices: DashMap<String, DeviceHandle>,
}

impl DiscoveredDeviceSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a device. Returns `true` if its identity was not yet known.
    pub fn insert(&self, device: DeviceHandle) -> bool {
        self.devices.insert(device.id.clone(), device).is_none()
    }

    /// Removes a device by identity.
    pub fn remove(&self, id: &str) -> Option<DeviceHandle> {
        self.devices.remove(id).map(|(_, device)| device)
    }

    pub fn get(&self, id: &str) -> Option<DeviceHandle> {
        self.devices.get(id).map(|r| r.value().clone())
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// Removes every device, returning how many were dropped.
    pub fn clear(&self) -> usize {
        let count = self.devices.len();
        self.devices.clear();
        count
    }

    /// Returns all devices sorted by name, then identity.
    pub fn snapshot(&self) -> Vec<DeviceHandle> {
        let mut devices: Vec<DeviceHandle> =
            self.devices.iter().map(|r| r.value().clone()).collect();
        devices.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        devices
    }
}
