//! Cast receiver discovery and control.
//!
//! This module wraps the external discovery-and-control subsystem. The
//! protocol itself lives behind [`DeviceRegistry`] and [`ControlPoint`];
//! everything here is session-side plumbing.
//!
//! # Module Structure
//!
//! - `types` - Device handles, notifications and cast errors
//! - `traits` - Trait abstractions over the discovery/control subsystem
//! - `devices` - The discovered device set
//! - `registry` - Picker-scoped registry client (bind, listen, unbind)
//! - `control` - The single active control-point slot
//! - `static_registry` - Registry advertising a fixed device list

pub(crate) mod control;
pub mod devices;
pub mod registry;
pub mod static_registry;
pub mod traits;
pub mod types;

// Re-export domain types
pub use types::{
    CastError, CastResult, CommandResult, ConnectionEvent, ControlCommand, DeviceHandle,
    RegistryEvent,
};

// Re-export trait abstractions
pub use traits::{ControlPoint, DeviceRegistry};

pub use devices::DiscoveredDeviceSet;
pub use registry::DeviceRegistryClient;
pub use static_registry::{LoggingControlPoint, StaticDeviceRegistry};
