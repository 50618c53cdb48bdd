//! Vireo Core - playback session coordination for a media streaming client.
//!
//! This crate owns the state of one playback session: which item or playlist
//! is being played, what the local player reports, whether audio is muted,
//! and which cast receiver (if any) the session is mirrored to. Storage,
//! media playback and device discovery are external collaborators reached
//! through traits.
//!
//! # Architecture
//!
//! - [`runtime`]: Task spawning abstraction for async runtime independence
//! - [`events`]: Event system for session observers
//! - [`state`]: Configuration and the published session store
//! - [`model`]: Session value types
//! - [`catalog`]: Item/container storage collaborator
//! - [`media`]: Media engine collaborator
//! - [`cast`]: Receiver discovery and control
//! - [`services`]: Initialization, player telemetry and the coordinator
//! - [`error`]: Centralized error types
//!
//! # Abstraction Traits
//!
//! - [`TaskSpawner`](runtime::TaskSpawner): Spawning background tasks
//! - [`EventEmitter`](events::EventEmitter): Emitting domain events
//! - [`Catalog`](catalog::Catalog): Item storage
//! - [`MediaEngine`](media::MediaEngine): Local playback
//! - [`DeviceRegistry`](cast::DeviceRegistry) / [`ControlPoint`](cast::ControlPoint):
//!   Receiver discovery and control
//!
//! Each trait has an in-process implementation suitable for the headless driver.

#![allow(missing_docs)]
#![warn(clippy::all)]

pub mod bootstrap;
pub mod cast;
pub mod catalog;
pub mod error;
pub mod events;
pub mod media;
pub mod model;
pub mod protocol_constants;
pub mod runtime;
pub mod services;
pub mod state;
pub mod utils;

#[cfg(test)]
pub(crate) mod test_fixtures;

// Re-export commonly used types at the crate root
pub use error::{CastResult, CatalogResult, CommandResult, CoreError, CoreResult, ErrorCode};
pub use events::{
    BroadcastEvent, BroadcastEventBridge, DeviceEvent, DiagnosticEvent, EventEmitter,
    LoggingEventEmitter, NoopEventEmitter, SessionEvent,
};
pub use runtime::{TaskSpawner, TokioSpawner};
pub use state::{CoreConfig, SessionStore};
pub use utils::now_millis;

// Re-export domain types
pub use model::{
    Container, InitMode, Item, PlaybackStatus, PlayerError, PlayerSnapshot, SessionState,
    VideoGeometry,
};

// Re-export collaborator types
pub use cast::{
    ConnectionEvent, ControlCommand, ControlPoint, DeviceHandle, DeviceRegistry,
    LoggingControlPoint, RegistryEvent, StaticDeviceRegistry,
};
pub use catalog::{Catalog, CatalogError, InMemoryCatalog};
pub use media::{MediaEngine, PlayerHandle, SharedPlayer, SoftwarePlayer, WatchMediaEngine};

// Re-export service types
pub use services::{InitPhase, SessionCollaborators, SessionCommand, SessionCoordinator};

// Re-export bootstrap types
pub use bootstrap::{bootstrap_session, BootstrappedSession};
