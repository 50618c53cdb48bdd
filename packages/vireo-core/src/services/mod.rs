//! Session services layer.
//!
//! This module contains the services that turn session commands and
//! collaborator streams into published session state.

pub mod init_machine;
pub mod player_state;
pub mod session_coordinator;

pub use init_machine::{InitPhase, PlaybackInitializer};
pub use player_state::PlayerStateAggregator;
pub use session_coordinator::{SessionCollaborators, SessionCommand, SessionCoordinator};
