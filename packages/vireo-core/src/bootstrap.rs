//! Session bootstrap and dependency wiring.
//!
//! This module is the composition root: the single place where a session's
//! services are instantiated and wired together around the collaborators
//! supplied by the host.

use std::sync::Arc;

use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::error::CoreResult;
use crate::events::{BroadcastEvent, BroadcastEventBridge, EventEmitter};
use crate::runtime::TokioSpawner;
use crate::services::{SessionCollaborators, SessionCoordinator};
use crate::state::CoreConfig;

/// Container for a bootstrapped session.
#[derive(Clone)]
pub struct BootstrappedSession {
    /// Coordinates the session's state and collaborators.
    pub coordinator: Arc<SessionCoordinator>,
    /// Broadcast channel sender for session events.
    pub broadcast_tx: broadcast::Sender<BroadcastEvent>,
    /// Event bridge for emitting events to the channel and an optional external consumer.
    pub event_bridge: Arc<BroadcastEventBridge>,
    /// Task spawner for background operations.
    pub spawner: TokioSpawner,
    /// Cancellation token for graceful shutdown.
    pub cancel_token: CancellationToken,
}

impl BootstrappedSession {
    /// Starts the session's long-running background tasks.
    pub fn start_background_tasks(&self) -> bool {
        let started = self.coordinator.start();
        if started {
            log::info!(
                "[Bootstrap] Session {} started",
                self.coordinator.state().session_id
            );
        }
        started
    }

    /// Returns a new receiver for session events.
    pub fn subscribe_events(&self) -> broadcast::Receiver<BroadcastEvent> {
        self.broadcast_tx.subscribe()
    }

    /// Releases every collaborator the session holds and cancels its tasks.
    pub async fn shutdown(&self) {
        log::info!("[Bootstrap] Beginning graceful shutdown...");

        if !self.coordinator.shutdown().await {
            log::debug!("[Bootstrap] Session already shut down");
        }
        self.cancel_token.cancel();

        log::info!("[Bootstrap] Shutdown complete");
    }
}

/// Bootstraps a session over the given collaborators.
///
/// Must be called from within a Tokio runtime.
///
/// # Errors
///
/// Returns [`CoreError::Configuration`](crate::error::CoreError::Configuration)
/// if `config` is invalid.
pub fn bootstrap_session(
    config: &CoreConfig,
    collaborators: SessionCollaborators,
) -> CoreResult<BootstrappedSession> {
    config.validate()?;

    let spawner = TokioSpawner::current();

    let (broadcast_tx, _) = broadcast::channel::<BroadcastEvent>(config.event_channel_capacity);
    let event_bridge = Arc::new(BroadcastEventBridge::with_sender(broadcast_tx.clone()));

    let cancel_token = CancellationToken::new();

    let session_id = Uuid::new_v4().to_string();
    let coordinator = Arc::new(SessionCoordinator::new(
        session_id,
        collaborators,
        config,
        Arc::clone(&event_bridge) as Arc<dyn EventEmitter>,
        spawner.clone(),
        cancel_token.child_token(),
    ));

    Ok(BootstrappedSession {
        coordinator,
        broadcast_tx,
        event_bridge,
        spawner,
        cancel_token,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cast::StaticDeviceRegistry;
    use crate::catalog::InMemoryCatalog;
    use crate::error::CoreError;
    use crate::events::SessionEvent;
    use crate::media::WatchMediaEngine;
    use crate::services::SessionCommand;

    fn collaborators() -> SessionCollaborators {
        SessionCollaborators {
            catalog: Arc::new(InMemoryCatalog::new()),
            media: Arc::new(WatchMediaEngine::new()),
            registry: Arc::new(StaticDeviceRegistry::new(Vec::new())),
        }
    }

    #[tokio::test]
    async fn rejects_zero_channel_capacity() {
        let config = CoreConfig {
            event_channel_capacity: 0,
            ..CoreConfig::default()
        };
        let result = bootstrap_session(&config, collaborators());
        assert!(matches!(result, Err(CoreError::Configuration(_))));
    }

    #[tokio::test]
    async fn sessions_get_distinct_ids() {
        let a = bootstrap_session(&CoreConfig::default(), collaborators()).unwrap();
        let b = bootstrap_session(&CoreConfig::default(), collaborators()).unwrap();
        let a_id = a.coordinator.state().session_id;
        assert_eq!(a_id.len(), 36);
        assert_ne!(a_id, b.coordinator.state().session_id);
    }

    #[tokio::test]
    async fn events_reach_subscribers() {
        let session = bootstrap_session(&CoreConfig::default(), collaborators()).unwrap();
        let mut events = session.subscribe_events();

        session.coordinator.dispatch(SessionCommand::ToggleMute).await;

        match events.recv().await.unwrap() {
            BroadcastEvent::Session(SessionEvent::MuteChanged { muted, .. }) => assert!(muted),
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[tokio::test]
    async fn shutdown_cancels_root_token() {
        let session = bootstrap_session(&CoreConfig::default(), collaborators()).unwrap();
        assert!(session.start_background_tasks());
        assert!(!session.start_background_tasks());

        session.shutdown().await;
        session.shutdown().await;

        assert!(session.cancel_token.is_cancelled());
    }
}
