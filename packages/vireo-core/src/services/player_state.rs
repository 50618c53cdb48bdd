//! Player state aggregation.
//!
//! The media engine reports playback status, frame geometry and errors on
//! independent streams. The aggregator keeps the latest value of each and
//! republishes one combined [`PlayerSnapshot`] whenever any of them changes.
//! The player handle stream is followed separately: it attaches the handle
//! to the snapshot and re-derives the session's mute flag from its volume.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures::stream::{self, BoxStream};
use futures::StreamExt;
use tokio_util::sync::CancellationToken;

use crate::media::{MediaEngine, SharedPlayer};
use crate::model::{PlaybackStatus, PlayerError, PlayerSnapshot, VideoGeometry};
use crate::runtime::{TaskSpawner, TokioSpawner};
use crate::state::SessionStore;
use crate::utils::is_muted_volume;

/// One update from any of the combined inputs.
#[derive(Debug, Clone, PartialEq)]
enum PlayerInput {
    Status(PlaybackStatus),
    Geometry(Option<VideoGeometry>),
    Error(Option<PlayerError>),
}

/// Latest value seen on each combined input.
///
/// Nothing is combined until every input has reported at least once.
#[derive(Debug, Default)]
struct LatestInputs {
    status: Option<PlaybackStatus>,
    geometry: Option<Option<VideoGeometry>>,
    error: Option<Option<PlayerError>>,
}

impl LatestInputs {
    fn apply(&mut self, input: PlayerInput) {
        match input {
            PlayerInput::Status(status) => self.status = Some(status),
            PlayerInput::Geometry(geometry) => self.geometry = Some(geometry),
            PlayerInput::Error(error) => self.error = Some(error),
        }
    }

    fn combined(&self) -> Option<(PlaybackStatus, Option<VideoGeometry>, Option<PlayerError>)> {
        Some((self.status?, self.geometry.clone()?, self.error.clone()?))
    }
}

/// Background aggregator of media engine telemetry into the session state.
pub struct PlayerStateAggregator {
    media: Arc<dyn MediaEngine>,
    store: Arc<SessionStore>,
    spawner: TokioSpawner,
    started: AtomicBool,
}

impl PlayerStateAggregator {
    pub fn new(
        media: Arc<dyn MediaEngine>,
        store: Arc<SessionStore>,
        spawner: TokioSpawner,
    ) -> Self {
        Self {
            media,
            store,
            spawner,
            started: AtomicBool::new(false),
        }
    }

    /// Starts the combiner and the handle watcher under `token`.
    ///
    /// Runs at most once per aggregator; returns `false` if already started.
    pub fn start(&self, token: CancellationToken) -> bool {
        if self.started.swap(true, Ordering::SeqCst) {
            log::warn!("[Player] Aggregator already started");
            return false;
        }

        let inputs: BoxStream<'static, PlayerInput> = stream::select_all([
            self.media.playback_status().map(PlayerInput::Status).boxed(),
            self.media.video_geometry().map(PlayerInput::Geometry).boxed(),
            self.media.errors().map(PlayerInput::Error).boxed(),
        ])
        .boxed();
        let store = Arc::clone(&self.store);
        self.spawner
            .spawn_cancellable(token.clone(), combine_player_inputs(inputs, store));

        let handles = self.media.player_handles();
        let store = Arc::clone(&self.store);
        self.spawner
            .spawn_cancellable(token, watch_player_handles(handles, store));

        log::debug!("[Player] Aggregator started");
        true
    }
}

async fn combine_player_inputs(
    mut inputs: BoxStream<'static, PlayerInput>,
    store: Arc<SessionStore>,
) {
    let mut latest = LatestInputs::default();
    while let Some(input) = inputs.next().await {
        latest.apply(input);
        let Some((playback_status, video_geometry, last_error)) = latest.combined() else {
            continue;
        };
        if let Some(ref error) = last_error {
            log::debug!("[Player] Last error: {} ({})", error.message, error.code);
        }
        store.update(|state| {
            state.player_state = PlayerSnapshot {
                player: state.player_state.player.take(),
                playback_status,
                video_geometry,
                last_error,
            };
        });
    }
    log::debug!("[Player] Media engine telemetry ended");
}

async fn watch_player_handles(
    mut handles: BoxStream<'static, Option<SharedPlayer>>,
    store: Arc<SessionStore>,
) {
    while let Some(handle) = handles.next().await {
        store.update(|state| {
            match &handle {
                Some(player) => {
                    state.muted = is_muted_volume(player.volume());
                    state.player_attached = true;
                }
                // Keep the previous mute flag while no player exists.
                None => state.player_attached = false,
            }
            state.player_state.player = handle;
        });
    }
}
