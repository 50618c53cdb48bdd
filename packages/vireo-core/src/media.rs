//! Media engine contract and a watch-channel backed engine.
//!
//! The decoding engine is opaque to the session: it exposes independent
//! streams for the player handle, playback status, video geometry and the
//! last error, plus `install`/`uninstall` of a media URI.

use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use futures::stream::BoxStream;
use futures::StreamExt;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

use crate::model::{PlaybackStatus, PlayerError, VideoGeometry};
use crate::protocol_constants::FULL_VOLUME;
use crate::utils::clamp_volume;

/// A live player instance owned by the media engine.
pub trait PlayerHandle: fmt::Debug + Send + Sync {
    /// Current volume in `0.0..=1.0`.
    fn volume(&self) -> f32;

    /// Sets the volume; values outside `0.0..=1.0` are clamped.
    fn set_volume(&self, volume: f32);
}

/// Shared reference to the current player.
pub type SharedPlayer = Arc<dyn PlayerHandle>;

/// Signals and controls exposed by the media engine.
///
/// Every stream emits its current value on subscription and then each change.
pub trait MediaEngine: Send + Sync {
    /// Stream of the current player handle (`None` while nothing is installed).
    fn player_handles(&self) -> BoxStream<'static, Option<SharedPlayer>>;

    /// Stream of playback status changes.
    fn playback_status(&self) -> BoxStream<'static, PlaybackStatus>;

    /// Stream of decoded frame geometry.
    fn video_geometry(&self) -> BoxStream<'static, Option<VideoGeometry>>;

    /// Stream of the last playback error.
    fn errors(&self) -> BoxStream<'static, Option<PlayerError>>;

    /// Installs a media URI, creating a player.
    fn install(&self, uri: &str);

    /// Releases the installed media and its player.
    fn uninstall(&self);
}

// ─────────────────────────────────────────────────────────────────────────────
// Software player
// ─────────────────────────────────────────────────────────────────────────────

/// Player handle that only tracks its URI and volume.
pub struct SoftwarePlayer {
    uri: String,
    /// f32 bit pattern
    volume: AtomicU32,
}

impl SoftwarePlayer {
    /// Creates a player at full volume.
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            volume: AtomicU32::new(FULL_VOLUME.to_bits()),
        }
    }
}

impl fmt::Debug for SoftwarePlayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SoftwarePlayer")
            .field("uri", &self.uri)
            .field("volume", &self.volume())
            .finish()
    }
}

impl PlayerHandle for SoftwarePlayer {
    fn volume(&self) -> f32 {
        f32::from_bits(self.volume.load(Ordering::SeqCst))
    }

    fn set_volume(&self, volume: f32) {
        self.volume
            .store(clamp_volume(volume).to_bits(), Ordering::SeqCst);
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Watch-backed engine
// ─────────────────────────────────────────────────────────────────────────────

/// Media engine whose signals are `tokio::sync::watch` channels.
///
/// Used by the headless driver; telemetry can be injected with the
/// `publish_*` methods to mimic a decoder.
pub struct WatchMediaEngine {
    player: watch::Sender<Option<SharedPlayer>>,
    status: watch::Sender<PlaybackStatus>,
    geometry: watch::Sender<Option<VideoGeometry>>,
    error: watch::Sender<Option<PlayerError>>,
}

impl Default for WatchMediaEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl WatchMediaEngine {
    /// Creates an engine with nothing installed.
    pub fn new() -> Self {
        Self {
            player: watch::channel(None).0,
            status: watch::channel(PlaybackStatus::Idle).0,
            geometry: watch::channel(None).0,
            error: watch::channel(None).0,
        }
    }

    /// The currently installed player, if any.
    pub fn current_player(&self) -> Option<SharedPlayer> {
        self.player.borrow().clone()
    }

    /// Publishes a player handle directly (bypassing `install`).
    pub fn publish_player(&self, player: Option<SharedPlayer>) {
        self.player.send_replace(player);
    }

    /// Publishes a playback status change.
    pub fn publish_status(&self, status: PlaybackStatus) {
        self.status.send_replace(status);
    }

    /// Publishes a frame geometry change.
    pub fn publish_geometry(&self, geometry: Option<VideoGeometry>) {
        self.geometry.send_replace(geometry);
    }

    /// Publishes a playback error (or clears it).
    pub fn publish_error(&self, error: Option<PlayerError>) {
        self.error.send_replace(error);
    }
}

impl MediaEngine for WatchMediaEngine {
    fn player_handles(&self) -> BoxStream<'static, Option<SharedPlayer>> {
        WatchStream::new(self.player.subscribe()).boxed()
    }

    fn playback_status(&self) -> BoxStream<'static, PlaybackStatus> {
        WatchStream::new(self.status.subscribe()).boxed()
    }

    fn video_geometry(&self) -> BoxStream<'static, Option<VideoGeometry>> {
        WatchStream::new(self.geometry.subscribe()).boxed()
    }

    fn errors(&self) -> BoxStream<'static, Option<PlayerError>> {
        WatchStream::new(self.error.subscribe()).boxed()
    }

    fn install(&self, uri: &str) {
        log::info!("[Media] Installing {}", uri);
        self.error.send_replace(None);
        self.player
            .send_replace(Some(Arc::new(SoftwarePlayer::new(uri)) as SharedPlayer));
        self.status.send_replace(PlaybackStatus::Buffering);
    }

    fn uninstall(&self) {
        log::info!("[Media] Uninstalling media");
        self.player.send_replace(None);
        self.status.send_replace(PlaybackStatus::Idle);
        self.geometry.send_replace(None);
    }
}
