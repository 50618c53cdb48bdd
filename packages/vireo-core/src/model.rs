//! Domain types for the playback session.
//!
//! Catalog entities ([`Item`], [`Container`]), what is to be played
//! ([`InitMode`]), the aggregated player view ([`PlayerSnapshot`]) and the
//! published [`SessionState`].

use serde::{Deserialize, Serialize};

use crate::cast::DeviceHandle;
use crate::media::SharedPlayer;

// ─────────────────────────────────────────────────────────────────────────────
// Catalog Entities
// ─────────────────────────────────────────────────────────────────────────────

/// A playable stream (a channel) as stored by the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    /// Catalog identifier.
    pub id: String,
    /// Stream URL handed to the media engine and to remote receivers.
    pub url: String,
    /// Display title.
    pub title: String,
    /// Reference to the owning container (playlist source).
    pub container_ref: String,
    /// Whether the user marked this item as a favourite.
    #[serde(default)]
    pub favourite: bool,
}

/// The container (playlist source) an item belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Container {
    /// Container reference, matching [`Item::container_ref`].
    pub id: String,
    /// Display title.
    pub title: String,
}

// ─────────────────────────────────────────────────────────────────────────────
// Initialization
// ─────────────────────────────────────────────────────────────────────────────

/// What the session is set up to play.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", rename_all = "camelCase")]
pub enum InitMode {
    /// Nothing requested yet.
    #[default]
    Uninitialized,
    /// A single stream together with its container.
    Single {
        item: Option<Item>,
        container: Option<Container>,
    },
    /// An ordered list of streams, starting at `start_index`.
    #[serde(rename_all = "camelCase")]
    Playlist { items: Vec<Item>, start_index: usize },
}

impl InitMode {
    /// Flattens the mode into the base list of a playlist.
    ///
    /// `Playlist` keeps its items, `Single` degrades to a one-element list
    /// (empty when its item is absent), `Uninitialized` is empty.
    pub fn flatten_items(&self) -> Vec<Item> {
        match self {
            Self::Uninitialized => Vec::new(),
            Self::Single { item, .. } => item.iter().cloned().collect(),
            Self::Playlist { items, .. } => items.clone(),
        }
    }

    /// Short mode name used in logs and events.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Uninitialized => "uninitialized",
            Self::Single { .. } => "single",
            Self::Playlist { .. } => "playlist",
        }
    }

    /// Number of items described by this mode.
    pub fn item_count(&self) -> usize {
        match self {
            Self::Uninitialized => 0,
            Self::Single { item, .. } => usize::from(item.is_some()),
            Self::Playlist { items, .. } => items.len(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Player Telemetry
// ─────────────────────────────────────────────────────────────────────────────

/// Playback status reported by the media engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PlaybackStatus {
    /// No media installed, or playback failed.
    #[default]
    Idle,
    /// Waiting for data.
    Buffering,
    /// Ready to render (playing when not paused).
    Ready,
    /// The stream reached its end.
    Ended,
}

/// Decoded video frame geometry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoGeometry {
    pub width: u32,
    pub height: u32,
    /// Pixel aspect ratio (1.0 for square pixels).
    pub pixel_ratio: f32,
}

/// Last playback error surfaced by the media engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerError {
    /// Engine-specific error code.
    pub code: i32,
    pub message: String,
}

/// Immutable aggregate of the media engine's independent signals.
///
/// Replaced as a whole on every change, never partially updated.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerSnapshot {
    /// The current player handle, if the engine has one installed.
    #[serde(skip)]
    pub player: Option<SharedPlayer>,
    pub playback_status: PlaybackStatus,
    pub video_geometry: Option<VideoGeometry>,
    pub last_error: Option<PlayerError>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Session State
// ─────────────────────────────────────────────────────────────────────────────

/// The published state of one playback session.
///
/// Owned by the session coordinator; observers only ever see complete values.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    pub session_id: String,
    pub init: InitMode,
    pub player_state: PlayerSnapshot,
    /// Whether the media engine currently exposes a player handle.
    pub player_attached: bool,
    pub muted: bool,
    pub connected_device: Option<DeviceHandle>,
    pub recording: bool,
    pub devices_visible: bool,
    pub searching: bool,
    /// Devices discovered while the picker is open.
    pub devices: Vec<DeviceHandle>,
}

impl SessionState {
    /// Creates the initial state for a new session.
    pub fn new(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            init: InitMode::Uninitialized,
            player_state: PlayerSnapshot::default(),
            player_attached: false,
            muted: false,
            connected_device: None,
            recording: false,
            devices_visible: false,
            searching: false,
            devices: Vec::new(),
        }
    }

    /// The item of a `Single` session, if present.
    pub fn single_item(&self) -> Option<&Item> {
        match &self.init {
            InitMode::Single { item, .. } => item.as_ref(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: &str) -> Item {
        Item {
            id: id.to_string(),
            url: format!("http://streams.local/{id}.m3u8"),
            title: format!("Channel {id}"),
            container_ref: "c1".to_string(),
            favourite: false,
        }
    }

    #[test]
    fn flatten_single_with_item() {
        let mode = InitMode::Single {
            item: Some(item("a")),
            container: None,
        };
        assert_eq!(mode.flatten_items(), vec![item("a")]);
    }

    #[test]
    fn flatten_single_without_item_is_empty() {
        let mode = InitMode::Single {
            item: None,
            container: None,
        };
        assert!(mode.flatten_items().is_empty());
        assert!(InitMode::Uninitialized.flatten_items().is_empty());
    }

    #[test]
    fn flatten_playlist_keeps_order() {
        let mode = InitMode::Playlist {
            items: vec![item("a"), item("b")],
            start_index: 1,
        };
        let ids: Vec<_> = mode.flatten_items().into_iter().map(|i| i.id).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(mode.item_count(), 2);
    }

    #[test]
    fn init_mode_serializes_with_mode_tag() {
        let mode = InitMode::Playlist {
            items: vec![],
            start_index: 3,
        };
        let json = serde_json::to_value(&mode).unwrap();
        assert_eq!(json["mode"], "playlist");
        assert_eq!(json["startIndex"], 3);
    }
}
