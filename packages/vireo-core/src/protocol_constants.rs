//! Fixed session constants.
//!
//! Tunable values live in [`CoreConfig`](crate::state::CoreConfig); these are
//! the defaults and the values the media engine contract pins down.

// ─────────────────────────────────────────────────────────────────────────────
// Volume
// ─────────────────────────────────────────────────────────────────────────────

/// Player volume applied when muting.
pub const MUTED_VOLUME: f32 = 0.0;

/// Player volume applied when unmuting.
///
/// The media engine volume range is `0.0..=1.0`; unmuting always restores full volume.
pub const FULL_VOLUME: f32 = 1.0;

// ─────────────────────────────────────────────────────────────────────────────
// Device Picker
// ─────────────────────────────────────────────────────────────────────────────

/// Delay before the picker shows its "searching" indicator (milliseconds).
///
/// Discovery that completes within this window never flashes a spinner.
pub const DEFAULT_SEARCHING_GRACE_MS: u64 = 800;

// ─────────────────────────────────────────────────────────────────────────────
// Events
// ─────────────────────────────────────────────────────────────────────────────

/// Default capacity of the event broadcast channel.
pub const EVENT_CHANNEL_CAPACITY: usize = 100;
