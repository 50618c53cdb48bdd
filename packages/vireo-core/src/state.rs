//! Session configuration and the published session state.
//!
//! [`SessionStore`] is the single point through which [`SessionState`] is
//! mutated. Readers get complete snapshots; writers apply a transformation
//! atomically under the store's lock.

use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::error::{CoreError, CoreResult};
use crate::model::SessionState;
use crate::protocol_constants::{DEFAULT_SEARCHING_GRACE_MS, EVENT_CHANNEL_CAPACITY};

/// Configuration for the session coordinator.
///
/// All fields have sensible defaults.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct CoreConfig {
    /// Delay before the device picker shows its searching indicator (milliseconds).
    pub searching_grace_ms: u64,

    /// Capacity of the event broadcast channel.
    pub event_channel_capacity: usize,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            searching_grace_ms: DEFAULT_SEARCHING_GRACE_MS,
            event_channel_capacity: EVENT_CHANNEL_CAPACITY,
        }
    }
}

impl CoreConfig {
    /// Validates the configuration values.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Configuration`] if any value would cause runtime issues.
    pub fn validate(&self) -> CoreResult<()> {
        if self.event_channel_capacity == 0 {
            return Err(CoreError::Configuration(
                "event_channel_capacity must be >= 1 (broadcast::channel panics on 0)".to_string(),
            ));
        }
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Session Store
// ─────────────────────────────────────────────────────────────────────────────

/// Single-writer store for the published [`SessionState`].
///
/// Backed by a `watch` channel: every update runs under the channel's write
/// lock, so concurrent updates are serialized and observers never see a
/// half-applied change.
#[derive(Debug)]
pub struct SessionStore {
    tx: watch::Sender<SessionState>,
}

impl SessionStore {
    pub fn new(initial: SessionState) -> Self {
        let (tx, _) = watch::channel(initial);
        Self { tx }
    }

    /// Returns a clone of the current state.
    pub fn current(&self) -> SessionState {
        self.tx.borrow().clone()
    }

    /// Reads from the current state without cloning it.
    pub fn read<R>(&self, f: impl FnOnce(&SessionState) -> R) -> R {
        f(&self.tx.borrow())
    }

    /// Subscribes to state changes.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.tx.subscribe()
    }

    /// Applies `f` to the state and notifies observers.
    pub fn update(&self, f: impl FnOnce(&mut SessionState)) {
        self.tx.send_modify(f);
    }

    /// Applies `f` and notifies observers only if it returns `true`.
    ///
    /// `f` runs under the store's lock, so a check inside it and the write it
    /// guards are atomic with respect to every other update.
    pub fn update_if(&self, f: impl FnOnce(&mut SessionState) -> bool) -> bool {
        self.tx.send_if_modified(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = CoreConfig::default();
        assert_eq!(config.searching_grace_ms, 800);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_channel_capacity_is_rejected() {
        let config = CoreConfig {
            event_channel_capacity: 0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(CoreError::Configuration(msg)) if msg.contains("event_channel_capacity")
        ));
    }

    #[test]
    fn partial_config_uses_defaults() {
        let config: CoreConfig = serde_json::from_str(r#"{"searching_grace_ms": 50}"#).unwrap();
        assert_eq!(config.searching_grace_ms, 50);
        assert_eq!(config.event_channel_capacity, EVENT_CHANNEL_CAPACITY);
    }

    #[test]
    fn update_if_false_does_not_notify() {
        let store = SessionStore::new(SessionState::new("s"));
        let mut rx = store.subscribe();

        let changed = store.update_if(|state| {
            state.recording = true;
            false
        });
        assert!(!changed);
        assert!(!rx.has_changed().unwrap());

        store.update(|state| state.searching = true);
        assert!(rx.has_changed().unwrap());
        assert!(store.current().searching);
    }
}
