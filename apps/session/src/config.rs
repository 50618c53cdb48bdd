//! Driver configuration.
//!
//! Supports loading from YAML files with environment variable overrides.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use vireo_core::protocol_constants::{DEFAULT_SEARCHING_GRACE_MS, EVENT_CHANNEL_CAPACITY};
use vireo_core::{Container, CoreConfig, DeviceHandle, Item};

/// Driver configuration loaded from YAML with environment overrides.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Delay before the picker shows its searching indicator (milliseconds).
    /// Override: `VIREO_SEARCHING_GRACE_MS`
    pub searching_grace_ms: u64,

    /// Capacity of the session event channel.
    pub event_channel_capacity: usize,

    /// Containers seeded into the in-memory catalog.
    pub containers: Vec<Container>,

    /// Items seeded into the in-memory catalog.
    pub items: Vec<Item>,

    /// Receivers advertised while the device picker is open.
    pub devices: Vec<DeviceHandle>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            searching_grace_ms: DEFAULT_SEARCHING_GRACE_MS,
            event_channel_capacity: EVENT_CHANNEL_CAPACITY,
            containers: Vec::new(),
            items: Vec::new(),
            devices: Vec::new(),
        }
    }
}

impl SessionConfig {
    /// Loads configuration from a YAML file, then applies environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = if let Some(path) = path {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            serde_yaml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?
        } else {
            Self::default()
        };

        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Applies variable overrides, usually from the process environment.
    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(grace) = var("VIREO_SEARCHING_GRACE_MS").and_then(|v| v.parse().ok()) {
            self.searching_grace_ms = grace;
        }
    }

    /// Converts to vireo-core's config type.
    pub fn to_core_config(&self) -> CoreConfig {
        CoreConfig {
            searching_grace_ms: self.searching_grace_ms,
            event_channel_capacity: self.event_channel_capacity,
        }
    }

    /// Looks up a configured device by id.
    pub fn device(&self, id: &str) -> Option<&DeviceHandle> {
        self.devices.iter().find(|device| device.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_match_core_defaults() {
        let config = SessionConfig::default();
        assert_eq!(config.searching_grace_ms, 800);
        assert!(config.items.is_empty());
    }

    #[test]
    fn loads_catalog_and_devices_from_yaml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
searching_grace_ms: 250
containers:
  - id: news
    title: News
items:
  - id: a
    url: http://streams.local/a.m3u8
    title: Channel A
    containerRef: news
devices:
  - id: tv
    name: Living Room
    address: 192.168.1.20
"#
        )
        .unwrap();

        let config = SessionConfig::load(Some(file.path())).unwrap();

        assert_eq!(config.items.len(), 1);
        assert!(!config.items[0].favourite);
        assert_eq!(config.containers[0].id, "news");
        assert_eq!(config.device("tv").unwrap().name, "Living Room");
        assert_eq!(config.event_channel_capacity, 100);
    }

    #[test]
    fn rejects_malformed_yaml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "items: [not, a, list, of, items").unwrap();
        assert!(SessionConfig::load(Some(file.path())).is_err());
    }

    #[test]
    fn grace_override_replaces_file_value() {
        let mut config = SessionConfig {
            searching_grace_ms: 250,
            ..SessionConfig::default()
        };
        config.apply_overrides(|key| (key == "VIREO_SEARCHING_GRACE_MS").then(|| "40".into()));
        assert_eq!(config.searching_grace_ms, 40);

        config.apply_overrides(|_| Some("soon".into()));
        assert_eq!(config.searching_grace_ms, 40);
    }

    #[test]
    fn converts_to_core_config() {
        let config = SessionConfig {
            searching_grace_ms: 5,
            ..SessionConfig::default()
        };
        let core = config.to_core_config();
        assert_eq!(core.searching_grace_ms, 5);
        assert!(core.validate().is_ok());
    }
}
