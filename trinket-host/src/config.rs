use std::path::PathBuf;
use std::time::Duration;
use trinket_capability::{CapabilityConfig, DEFAULT_WARN_INTERVAL};
use trinket_storage::StoreConfig;
use trinket_sync::SyncConfig;

/// Everything a host needs to run sessions.
#[derive(Debug, Clone)]
pub struct HostConfig {
    pub store: StoreConfig,
    pub sync: SyncConfig,
    pub capability: CapabilityConfig,
    /// Minimum gap between repeats of a rate-limited warning.
    pub warn_interval: Duration,
}

impl HostConfig {
    /// Defaults with records stored under `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            store: StoreConfig {
                root: root.into(),
                ..StoreConfig::default()
            },
            ..Self::default()
        }
    }
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            store: StoreConfig::default(),
            sync: SyncConfig::default(),
            capability: CapabilityConfig::default(),
            warn_interval: DEFAULT_WARN_INTERVAL,
        }
    }
}
