use serde::{Deserialize, Serialize};

/// Sync engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Push a group's partial as soon as it changes, rather than on the
    /// next stale sweep.
    pub push_on_equip: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            push_on_equip: true,
        }
    }
}
