use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Configuration for a record store and its worker.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Root directory shared by every capability kind.
    pub root: PathBuf,
    /// Capability kind; records live under `<root>/<kind>/`.
    pub kind: String,
    /// Number of rotating backups kept per owner.
    pub backup_retention: usize,
    /// Backups older than this are pruned, except the newest remaining one.
    pub backup_max_age: Duration,
    /// Bounded capacity of the worker queue.
    pub queue_capacity: usize,
    /// How long shutdown waits for queued work before aborting the worker.
    pub shutdown_timeout: Duration,
}

impl StoreConfig {
    pub fn new(root: impl Into<PathBuf>, kind: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            kind: kind.into(),
            ..Self::default()
        }
    }

    /// Directory holding this kind's record files.
    pub fn kind_dir(&self) -> PathBuf {
        self.root.join(&self.kind)
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("trinket-data"),
            kind: "equipment".to_string(),
            backup_retention: 5,
            backup_max_age: Duration::from_secs(30 * 24 * 60 * 60),
            queue_capacity: 256,
            shutdown_timeout: Duration::from_secs(10),
        }
    }
}
