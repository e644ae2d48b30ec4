//! Capability configuration.

use serde::{Deserialize, Serialize};

use crate::health::HealthPolicy;

/// Per-capability tuning, shared by every owner of one host.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CapabilityConfig {
    pub health_policy: HealthPolicy,
    /// Normalization window scheduled on login.
    pub login_normalization_ticks: u32,
    /// Normalization window scheduled on respawn.
    pub respawn_normalization_ticks: u32,
}

impl Default for CapabilityConfig {
    fn default() -> Self {
        Self {
            health_policy: HealthPolicy::default(),
            login_normalization_ticks: 20,
            respawn_normalization_ticks: 20,
        }
    }
}
