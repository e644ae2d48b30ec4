//! Health normalization policies.

use serde::{Deserialize, Serialize};

/// Tolerance when comparing health values.
pub(crate) const HEALTH_EPSILON: f32 = 0.001;

/// How a pending normalization moves health toward max each tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum HealthPolicy {
    /// Jump straight to max.
    Snap,
    /// Add `step` per tick until max is reached.
    Ease { step: f32 },
}

impl HealthPolicy {
    /// Health after one normalization tick. Never exceeds `max`, never lowers
    /// health that is already within bounds.
    pub fn step(&self, health: f32, max: f32) -> f32 {
        if health >= max {
            return max;
        }
        match self {
            Self::Snap => max,
            Self::Ease { step } => (health + step.max(0.0)).min(max),
        }
    }
}

impl Default for HealthPolicy {
    fn default() -> Self {
        Self::Ease { step: 0.25 }
    }
}
