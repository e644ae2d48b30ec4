//! Per-owner equipment state for Trinket.
//!
//! An [`EquipmentCapability`] holds one owner's equipped items, grouped by
//! the categories in a [`GroupRegistry`](trinket_model::GroupRegistry). It
//! enforces the equip rules, keeps derived stat modifiers and health in line
//! with what is worn, and tracks what still needs saving (dirty) and pushing
//! (stale).
//!
//! The host game is reached only through the [`Owner`] trait and the
//! [`ItemCatalog`](trinket_model::ItemCatalog) trait, so the whole state
//! machine runs against in-memory fakes in tests.

mod cache;
mod capability;
mod config;
mod error;
mod health;
mod host;
mod limiter;
mod state;

pub use cache::{CapabilityCache, SharedCapability};
pub use capability::{ClonePolicy, EquipContext, EquipOutcome, EquipmentCapability, Phase};
pub use config::CapabilityConfig;
pub use error::{HostError, HostResult};
pub use health::HealthPolicy;
pub use host::{AppliedModifier, Owner, MODIFIER_NAMESPACE};
pub use limiter::{WarnLimiter, DEFAULT_WARN_INTERVAL};
pub use state::CapabilityState;
