//! Identity-keyed cache of live capabilities.
//!
//! Created once per host and passed to whoever needs it. Guarantees a
//! single capability instance per owner, even when several event sources
//! race on first access.

use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;
use trinket_types::OwnerId;

use crate::capability::EquipmentCapability;
use crate::config::CapabilityConfig;

/// A capability shared between the cache and the code mutating it.
pub type SharedCapability = Arc<Mutex<EquipmentCapability>>;

#[derive(Debug, Default)]
pub struct CapabilityCache {
    entries: RwLock<HashMap<OwnerId, SharedCapability>>,
    config: CapabilityConfig,
}

impl CapabilityCache {
    pub fn new(config: CapabilityConfig) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            config,
        }
    }

    /// Returns the capability for `owner`, creating it if absent.
    ///
    /// Creation happens under the write lock, so concurrent callers always
    /// receive the same instance.
    pub fn get_or_create(&self, owner: OwnerId) -> SharedCapability {
        if let Some(existing) = self.entries.read().get(&owner) {
            return Arc::clone(existing);
        }
        let mut entries = self.entries.write();
        let entry = entries.entry(owner).or_insert_with(|| {
            debug!("Creating capability for {}", owner);
            let mut capability = EquipmentCapability::new(self.config.clone());
            capability.set_owner(owner);
            Arc::new(Mutex::new(capability))
        });
        Arc::clone(entry)
    }

    pub fn get(&self, owner: OwnerId) -> Option<SharedCapability> {
        self.entries.read().get(&owner).cloned()
    }

    pub fn contains(&self, owner: OwnerId) -> bool {
        self.entries.read().contains_key(&owner)
    }

    /// Removes `owner` from the cache. The caller should have saved first.
    pub fn evict(&self, owner: OwnerId) -> Option<SharedCapability> {
        let evicted = self.entries.write().remove(&owner);
        if evicted.is_some() {
            debug!("Evicted capability for {}", owner);
        }
        evicted
    }

    /// Owners currently cached, in no particular order.
    pub fn owners(&self) -> Vec<OwnerId> {
        self.entries.read().keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}
