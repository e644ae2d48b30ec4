//! Shared helpers for storage tests.

#![allow(dead_code)]

use std::fs::File;
use std::path::Path;
use std::time::{Duration, SystemTime};
use trinket_capability::{AppliedModifier, HostResult, Owner};
use trinket_model::StatId;
use trinket_storage::{DurableStore, StoreConfig};
use trinket_types::{CapabilityRecord, ItemId, ItemStack, OwnerId};

pub fn config(root: &Path) -> StoreConfig {
    StoreConfig::new(root, "equipment")
}

pub fn store(root: &Path) -> DurableStore {
    DurableStore::new(config(root))
}

pub fn stack(id: &str) -> ItemStack {
    ItemStack::one(ItemId::parse(id).unwrap())
}

/// A distinct, non-trivial record for each `n`.
pub fn record(n: u32) -> CapabilityRecord {
    CapabilityRecord::new()
        .with_group("earrings", vec![ItemStack::new(ItemId::parse("mymod:ruby_earring").unwrap(), n + 1)])
        .with_group("soulstones", vec![ItemStack::empty()])
}

/// Pushes a file's modification time `days` into the past.
pub fn age(path: &Path, days: u64) {
    let when = SystemTime::now() - Duration::from_secs(days * 24 * 60 * 60);
    File::options()
        .write(true)
        .open(path)
        .unwrap()
        .set_modified(when)
        .unwrap();
}

/// Owner with no stats; enough to drive `set_item`.
pub struct NullOwner(pub OwnerId);

impl Owner for NullOwner {
    fn id(&self) -> OwnerId {
        self.0
    }

    fn has_stat(&self, _stat: &StatId) -> bool {
        false
    }

    fn add_modifier(&mut self, _modifier: AppliedModifier) -> HostResult<()> {
        Ok(())
    }

    fn remove_modifiers(&mut self, _namespace: &str) {}

    fn health(&self) -> f32 {
        20.0
    }

    fn max_health(&self) -> f32 {
        20.0
    }

    fn set_health(&mut self, _health: f32) {}

    fn give_item(&mut self, _stack: ItemStack) {}
}
