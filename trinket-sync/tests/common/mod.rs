//! Shared fakes for sync tests.

#![allow(dead_code)]

use std::sync::Arc;
use trinket_capability::{
    AppliedModifier, EquipContext, EquipmentCapability, HostResult, Owner, WarnLimiter,
};
use trinket_model::{GroupRegistry, ModifierSpec, StatId, StaticCatalog};
use trinket_sync::transport::mock::MockTransport;
use trinket_sync::{SyncConfig, SyncEngine};
use trinket_types::{ItemId, ItemStack, OwnerId};

pub const ARMOR: &str = "generic.armor";

pub fn ruby() -> ItemStack {
    ItemStack::one(ItemId::parse("mymod:ruby_earring").unwrap())
}

pub fn onyx() -> ItemStack {
    ItemStack::one(ItemId::parse("mymod:onyx_stone").unwrap())
}

pub struct Fixture {
    pub registry: GroupRegistry,
    pub catalog: StaticCatalog,
    pub limiter: WarnLimiter,
}

impl Fixture {
    pub fn new() -> Self {
        Self {
            registry: GroupRegistry::new(),
            catalog: StaticCatalog::new().with_modifiers(
                ItemId::parse("mymod:ruby_earring").unwrap(),
                vec![ModifierSpec::add(ARMOR, 2.0)],
            ),
            limiter: WarnLimiter::default(),
        }
    }

    pub fn ctx(&self) -> EquipContext<'_> {
        EquipContext::new(&self.registry, &self.catalog, &self.limiter)
    }

    /// Initialized capability for `owner`, clean and with nothing stale.
    pub fn capability(&self, owner: &mut TestOwner) -> EquipmentCapability {
        let mut capability = EquipmentCapability::default();
        capability.set_owner(owner.id);
        capability.initialize_groups_if_missing(&self.registry);
        capability.state_mut().take_stale();
        capability
    }

    pub fn equip(
        &self,
        capability: &mut EquipmentCapability,
        owner: &mut TestOwner,
        key: &str,
        item: ItemStack,
    ) {
        assert!(capability
            .set_item(&self.ctx(), owner, key, 0, item)
            .is_equipped());
    }
}

pub fn engine() -> (SyncEngine, Arc<MockTransport>) {
    let transport = Arc::new(MockTransport::new());
    let engine = SyncEngine::new(transport.clone(), SyncConfig::default());
    (engine, transport)
}

/// Owner carrying only an armor stat.
#[derive(Debug)]
pub struct TestOwner {
    pub id: OwnerId,
    pub modifiers: Vec<AppliedModifier>,
    pub inventory: Vec<ItemStack>,
}

impl TestOwner {
    pub fn new() -> Self {
        Self::with_id(OwnerId::new())
    }

    pub fn with_id(id: OwnerId) -> Self {
        Self {
            id,
            modifiers: Vec::new(),
            inventory: Vec::new(),
        }
    }

    pub fn armor(&self) -> f64 {
        self.modifiers
            .iter()
            .filter(|m| m.stat.as_str() == ARMOR)
            .map(|m| m.amount)
            .sum()
    }
}

impl Owner for TestOwner {
    fn id(&self) -> OwnerId {
        self.id
    }

    fn has_stat(&self, stat: &StatId) -> bool {
        stat.as_str() == ARMOR
    }

    fn add_modifier(&mut self, modifier: AppliedModifier) -> HostResult<()> {
        self.modifiers.push(modifier);
        Ok(())
    }

    fn remove_modifiers(&mut self, namespace: &str) {
        self.modifiers.retain(|m| m.namespace() != namespace);
    }

    fn health(&self) -> f32 {
        20.0
    }

    fn max_health(&self) -> f32 {
        20.0
    }

    fn set_health(&mut self, _health: f32) {}

    fn give_item(&mut self, stack: ItemStack) {
        self.inventory.push(stack);
    }
}
