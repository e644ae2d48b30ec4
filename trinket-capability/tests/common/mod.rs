//! Shared fakes for capability tests.

#![allow(dead_code)]

use std::collections::HashSet;
use trinket_capability::{
    AppliedModifier, EquipContext, EquipmentCapability, HostError, HostResult, Owner, WarnLimiter,
};
use trinket_model::{
    GroupRegistry, ModifierSpec, SlotLayoutDefinition, StatId, StaticCatalog, MAX_HEALTH,
};
use trinket_types::{ItemId, ItemStack, OwnerId, TagKey};

pub const ARMOR: &str = "generic.armor";
pub const LUCK: &str = "generic.luck";

pub fn item(id: &str) -> ItemId {
    ItemId::parse(id).unwrap()
}

pub fn stack(id: &str) -> ItemStack {
    ItemStack::one(item(id))
}

pub fn ruby() -> ItemStack {
    stack("mymod:ruby_earring")
}

pub fn pearl() -> ItemStack {
    stack("mymod:pearl_earring")
}

pub fn stick() -> ItemStack {
    stack("minecraft:stick")
}

pub fn registry(layouts: &[&str]) -> GroupRegistry {
    let mut registry = GroupRegistry::new();
    registry.reload(
        layouts
            .iter()
            .map(|json| SlotLayoutDefinition::parse(json).unwrap()),
    );
    registry
}

/// Ruby grants armor, pearl grants max health, both are tagged earrings.
pub fn catalog() -> StaticCatalog {
    StaticCatalog::new()
        .with_tag(
            TagKey::parse("mymod:earrings").unwrap(),
            [item("mymod:ruby_earring"), item("mymod:pearl_earring")],
        )
        .with_modifiers(
            item("mymod:ruby_earring"),
            vec![ModifierSpec::add(ARMOR, 2.0)],
        )
        .with_modifiers(
            item("mymod:pearl_earring"),
            vec![ModifierSpec::add(MAX_HEALTH, 4.0), ModifierSpec::add(LUCK, 1.0)],
        )
}

/// Registry, catalog and limiter bundled so tests can borrow a context.
pub struct Fixture {
    pub registry: GroupRegistry,
    pub catalog: StaticCatalog,
    pub limiter: WarnLimiter,
}

impl Fixture {
    pub fn new(layouts: &[&str]) -> Self {
        Self {
            registry: registry(layouts),
            catalog: catalog(),
            limiter: WarnLimiter::default(),
        }
    }

    pub fn ctx(&self) -> EquipContext<'_> {
        EquipContext::new(&self.registry, &self.catalog, &self.limiter)
    }

    /// An initialized capability for `owner`.
    pub fn capability(&self, owner: &FakeOwner) -> EquipmentCapability {
        let mut capability = EquipmentCapability::default();
        capability.set_owner(owner.id);
        assert!(capability.initialize_groups_if_missing(&self.registry).is_empty());
        capability
    }
}

/// In-memory owner that records everything the capability does to it.
#[derive(Debug)]
pub struct FakeOwner {
    pub id: OwnerId,
    pub stats: HashSet<StatId>,
    pub modifiers: Vec<AppliedModifier>,
    pub base_max_health: f32,
    pub health: f32,
    pub inventory: Vec<ItemStack>,
    pub vitals_pushed: usize,
    pub rejected_keys: HashSet<String>,
}

impl FakeOwner {
    /// Owner with max health and armor, but no luck stat.
    pub fn new() -> Self {
        Self {
            id: OwnerId::new(),
            stats: [StatId::max_health(), StatId::new(ARMOR)].into_iter().collect(),
            modifiers: Vec::new(),
            base_max_health: 20.0,
            health: 20.0,
            inventory: Vec::new(),
            vitals_pushed: 0,
            rejected_keys: HashSet::new(),
        }
    }

    pub fn modifier_keys(&self) -> Vec<&str> {
        self.modifiers.iter().map(|m| m.key.as_str()).collect()
    }

    pub fn total(&self, stat: &str) -> f64 {
        self.modifiers
            .iter()
            .filter(|m| m.stat.as_str() == stat)
            .map(|m| m.amount)
            .sum()
    }
}

impl Owner for FakeOwner {
    fn id(&self) -> OwnerId {
        self.id
    }

    fn has_stat(&self, stat: &StatId) -> bool {
        self.stats.contains(stat)
    }

    fn add_modifier(&mut self, modifier: AppliedModifier) -> HostResult<()> {
        if self.rejected_keys.contains(&modifier.key) {
            return Err(HostError::Rejected {
                key: modifier.key,
                reason: "test rejection".into(),
            });
        }
        if self.modifiers.iter().any(|m| m.key == modifier.key) {
            return Err(HostError::DuplicateModifier(modifier.key));
        }
        self.modifiers.push(modifier);
        Ok(())
    }

    fn remove_modifiers(&mut self, namespace: &str) {
        self.modifiers.retain(|m| m.namespace() != namespace);
    }

    fn health(&self) -> f32 {
        self.health
    }

    fn max_health(&self) -> f32 {
        self.base_max_health + self.total(MAX_HEALTH) as f32
    }

    fn set_health(&mut self, health: f32) {
        self.health = health;
    }

    fn give_item(&mut self, stack: ItemStack) {
        self.inventory.push(stack);
    }

    fn push_vitals(&mut self) {
        self.vitals_pushed += 1;
    }
}
