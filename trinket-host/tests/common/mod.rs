//! Shared fakes for session tests.

#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;
use trinket_capability::{AppliedModifier, HostResult, Owner};
use trinket_host::{HostConfig, Sessions};
use trinket_model::{ModifierSpec, StatId, StaticCatalog};
use trinket_sync::transport::mock::MockTransport;
use trinket_types::{ItemId, ItemStack, OwnerId};

pub const ARMOR: &str = "generic.armor";

pub fn ruby() -> ItemStack {
    ItemStack::one(ItemId::parse("mymod:ruby_earring").unwrap())
}

pub fn catalog() -> StaticCatalog {
    StaticCatalog::new().with_modifiers(
        ItemId::parse("mymod:ruby_earring").unwrap(),
        vec![ModifierSpec::add(ARMOR, 2.0)],
    )
}

pub fn start(root: &Path) -> (Sessions, Arc<MockTransport>) {
    let transport = Arc::new(MockTransport::new());
    let sessions = Sessions::start(HostConfig::new(root), catalog(), transport.clone());
    (sessions, transport)
}

#[derive(Debug)]
pub struct Player {
    pub id: OwnerId,
    pub modifiers: Vec<AppliedModifier>,
    pub inventory: Vec<ItemStack>,
    pub health: f32,
}

impl Player {
    pub fn new() -> Self {
        Self::with_id(OwnerId::new())
    }

    pub fn with_id(id: OwnerId) -> Self {
        Self {
            id,
            modifiers: Vec::new(),
            inventory: Vec::new(),
            health: 20.0,
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

impl Owner for Player {
    fn id(&self) -> OwnerId {
        self.id
    }

    fn has_stat(&self, stat: &StatId) -> bool {
        stat.as_str() == ARMOR || stat.is_max_health()
    }

    fn add_modifier(&mut self, modifier: AppliedModifier) -> HostResult<()> {
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
        20.0
    }

    fn set_health(&mut self, health: f32) {
        self.health = health;
    }

    fn give_item(&mut self, stack: ItemStack) {
        self.inventory.push(stack);
    }
}
