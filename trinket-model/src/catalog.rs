//! Host boundary for item classification and declared stat modifiers.
//!
//! The game decides which tags an item carries and which modifiers it grants;
//! the engine only asks. [`StaticCatalog`] is an in-memory implementation for
//! tools and tests.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use trinket_types::{ItemId, ItemStack, TagKey};

/// Stat that scales the owner's maximum health.
pub const MAX_HEALTH: &str = "generic.max_health";

/// Identifier of an owner stat (attribute), e.g. `generic.armor`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatId(String);

impl StatId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn max_health() -> Self {
        Self(MAX_HEALTH.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_max_health(&self) -> bool {
        self.0 == MAX_HEALTH
    }
}

impl fmt::Display for StatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// How a modifier combines with the stat's base value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModifierOperation {
    Add,
    MultiplyBase,
    MultiplyTotal,
}

/// A stat modifier declared by an item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModifierSpec {
    pub stat: StatId,
    pub amount: f64,
    pub operation: ModifierOperation,
}

impl ModifierSpec {
    /// Shorthand for a flat additive modifier.
    pub fn add(stat: impl Into<String>, amount: f64) -> Self {
        Self {
            stat: StatId::new(stat),
            amount,
            operation: ModifierOperation::Add,
        }
    }
}

/// What the engine needs to know about items from the host.
pub trait ItemCatalog: Send + Sync {
    /// Returns true if `item` is a member of `tag`.
    fn has_tag(&self, item: &ItemId, tag: &TagKey) -> bool;

    /// Modifiers granted while `stack` is equipped.
    fn modifiers_for(&self, stack: &ItemStack) -> Vec<ModifierSpec> {
        let _ = stack;
        Vec::new()
    }
}

/// In-memory catalog built from explicit tag memberships and modifier lists.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StaticCatalog {
    #[serde(default)]
    tags: HashMap<TagKey, HashSet<ItemId>>,
    #[serde(default)]
    modifiers: HashMap<ItemId, Vec<ModifierSpec>>,
}

impl StaticCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `items` to `tag`.
    pub fn with_tag(mut self, tag: TagKey, items: impl IntoIterator<Item = ItemId>) -> Self {
        self.tags.entry(tag).or_default().extend(items);
        self
    }

    /// Declares the modifiers granted by `item`.
    pub fn with_modifiers(mut self, item: ItemId, modifiers: Vec<ModifierSpec>) -> Self {
        self.modifiers.insert(item, modifiers);
        self
    }
}

impl ItemCatalog for StaticCatalog {
    fn has_tag(&self, item: &ItemId, tag: &TagKey) -> bool {
        self.tags.get(tag).is_some_and(|items| items.contains(item))
    }

    fn modifiers_for(&self, stack: &ItemStack) -> Vec<ModifierSpec> {
        stack
            .item()
            .and_then(|item| self.modifiers.get(item))
            .cloned()
            .unwrap_or_default()
    }
}
