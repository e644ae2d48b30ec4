use serde::{Deserialize, Serialize};

use crate::ItemId;

/// Zero or one stack of an item together with its persisted extra data.
///
/// Treated as an atomic, copyable value. Two stacks are equal when they hold
/// the same item type with the same extra data; the count is ignored (use
/// [`ItemStack::matches_exactly`] when it matters). All empty stacks are
/// equal to each other.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ItemStack {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    item: Option<ItemId>,
    #[serde(default)]
    count: u32,
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    data: serde_json::Value,
}

impl ItemStack {
    /// The empty stack.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            item: None,
            count: 0,
            data: serde_json::Value::Null,
        }
    }

    /// Creates a stack of `count` items. A zero count yields the empty stack.
    #[must_use]
    pub fn new(item: ItemId, count: u32) -> Self {
        if count == 0 {
            return Self::empty();
        }
        Self {
            item: Some(item),
            count,
            data: serde_json::Value::Null,
        }
    }

    /// Shorthand for a single item.
    #[must_use]
    pub fn one(item: ItemId) -> Self {
        Self::new(item, 1)
    }

    /// Attaches extra data (enchantments, custom names, ...).
    #[must_use]
    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        if !self.is_empty() {
            self.data = data;
        }
        self
    }

    /// Returns true for the empty stack.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.item.is_none() || self.count == 0
    }

    /// Returns the item type, or `None` for the empty stack.
    #[must_use]
    pub fn item(&self) -> Option<&ItemId> {
        if self.is_empty() { None } else { self.item.as_ref() }
    }

    /// Returns the stack size (0 for the empty stack).
    #[must_use]
    pub fn count(&self) -> u32 {
        if self.is_empty() { 0 } else { self.count }
    }

    /// Returns the extra data attached to the stack.
    #[must_use]
    pub fn data(&self) -> &serde_json::Value {
        &self.data
    }

    /// Takes the stack out, leaving the empty stack in its place.
    pub fn take(&mut self) -> Self {
        std::mem::take(self)
    }

    /// Equality including the stack size.
    #[must_use]
    pub fn matches_exactly(&self, other: &Self) -> bool {
        self == other && self.count() == other.count()
    }
}

impl PartialEq for ItemStack {
    fn eq(&self, other: &Self) -> bool {
        match (self.is_empty(), other.is_empty()) {
            (true, true) => true,
            (false, false) => self.item == other.item && self.data == other.data,
            _ => false,
        }
    }
}

impl Eq for ItemStack {}

impl std::fmt::Display for ItemStack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.item() {
            Some(item) if self.count > 1 => write!(f, "{}x {}", self.count, item),
            Some(item) => write!(f, "{item}"),
            None => f.write_str("(empty)"),
        }
    }
}
