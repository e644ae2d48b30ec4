//! Dynamic registry of equipment groups.
//!
//! Groups are registry-issued handles rather than a closed enum because the
//! set is data-driven and changes on every layout reload. Iteration order is
//! registration order, which is also the UI order.

use indexmap::IndexMap;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;
use trinket_types::{ItemStack, TagKey};
use uuid::Uuid;

use crate::catalog::ItemCatalog;
use crate::error::LayoutResult;
use crate::layout::{normalize_group_key, SlotLayoutDefinition};

/// Groups every registry starts with: `(key, classification tag)`.
pub const BASE_GROUPS: &[(&str, &str)] = &[
    ("earrings", "trinket:earrings"),
    ("soulstones", "trinket:soulstones"),
];

const GROUP_NAMESPACE: Uuid = Uuid::from_u128(0x6f1c_2a7e_93d4_4b0a_8e55_1c3f_d2a9_7b10);

/// Stable identifier derived from a group key.
///
/// The same key always yields the same id, across reloads and restarts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupId(Uuid);

impl GroupId {
    fn for_key(key: &str) -> Self {
        Self(Uuid::new_v5(&GROUP_NAMESPACE, key.as_bytes()))
    }

    pub const fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A named category of equipment slots.
#[derive(Debug, PartialEq, Eq)]
pub struct EquipmentGroup {
    key: String,
    classification: Option<TagKey>,
    id: GroupId,
}

impl EquipmentGroup {
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn classification(&self) -> Option<&TagKey> {
        self.classification.as_ref()
    }

    pub fn id(&self) -> GroupId {
        self.id
    }
}

/// Insertion-ordered registry of groups and their current layouts.
#[derive(Debug)]
pub struct GroupRegistry {
    groups: IndexMap<String, Arc<EquipmentGroup>>,
    layouts: HashMap<String, Arc<SlotLayoutDefinition>>,
    generation: u64,
}

impl GroupRegistry {
    /// Creates a registry holding the built-in groups.
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry.register_base();
        registry
    }

    /// Creates a registry with no groups at all.
    pub fn empty() -> Self {
        Self {
            groups: IndexMap::new(),
            layouts: HashMap::new(),
            generation: 0,
        }
    }

    fn register_base(&mut self) {
        for (key, tag) in BASE_GROUPS {
            let classification = TagKey::parse(tag).ok();
            // Base keys are static and valid.
            let _ = self.register(key, classification);
        }
    }

    /// Registers a group. Idempotent: an existing key returns the existing
    /// instance unchanged.
    pub fn register(
        &mut self,
        key: &str,
        classification: Option<TagKey>,
    ) -> LayoutResult<Arc<EquipmentGroup>> {
        let key = normalize_group_key(key)?;
        if let Some(existing) = self.groups.get(&key) {
            return Ok(Arc::clone(existing));
        }
        let group = Arc::new(EquipmentGroup {
            id: GroupId::for_key(&key),
            key: key.clone(),
            classification,
        });
        debug!("Registered equipment group `{}` ({})", key, group.id);
        self.groups.insert(key, Arc::clone(&group));
        Ok(group)
    }

    /// Registers a group together with its layout. A later definition for
    /// the same key replaces the stored layout.
    pub fn register_layout(
        &mut self,
        definition: SlotLayoutDefinition,
    ) -> LayoutResult<Arc<EquipmentGroup>> {
        let group = self.register(&definition.key, definition.classification.clone())?;
        self.layouts
            .insert(group.key().to_string(), Arc::new(definition));
        Ok(group)
    }

    /// Clears every group and layout and re-adds the built-in set.
    pub fn reset_and_reregister_base(&mut self) {
        self.groups.clear();
        self.layouts.clear();
        self.generation += 1;
        self.register_base();
    }

    /// Rebuilds the registry from a fresh set of layout definitions.
    pub fn reload(&mut self, definitions: impl IntoIterator<Item = SlotLayoutDefinition>) {
        self.reset_and_reregister_base();
        for definition in definitions {
            // Definitions reaching here were already validated by the parser.
            let _ = self.register_layout(definition);
        }
        debug!(
            "Registry reloaded: {} group(s), generation {}",
            self.groups.len(),
            self.generation
        );
    }

    /// All groups in registration order.
    pub fn all(&self) -> impl Iterator<Item = &Arc<EquipmentGroup>> {
        self.groups.values()
    }

    /// All keys in registration order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.groups.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Looks up a group by key (case-insensitive). Unknown keys yield `None`.
    pub fn from_key(&self, key: &str) -> Option<&Arc<EquipmentGroup>> {
        match self.groups.get(key) {
            Some(group) => Some(group),
            None => self.groups.get(&key.trim().to_lowercase()),
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.from_key(key).is_some()
    }

    /// First group (in registration order) whose classification tag the
    /// stack's item carries.
    pub fn from_classification(
        &self,
        stack: &ItemStack,
        catalog: &dyn ItemCatalog,
    ) -> Option<&Arc<EquipmentGroup>> {
        let item = stack.item()?;
        self.groups.values().find(|group| {
            group
                .classification()
                .is_some_and(|tag| catalog.has_tag(item, tag))
        })
    }

    /// Layout for `key`; groups without a definition get a single slot.
    pub fn layout(&self, key: &str) -> Arc<SlotLayoutDefinition> {
        match self.layouts.get(key) {
            Some(layout) => Arc::clone(layout),
            None => Arc::new(SlotLayoutDefinition::single_slot(key)),
        }
    }

    pub fn slot_count(&self, key: &str) -> usize {
        self.layouts
            .get(key)
            .map(|layout| layout.slot_count())
            .unwrap_or(1)
    }

    /// Keys of groups whose `requires` list references `key`.
    pub fn dependents_of(&self, key: &str) -> Vec<String> {
        self.groups
            .keys()
            .filter(|other| {
                self.layouts
                    .get(*other)
                    .is_some_and(|layout| layout.requires.iter().any(|r| r == key))
            })
            .cloned()
            .collect()
    }

    /// True if some group lists `key` in its `linked_with`.
    pub fn is_mirror(&self, key: &str) -> bool {
        self.layouts
            .values()
            .any(|layout| layout.linked_with.iter().any(|l| l == key))
    }

    /// Incremented by every reset; capabilities compare it to detect reloads.
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

impl Default for GroupRegistry {
    fn default() -> Self {
        Self::new()
    }
}
