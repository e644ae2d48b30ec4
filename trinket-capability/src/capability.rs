//! Per-owner equipment state machine.
//!
//! A capability starts `Uninitialized` and becomes `Active` on the first
//! [`initialize_groups_if_missing`](EquipmentCapability::initialize_groups_if_missing).
//! Every successful mutation bumps the revision (dirty until the persistence
//! layer acknowledges it) and marks the touched groups stale (until the sync
//! engine pushes them).

use indexmap::IndexMap;
use std::collections::HashSet;
use tracing::{debug, warn};
use trinket_model::validator::{can_equip_group, can_equip_item};
use trinket_model::{DenyReason, GroupRegistry, ItemCatalog};
use trinket_types::{CapabilityRecord, GroupRecord, ItemStack, OwnerId};

use crate::config::CapabilityConfig;
use crate::health::HEALTH_EPSILON;
use crate::host::{AppliedModifier, Owner, MODIFIER_NAMESPACE};
use crate::limiter::WarnLimiter;
use crate::state::CapabilityState;

static EMPTY: ItemStack = ItemStack::empty();

/// Shared collaborators for every capability operation.
#[derive(Clone, Copy)]
pub struct EquipContext<'a> {
    pub registry: &'a GroupRegistry,
    pub catalog: &'a dyn ItemCatalog,
    pub limiter: &'a WarnLimiter,
}

impl<'a> EquipContext<'a> {
    pub fn new(
        registry: &'a GroupRegistry,
        catalog: &'a dyn ItemCatalog,
        limiter: &'a WarnLimiter,
    ) -> Self {
        Self {
            registry,
            catalog,
            limiter,
        }
    }
}

/// Result of [`EquipmentCapability::set_item`].
#[derive(Debug, Clone, PartialEq)]
pub enum EquipOutcome {
    /// The slot now holds the new stack; `previous` is what it held before.
    Equipped { previous: ItemStack },
    /// Nothing changed; the offered stack is handed back.
    Denied { item: ItemStack, reason: DenyReason },
}

impl EquipOutcome {
    pub fn is_equipped(&self) -> bool {
        matches!(self, Self::Equipped { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Uninitialized,
    Active,
}

/// What happens to equipped items when an owner identity is replaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClonePolicy {
    /// Carry every equipped item over.
    Keep,
    /// Keep the group layout but start with empty slots.
    Discard,
}

#[derive(Debug, Clone)]
pub struct EquipmentCapability {
    owner: Option<OwnerId>,
    phase: Phase,
    groups: IndexMap<String, Vec<ItemStack>>,
    /// Groups that held mirror copies at the last initialization.
    mirrors: HashSet<String>,
    state: CapabilityState,
    config: CapabilityConfig,
}

impl EquipmentCapability {
    pub fn new(config: CapabilityConfig) -> Self {
        Self {
            owner: None,
            phase: Phase::Uninitialized,
            groups: IndexMap::new(),
            mirrors: HashSet::new(),
            state: CapabilityState::default(),
            config,
        }
    }

    pub fn set_owner(&mut self, owner: OwnerId) {
        self.owner = Some(owner);
    }

    pub fn owner_id(&self) -> Option<OwnerId> {
        self.owner
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_active(&self) -> bool {
        self.phase == Phase::Active
    }

    pub fn config(&self) -> &CapabilityConfig {
        &self.config
    }

    pub fn state(&self) -> &CapabilityState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut CapabilityState {
        &mut self.state
    }

    pub fn revision(&self) -> u64 {
        self.state.revision()
    }

    pub fn is_dirty(&self) -> bool {
        self.state.is_dirty()
    }

    /// Acknowledges that `revision` is durably stored.
    pub fn mark_saved(&mut self, revision: u64) {
        self.state.mark_saved(revision);
    }

    /// Group keys with their slots, in registry order.
    pub fn groups(&self) -> impl Iterator<Item = (&str, &[ItemStack])> {
        self.groups
            .iter()
            .map(|(key, slots)| (key.as_str(), slots.as_slice()))
    }

    pub fn slots(&self, key: &str) -> Option<&[ItemStack]> {
        self.groups.get(key).map(Vec::as_slice)
    }

    /// Contents of one slot; unknown groups and slots read as empty.
    pub fn get_item(&self, key: &str, slot: usize) -> &ItemStack {
        self.groups
            .get(key)
            .and_then(|slots| slots.get(slot))
            .unwrap_or(&EMPTY)
    }

    /// Groups holding at least one item.
    pub fn equipped_groups(&self) -> Vec<&str> {
        self.groups
            .iter()
            .filter(|(_, slots)| slots.iter().any(|s| !s.is_empty()))
            .map(|(key, _)| key.as_str())
            .collect()
    }

    fn is_group_equipped(&self, key: &str) -> bool {
        self.groups
            .get(key)
            .is_some_and(|slots| slots.iter().any(|s| !s.is_empty()))
    }

    fn log_scope(&self) -> String {
        self.owner
            .map_or_else(|| "unowned".to_string(), |owner| owner.to_string())
    }

    fn mark_changed(&mut self, key: &str) {
        self.state.bump();
        self.state.mark_stale(key);
    }

    fn mark_all_stale(&mut self) {
        let keys: Vec<String> = self.groups.keys().cloned().collect();
        for key in &keys {
            self.state.mark_stale(key);
        }
    }

    /// Reconciles the group map with `registry`.
    ///
    /// Drops groups that are no longer registered, adds missing ones with
    /// empty slots, and resizes slot lists to the current layout. Items that
    /// no longer fit are returned for the host to hand back; mirror copies
    /// are discarded. Calling it twice without a registry change is a no-op.
    pub fn initialize_groups_if_missing(&mut self, registry: &GroupRegistry) -> Vec<ItemStack> {
        let mut displaced = Vec::new();
        let mut changed = false;
        let old_mirrors = std::mem::take(&mut self.mirrors);

        self.groups.retain(|key, slots| {
            if registry.contains(key) {
                return true;
            }
            debug!("Pruning unregistered group `{}`", key);
            if !old_mirrors.contains(key) && !registry.is_mirror(key) {
                displaced.extend(slots.drain(..).filter(|s| !s.is_empty()));
            }
            changed = true;
            false
        });

        for group in registry.all() {
            let key = group.key();
            let size = registry.slot_count(key);
            let mirror = registry.is_mirror(key);
            if mirror {
                self.mirrors.insert(key.to_string());
            }
            let slots = self.groups.entry(key.to_string()).or_default();
            if slots.len() > size {
                for stack in slots.drain(size..) {
                    if !stack.is_empty() && !mirror {
                        displaced.push(stack);
                    }
                }
                changed = true;
            } else if slots.len() < size {
                slots.resize(size, ItemStack::empty());
            }
        }

        if changed {
            self.state.bump();
            self.mark_all_stale();
        }
        self.phase = Phase::Active;
        self.state.set_layout_generation(registry.generation());
        displaced
    }

    /// Places `item` into `key[slot]`.
    ///
    /// A non-empty item is checked group-first, then item-level; a denial
    /// leaves everything untouched and hands the item back. Emptying the last
    /// item of a group also empties every group that requires it, returning
    /// those items to `owner`.
    pub fn set_item(
        &mut self,
        ctx: &EquipContext<'_>,
        owner: &mut dyn Owner,
        key: &str,
        slot: usize,
        item: ItemStack,
    ) -> EquipOutcome {
        self.ensure_current(ctx, owner);

        let Some(group) = ctx.registry.from_key(key) else {
            if ctx
                .limiter
                .warn_once(&format!("{}:unknown-group:{key}", self.log_scope()))
            {
                warn!("Ignoring equip into unknown group `{}`", key);
            }
            return EquipOutcome::Denied {
                item,
                reason: DenyReason::UnknownGroup(key.to_string()),
            };
        };
        let key = group.key().to_string();

        if slot >= self.groups.get(&key).map_or(0, Vec::len) {
            return EquipOutcome::Denied {
                item,
                reason: DenyReason::NoSuchSlot { group: key, slot },
            };
        }

        if item.is_empty() && self.get_item(&key, slot).is_empty() {
            return EquipOutcome::Equipped {
                previous: ItemStack::empty(),
            };
        }

        if !item.is_empty() {
            let equipped = self.equipped_groups();
            let verdict = can_equip_group(ctx.registry, &key, equipped.iter().copied())
                .and_then(|()| can_equip_item(ctx.registry, ctx.catalog, &key, &item));
            if let Err(reason) = verdict {
                debug!("Denied {} in `{}`: {}", item, key, reason);
                return EquipOutcome::Denied { item, reason };
            }
        }

        let previous = match self.groups.get_mut(&key).and_then(|s| s.get_mut(slot)) {
            Some(current) => std::mem::replace(current, item.clone()),
            None => {
                return EquipOutcome::Denied {
                    item,
                    reason: DenyReason::NoSuchSlot { group: key, slot },
                };
            }
        };
        self.mark_changed(&key);
        if slot == 0 {
            self.mirror_slot0(ctx.registry, &key);
        }

        if item.is_empty() && !self.is_group_equipped(&key) {
            for stack in self.auto_unequip_dependents(ctx.registry, &key) {
                owner.give_item(stack);
            }
        }

        self.apply_all_attributes(ctx, owner);
        EquipOutcome::Equipped { previous }
    }

    /// Empties every group whose `requires` references `key`, recursively.
    ///
    /// Returns the displaced items; mirror copies are cleared without being
    /// returned. Dependency cycles are visited once.
    pub fn auto_unequip_dependents(
        &mut self,
        registry: &GroupRegistry,
        key: &str,
    ) -> Vec<ItemStack> {
        let mut visited = HashSet::new();
        let mut displaced = Vec::new();
        self.unequip_dependents_of(registry, key, &mut visited, &mut displaced);
        displaced
    }

    fn unequip_dependents_of(
        &mut self,
        registry: &GroupRegistry,
        key: &str,
        visited: &mut HashSet<String>,
        displaced: &mut Vec<ItemStack>,
    ) {
        if !visited.insert(key.to_string()) {
            return;
        }
        for dependent in registry.dependents_of(key) {
            if visited.contains(&dependent) {
                continue;
            }
            if self.is_group_equipped(&dependent) {
                debug!("Unequipping `{}`: it requires `{}`", dependent, key);
                displaced.extend(self.clear_group(registry, &dependent));
            }
            self.unequip_dependents_of(registry, &dependent, visited, displaced);
        }
    }

    /// Empties a group and its mirrors, returning the real items it held.
    fn clear_group(&mut self, registry: &GroupRegistry, key: &str) -> Vec<ItemStack> {
        let mirror = self.mirrors.contains(key) || registry.is_mirror(key);
        let Some(slots) = self.groups.get_mut(key) else {
            return Vec::new();
        };
        let mut taken = Vec::new();
        let mut changed = false;
        for slot in slots.iter_mut() {
            let stack = slot.take();
            if !stack.is_empty() {
                changed = true;
                if !mirror {
                    taken.push(stack);
                }
            }
        }
        if changed {
            self.mark_changed(key);
            self.mirror_slot0(registry, key);
        }
        taken
    }

    /// Copies `key[0]` into slot 0 of every `linked_with` group.
    fn mirror_slot0(&mut self, registry: &GroupRegistry, key: &str) {
        let source = self.get_item(key, 0).clone();
        for linked in &registry.layout(key).linked_with {
            let Some(first) = self.groups.get_mut(linked).and_then(|s| s.first_mut()) else {
                continue;
            };
            if !first.matches_exactly(&source) {
                *first = source.clone();
                self.state.mark_stale(linked);
            }
        }
    }

    /// Removes every modifier in the engine's namespace from `owner` and
    /// re-adds one per equipped item and declared modifier.
    ///
    /// Missing stats are skipped with a rate-limited warning and host errors
    /// are logged once per modifier key; neither stops the remaining
    /// modifiers. An owner at full health stays at full health, otherwise
    /// health is clamped to the new maximum.
    pub fn apply_all_attributes(&self, ctx: &EquipContext<'_>, owner: &mut dyn Owner) {
        let scope = self.log_scope();
        let was_full = owner.health() >= owner.max_health() - HEALTH_EPSILON;

        owner.remove_modifiers(MODIFIER_NAMESPACE);

        for (key, slots) in &self.groups {
            if self.mirrors.contains(key) {
                continue;
            }
            for (slot, stack) in slots.iter().enumerate().filter(|(_, s)| !s.is_empty()) {
                for (index, spec) in ctx.catalog.modifiers_for(stack).into_iter().enumerate() {
                    let modifier_key = format!("{MODIFIER_NAMESPACE}:{key}/{slot}/{index}");
                    if !owner.has_stat(&spec.stat) {
                        if ctx
                            .limiter
                            .warn_limited(&format!("{scope}:missing-stat:{}", spec.stat))
                        {
                            warn!(
                                "Skipping modifier {} from {}: owner {} has no stat `{}`",
                                modifier_key, stack, scope, spec.stat
                            );
                        }
                        continue;
                    }
                    let modifier = AppliedModifier {
                        key: modifier_key,
                        stat: spec.stat,
                        amount: spec.amount,
                        operation: spec.operation,
                    };
                    let modifier_key = modifier.key.clone();
                    if let Err(e) = owner.add_modifier(modifier) {
                        if ctx
                            .limiter
                            .warn_once(&format!("{scope}:modifier:{modifier_key}"))
                        {
                            warn!("Failed to apply modifier {}: {}", modifier_key, e);
                        }
                    }
                }
            }
        }

        let max = owner.max_health();
        let health = owner.health();
        if (was_full && health < max) || health > max {
            owner.set_health(max);
        }
        owner.push_vitals();
    }

    /// Extends the pending normalization window to at least `ticks`.
    pub fn schedule_health_normalization(&mut self, ticks: u32) {
        self.state.schedule_normalization(ticks);
    }

    /// Per-tick driver.
    ///
    /// Re-lays-out after a registry reload, keeps health within bounds, and
    /// while a normalization window is open nudges health toward max.
    pub fn tick(&mut self, ctx: &EquipContext<'_>, owner: &mut dyn Owner) {
        self.ensure_current(ctx, owner);

        let max = owner.max_health();
        if owner.health() > max + HEALTH_EPSILON {
            owner.set_health(max);
            owner.push_vitals();
        }

        if self.state.consume_tick() {
            let health = owner.health();
            let next = self.config.health_policy.step(health, max);
            if (next - health).abs() > f32::EPSILON {
                owner.set_health(next);
                owner.push_vitals();
            }
        }
    }

    fn ensure_current(&mut self, ctx: &EquipContext<'_>, owner: &mut dyn Owner) {
        if self.is_active() && self.state.layout_generation() != Some(ctx.registry.generation())
        {
            self.on_layouts_reloaded(ctx, owner);
        }
    }

    /// Rebuilds the group map after a registry reload.
    ///
    /// Every held item is put back into its group (same slot if it still
    /// exists, else the first free one) and re-validated under the new rules.
    /// Items that no longer fit are returned to `owner` with a warning.
    pub fn on_layouts_reloaded(&mut self, ctx: &EquipContext<'_>, owner: &mut dyn Owner) {
        let scope = self.log_scope();
        let snapshot = std::mem::take(&mut self.groups);
        let old_mirrors = std::mem::take(&mut self.mirrors);
        self.initialize_groups_if_missing(ctx.registry);

        let mut returned: Vec<(ItemStack, DenyReason)> = Vec::new();
        for (key, slots) in snapshot {
            if old_mirrors.contains(&key) || ctx.registry.is_mirror(&key) {
                continue;
            }
            for (index, stack) in slots.into_iter().enumerate() {
                if stack.is_empty() {
                    continue;
                }
                if let Err(reason) = self.restore_item(ctx, &key, index, &stack) {
                    returned.push((stack, reason));
                }
            }
        }

        // Group rules depend on what else is equipped, so check them once
        // everything is back and drop offenders until the set is consistent.
        loop {
            let equipped: Vec<String> = self
                .equipped_groups()
                .into_iter()
                .map(str::to_string)
                .collect();
            let failure = equipped.iter().find_map(|key| {
                can_equip_group(ctx.registry, key, equipped.iter().map(String::as_str))
                    .err()
                    .map(|reason| (key.clone(), reason))
            });
            let Some((key, reason)) = failure else {
                break;
            };
            for stack in self.clear_group(ctx.registry, &key) {
                returned.push((stack, reason.clone()));
            }
        }

        let keys: Vec<String> = self.groups.keys().cloned().collect();
        for key in &keys {
            self.mirror_slot0(ctx.registry, key);
        }
        self.state.bump();
        self.mark_all_stale();

        for (stack, reason) in returned {
            warn!(
                "Returning {} to owner {} after layout reload: {}",
                stack, scope, reason
            );
            owner.give_item(stack);
        }
        self.apply_all_attributes(ctx, owner);
    }

    fn restore_item(
        &mut self,
        ctx: &EquipContext<'_>,
        key: &str,
        index: usize,
        stack: &ItemStack,
    ) -> Result<(), DenyReason> {
        if !ctx.registry.contains(key) {
            return Err(DenyReason::UnknownGroup(key.to_string()));
        }
        can_equip_item(ctx.registry, ctx.catalog, key, stack)?;
        let Some(slots) = self.groups.get_mut(key) else {
            return Err(DenyReason::UnknownGroup(key.to_string()));
        };
        let target = if slots.get(index).is_some_and(ItemStack::is_empty) {
            Some(index)
        } else {
            slots.iter().position(ItemStack::is_empty)
        };
        match target {
            Some(target) => {
                slots[target] = stack.clone();
                Ok(())
            }
            None => Err(DenyReason::NoSuchSlot {
                group: key.to_string(),
                slot: index,
            }),
        }
    }

    /// Login hook: reconcile groups, reapply modifiers, open a normalization
    /// window.
    pub fn reapply_on_login(&mut self, ctx: &EquipContext<'_>, owner: &mut dyn Owner) {
        self.reapply(ctx, owner, self.config.login_normalization_ticks);
    }

    /// Respawn hook; same as login with the respawn window.
    pub fn reapply_on_respawn(&mut self, ctx: &EquipContext<'_>, owner: &mut dyn Owner) {
        self.reapply(ctx, owner, self.config.respawn_normalization_ticks);
    }

    fn reapply(&mut self, ctx: &EquipContext<'_>, owner: &mut dyn Owner, ticks: u32) {
        self.ensure_current(ctx, owner);
        for stack in self.initialize_groups_if_missing(ctx.registry) {
            owner.give_item(stack);
        }
        self.apply_all_attributes(ctx, owner);
        self.schedule_health_normalization(ticks);
    }

    /// Copies state from the capability of a replaced owner identity.
    ///
    /// The owner id of `self` is kept. With [`ClonePolicy::Discard`] the
    /// group layout carries over but every slot starts empty; the host is
    /// responsible for whatever happened to the old items.
    pub fn copy_from(&mut self, other: &EquipmentCapability, policy: ClonePolicy) {
        self.groups = match policy {
            ClonePolicy::Keep => other.groups.clone(),
            ClonePolicy::Discard => other
                .groups
                .iter()
                .map(|(key, slots)| (key.clone(), vec![ItemStack::empty(); slots.len()]))
                .collect(),
        };
        self.mirrors = other.mirrors.clone();
        self.phase = other.phase;
        if let Some(generation) = other.state.layout_generation() {
            self.state.set_layout_generation(generation);
        }
        self.state.bump();
        self.mark_all_stale();
    }

    /// Snapshot for persistence or a full sync.
    pub fn to_record(&self) -> CapabilityRecord {
        let mut record = CapabilityRecord::new();
        record.groups = self.groups.clone();
        record
    }

    /// Snapshot of one group for a partial sync.
    pub fn group_record(&self, key: &str) -> Option<GroupRecord> {
        self.groups
            .get(key)
            .map(|slots| GroupRecord::new(key, slots.clone()))
    }

    /// Replaces the group map with a stored record.
    ///
    /// Groups the registry does not know are logged once and dropped. The
    /// capability is clean afterwards unless something had to be dropped.
    /// Call [`initialize_groups_if_missing`](Self::initialize_groups_if_missing)
    /// next to fit the data to the current layouts.
    pub fn load_record(&mut self, ctx: &EquipContext<'_>, record: CapabilityRecord) {
        let scope = self.log_scope();
        let mut dropped = false;
        self.groups.clear();
        for (key, slots) in record.groups {
            match ctx.registry.from_key(&key) {
                Some(group) => {
                    self.groups.insert(group.key().to_string(), slots);
                }
                None => {
                    dropped = true;
                    if ctx
                        .limiter
                        .warn_once(&format!("{scope}:unknown-group:{key}"))
                    {
                        warn!("Dropping unknown group `{}` from record of {}", key, scope);
                    }
                }
            }
        }
        self.state.bump();
        if !dropped {
            self.state.mark_clean();
        }
        self.mark_all_stale();
    }

    /// Replaces one group's slots from a partial record. Returns false (and
    /// logs once) if the group is unknown.
    pub fn load_group_record(&mut self, ctx: &EquipContext<'_>, record: GroupRecord) -> bool {
        let Some(group) = ctx.registry.from_key(&record.key) else {
            if ctx
                .limiter
                .warn_once(&format!("{}:unknown-group:{}", self.log_scope(), record.key))
            {
                warn!("Ignoring update for unknown group `{}`", record.key);
            }
            return false;
        };
        let key = group.key().to_string();
        self.groups.insert(key.clone(), record.slots);
        self.mark_changed(&key);
        true
    }
}

impl Default for EquipmentCapability {
    fn default() -> Self {
        Self::new(CapabilityConfig::default())
    }
}
