//! The boundary between a capability and the entity that wears it.

use serde::{Deserialize, Serialize};
use trinket_model::{ModifierOperation, StatId};
use trinket_types::{ItemStack, OwnerId};

use crate::error::HostResult;

/// Namespace of every modifier this engine applies.
pub const MODIFIER_NAMESPACE: &str = "trinket";

/// A stat modifier as handed to the owner, tagged with a stable key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppliedModifier {
    /// `trinket:<group>/<slot>/<index>`; stable across reapplication.
    pub key: String,
    pub stat: StatId,
    pub amount: f64,
    pub operation: ModifierOperation,
}

impl AppliedModifier {
    /// Namespace part of the key (before the first `:`).
    pub fn namespace(&self) -> &str {
        self.key.split_once(':').map_or("", |(ns, _)| ns)
    }
}

/// Callbacks the host game provides for one owner.
///
/// Only called from the thread that owns the capability.
pub trait Owner {
    fn id(&self) -> OwnerId;

    /// Returns true if the owner carries `stat` at all.
    fn has_stat(&self, stat: &StatId) -> bool;

    fn add_modifier(&mut self, modifier: AppliedModifier) -> HostResult<()>;

    /// Removes every modifier whose key lives in `namespace`.
    fn remove_modifiers(&mut self, namespace: &str);

    fn health(&self) -> f32;

    fn max_health(&self) -> f32;

    fn set_health(&mut self, health: f32);

    /// Hands an item back to the owner's general inventory.
    fn give_item(&mut self, stack: ItemStack);

    /// Pushes current stats and health to the owner's remote view.
    fn push_vitals(&mut self) {}
}
