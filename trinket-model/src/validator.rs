//! Pure equip decisions.
//!
//! Nothing here mutates state or talks to the player. Group checks run in a
//! fixed order (requirements, conflicts, tags) and the first failure wins.

use thiserror::Error;
use trinket_types::{ItemId, ItemStack};

use crate::catalog::ItemCatalog;
use crate::registry::GroupRegistry;

/// Why an equip attempt was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DenyReason {
    #[error("group `{0}` is not registered")]
    UnknownGroup(String),

    #[error("`{group}` requires `{required}` to be equipped first")]
    MissingRequirement { group: String, required: String },

    #[error("`{group}` cannot be worn together with `{conflicting}`")]
    Conflict { group: String, conflicting: String },

    #[error("`{group}` shares tag `{tag}` with equipped `{other}`")]
    TagClash {
        group: String,
        tag: String,
        other: String,
    },

    #[error("{item} is not allowed in `{group}`")]
    ItemNotAllowed { group: String, item: ItemId },

    #[error("`{group}` has no slot {slot}")]
    NoSuchSlot { group: String, slot: usize },
}

/// May `target` be equipped while `equipped` groups hold items?
///
/// `target` itself is ignored if it appears in `equipped`.
pub fn can_equip_group<'a>(
    registry: &GroupRegistry,
    target: &str,
    equipped: impl IntoIterator<Item = &'a str>,
) -> Result<(), DenyReason> {
    let group = registry
        .from_key(target)
        .ok_or_else(|| DenyReason::UnknownGroup(target.to_string()))?;
    let key = group.key();
    let layout = registry.layout(key);
    let equipped: Vec<&str> = equipped.into_iter().filter(|k| *k != key).collect();

    if let Some(required) = layout
        .requires
        .iter()
        .find(|required| !equipped.contains(&required.as_str()))
    {
        return Err(DenyReason::MissingRequirement {
            group: key.to_string(),
            required: required.clone(),
        });
    }

    if let Some(conflicting) = layout
        .conflicts
        .iter()
        .find(|conflict| equipped.contains(&conflict.as_str()))
    {
        return Err(DenyReason::Conflict {
            group: key.to_string(),
            conflicting: conflicting.clone(),
        });
    }

    for tag in &layout.tags {
        for other in &equipped {
            if registry.layout(other).tags.contains(tag) {
                return Err(DenyReason::TagClash {
                    group: key.to_string(),
                    tag: tag.clone(),
                    other: (*other).to_string(),
                });
            }
        }
    }

    Ok(())
}

/// May `stack` be placed in `group`? Empty stacks always may.
pub fn can_equip_item(
    registry: &GroupRegistry,
    catalog: &dyn ItemCatalog,
    group: &str,
    stack: &ItemStack,
) -> Result<(), DenyReason> {
    let Some(item) = stack.item() else {
        return Ok(());
    };
    let group = registry
        .from_key(group)
        .ok_or_else(|| DenyReason::UnknownGroup(group.to_string()))?;
    let layout = registry.layout(group.key());
    if layout.accepts(item, catalog) {
        Ok(())
    } else {
        Err(DenyReason::ItemNotAllowed {
            group: group.key().to_string(),
            item: item.clone(),
        })
    }
}
