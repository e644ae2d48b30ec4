//! Equipment rules for Trinket.
//!
//! Defines the data-driven side of the engine that every capability consults:
//! - [`GroupRegistry`]: insertion-ordered registry of named slot categories,
//!   rebuilt on every layout reload
//! - [`SlotLayoutDefinition`]: per-group slot geometry and equip rules
//!   parsed from JSON, with legacy rule spellings merged in
//! - [`validator`]: pure allow/deny decisions for equipping groups and items
//! - [`ItemCatalog`]: the host boundary for item tags and declared modifiers
//!
//! Nothing here owns per-owner state; see `trinket-capability` for that.

mod catalog;
mod error;
mod layout;
mod loader;
mod registry;
pub mod validator;

pub use catalog::{ItemCatalog, ModifierOperation, ModifierSpec, StaticCatalog, StatId, MAX_HEALTH};
pub use error::{LayoutError, LayoutResult};
pub use layout::{
    Direction, Geometry, ItemMatcher, Layout, LayoutMode, SlotLayoutDefinition, SlotPosition,
    DEFAULT_SPACING, MAX_SLOTS,
};
pub use loader::{LayoutLoader, LoadedLayouts};
pub use registry::{EquipmentGroup, GroupId, GroupRegistry, BASE_GROUPS};
pub use validator::DenyReason;
