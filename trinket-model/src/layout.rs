//! Declarative slot layouts and equip rules for one group.
//!
//! Layout files went through several spellings of the same rule lists over
//! time. Every spelling is read and the lists are merged (union, first
//! occurrence wins the position) so old and new files both apply.

use serde::{Deserialize, Serialize};
use trinket_types::{ItemId, TagKey};

use crate::catalog::ItemCatalog;
use crate::error::{LayoutError, LayoutResult};

/// Default distance between neighbouring slots, in pixels.
pub const DEFAULT_SPACING: i32 = 18;

/// Upper bound on slots in one group.
pub const MAX_SLOTS: usize = 256;

/// `index * spacing`, clamped to the coordinate range.
fn offset(index: usize, spacing: i32) -> i32 {
    i32::try_from(index)
        .unwrap_or(i32::MAX)
        .saturating_mul(spacing)
}

/// Direction in which procedural slots are laid out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    #[default]
    Right,
    Left,
    Up,
    Down,
}

/// Allow-list entry: a direct item id or a `#tag` reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ItemMatcher {
    Item(ItemId),
    Tag(TagKey),
}

impl ItemMatcher {
    /// Parses `#namespace:path` as a tag and anything else as an item id.
    pub fn parse(raw: &str) -> Result<Self, trinket_types::Error> {
        let raw = raw.trim();
        if raw.starts_with('#') {
            TagKey::parse(raw).map(Self::Tag)
        } else {
            ItemId::parse(raw).map(Self::Item)
        }
    }

    pub fn matches(&self, item: &ItemId, catalog: &dyn ItemCatalog) -> bool {
        match self {
            Self::Item(id) => id == item,
            Self::Tag(tag) => catalog.has_tag(item, tag),
        }
    }
}

impl std::fmt::Display for ItemMatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Item(id) => write!(f, "{id}"),
            Self::Tag(tag) => write!(f, "{tag}"),
        }
    }
}

/// How slot coordinates are derived.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Geometry {
    /// Explicit cell pattern; every character other than `.` or space is a slot.
    Grid {
        origin: (i32, i32),
        spacing: i32,
        rows: Vec<String>,
    },
    /// `count` slots starting at `origin`, stepping `spacing` in `direction`,
    /// starting a new line every `wrap` slots (0 = never).
    Procedural {
        origin: (i32, i32),
        direction: Direction,
        spacing: i32,
        wrap: u32,
        count: u32,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutMode {
    Grid,
    Procedural,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotPosition {
    pub x: i32,
    pub y: i32,
}

/// Concrete slot coordinates derived from a definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    pub mode: LayoutMode,
    pub positions: Vec<SlotPosition>,
}

impl Layout {
    pub fn slot_count(&self) -> usize {
        self.positions.len()
    }
}

/// On-disk shape, including every legacy spelling of the rule lists.
#[derive(Debug, Deserialize)]
struct RawDefinition {
    #[serde(alias = "group", alias = "id")]
    key: String,
    #[serde(default, alias = "item_tag")]
    classification: Option<String>,
    #[serde(default)]
    grid: Vec<String>,
    #[serde(default, alias = "count")]
    slots: Option<u32>,
    #[serde(default)]
    origin: Option<[i32; 2]>,
    #[serde(default)]
    direction: Direction,
    #[serde(default)]
    spacing: Option<i32>,
    #[serde(default)]
    wrap: u32,

    #[serde(default)]
    requires: Vec<String>,
    #[serde(default)]
    required_groups: Vec<String>,
    #[serde(default)]
    dependencies: Vec<String>,

    #[serde(default)]
    conflicts: Vec<String>,
    #[serde(default)]
    incompatible_with: Vec<String>,
    #[serde(default)]
    excludes: Vec<String>,

    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    categories: Vec<String>,

    #[serde(default)]
    valid_items: Vec<String>,
    #[serde(default)]
    allowed_items: Vec<String>,
    #[serde(default)]
    items: Vec<String>,

    #[serde(default)]
    linked_with: Vec<String>,
    #[serde(default)]
    mirrors: Vec<String>,
}

/// Normalizes a group key: trimmed and lowercased, never empty.
pub(crate) fn normalize_group_key(raw: &str) -> LayoutResult<String> {
    let key = raw.trim().to_lowercase();
    if key.is_empty() {
        return Err(LayoutError::InvalidKey {
            key,
            reason: "group key must not be empty",
        });
    }
    if key.chars().any(char::is_whitespace) {
        return Err(LayoutError::InvalidKey {
            key,
            reason: "group key must not contain whitespace",
        });
    }
    Ok(key)
}

/// Union of several lists, lowercased, without duplicates or `exclude`.
fn merge_keys(lists: [Vec<String>; 3], exclude: &str) -> LayoutResult<Vec<String>> {
    let mut merged: Vec<String> = Vec::new();
    for raw in lists.into_iter().flatten() {
        let key = normalize_group_key(&raw)?;
        if key != exclude && !merged.contains(&key) {
            merged.push(key);
        }
    }
    Ok(merged)
}

/// Slot geometry plus equip rules for one group.
///
/// Immutable once parsed; a reload produces fresh definitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotLayoutDefinition {
    pub key: String,
    pub classification: Option<TagKey>,
    pub geometry: Geometry,
    /// Groups that must already be equipped.
    pub requires: Vec<String>,
    /// Groups that must not be equipped.
    pub conflicts: Vec<String>,
    /// Mutual-exclusion categories.
    pub tags: Vec<String>,
    /// Empty means any item is accepted.
    pub valid_items: Vec<ItemMatcher>,
    /// Groups whose slot 0 mirrors this group's slot 0.
    pub linked_with: Vec<String>,
}

impl SlotLayoutDefinition {
    /// Parses a definition from JSON text.
    pub fn parse(json: &str) -> LayoutResult<Self> {
        let raw: RawDefinition = serde_json::from_str(json)?;
        Self::from_raw(raw)
    }

    /// Parses a definition from an already-decoded JSON value.
    pub fn from_value(value: serde_json::Value) -> LayoutResult<Self> {
        let raw: RawDefinition = serde_json::from_value(value)?;
        Self::from_raw(raw)
    }

    fn from_raw(raw: RawDefinition) -> LayoutResult<Self> {
        let key = normalize_group_key(&raw.key)?;
        let origin = raw.origin.map(|[x, y]| (x, y)).unwrap_or((0, 0));
        let spacing = raw.spacing.unwrap_or(DEFAULT_SPACING);

        let has_cells = raw.grid.iter().any(|row| row.chars().any(is_cell));
        let geometry = if has_cells {
            Geometry::Grid {
                origin,
                spacing,
                rows: raw.grid,
            }
        } else {
            Geometry::Procedural {
                origin,
                direction: raw.direction,
                spacing,
                wrap: raw.wrap,
                count: raw.slots.unwrap_or(1),
            }
        };

        let classification = raw
            .classification
            .as_deref()
            .map(TagKey::parse)
            .transpose()
            .map_err(|source| LayoutError::InvalidItem {
                key: key.clone(),
                source,
            })?;

        let mut valid_items: Vec<ItemMatcher> = Vec::new();
        for entry in raw
            .valid_items
            .iter()
            .chain(&raw.allowed_items)
            .chain(&raw.items)
        {
            let matcher = ItemMatcher::parse(entry).map_err(|source| LayoutError::InvalidItem {
                key: key.clone(),
                source,
            })?;
            if !valid_items.contains(&matcher) {
                valid_items.push(matcher);
            }
        }

        let requires = merge_keys([raw.requires, raw.required_groups, raw.dependencies], &key)?;
        let conflicts = merge_keys([raw.conflicts, raw.incompatible_with, raw.excludes], &key)?;
        let tags = merge_keys([raw.tags, raw.categories, Vec::new()], "")?;
        let linked_with = merge_keys([raw.linked_with, raw.mirrors, Vec::new()], &key)?;

        let definition = Self {
            key,
            classification,
            geometry,
            requires,
            conflicts,
            tags,
            valid_items,
            linked_with,
        };
        match definition.slot_count() {
            0 => Err(LayoutError::NoSlots {
                key: definition.key,
            }),
            count if count > MAX_SLOTS => Err(LayoutError::TooManySlots {
                key: definition.key,
                count,
            }),
            _ => Ok(definition),
        }
    }

    /// One procedural slot and no rules; used for groups registered without
    /// a layout file.
    pub fn single_slot(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            classification: None,
            geometry: Geometry::Procedural {
                origin: (0, 0),
                direction: Direction::Right,
                spacing: DEFAULT_SPACING,
                wrap: 0,
                count: 1,
            },
            requires: Vec::new(),
            conflicts: Vec::new(),
            tags: Vec::new(),
            valid_items: Vec::new(),
            linked_with: Vec::new(),
        }
    }

    /// Number of slots without materializing coordinates.
    pub fn slot_count(&self) -> usize {
        match &self.geometry {
            Geometry::Grid { rows, .. } => rows
                .iter()
                .map(|row| row.chars().filter(|c| is_cell(*c)).count())
                .sum(),
            Geometry::Procedural { count, .. } => *count as usize,
        }
    }

    /// Derives concrete slot coordinates.
    pub fn to_layout(&self) -> Layout {
        match &self.geometry {
            Geometry::Grid {
                origin,
                spacing,
                rows,
            } => {
                let positions = rows
                    .iter()
                    .enumerate()
                    .flat_map(|(row, cells)| {
                        cells.chars().enumerate().filter(|(_, c)| is_cell(*c)).map(
                            move |(col, _)| SlotPosition {
                                x: origin.0.saturating_add(offset(col, *spacing)),
                                y: origin.1.saturating_add(offset(row, *spacing)),
                            },
                        )
                    })
                    .collect();
                Layout {
                    mode: LayoutMode::Grid,
                    positions,
                }
            }
            Geometry::Procedural {
                origin,
                direction,
                spacing,
                wrap,
                count,
            } => {
                let positions = (0..*count)
                    .map(|i| {
                        let (along, across) = if *wrap > 0 {
                            (i % wrap, i / wrap)
                        } else {
                            (i, 0)
                        };
                        let along = offset(along as usize, *spacing);
                        let across = offset(across as usize, *spacing);
                        let (dx, dy) = match direction {
                            Direction::Right => (along, across),
                            Direction::Left => (along.saturating_neg(), across),
                            Direction::Down => (across, along),
                            Direction::Up => (across, along.saturating_neg()),
                        };
                        SlotPosition {
                            x: origin.0.saturating_add(dx),
                            y: origin.1.saturating_add(dy),
                        }
                    })
                    .collect();
                Layout {
                    mode: LayoutMode::Procedural,
                    positions,
                }
            }
        }
    }

    /// Returns true if `item` passes this group's allow-list.
    pub fn accepts(&self, item: &ItemId, catalog: &dyn ItemCatalog) -> bool {
        self.valid_items.is_empty() || self.valid_items.iter().any(|m| m.matches(item, catalog))
    }
}

fn is_cell(c: char) -> bool {
    c != '.' && !c.is_whitespace()
}
