//! Versioned binary compound used for durable storage and mirror sync.
//!
//! Records are MessagePack with named fields, so a reader can tell a
//! structurally valid record from garbage and older readers can skip fields
//! they do not know.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::{Error, ItemStack, Result};

/// Current record format version.
pub const RECORD_VERSION: u32 = 1;

fn check_version(found: u32) -> Result<()> {
    if found == 0 || found > RECORD_VERSION {
        return Err(Error::UnsupportedVersion {
            found,
            supported: RECORD_VERSION,
        });
    }
    Ok(())
}

/// Serialized form of one owner's capability: group key → slot contents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilityRecord {
    pub version: u32,
    #[serde(default)]
    pub groups: IndexMap<String, Vec<ItemStack>>,
}

impl CapabilityRecord {
    /// Creates an empty record at the current version.
    #[must_use]
    pub fn new() -> Self {
        Self {
            version: RECORD_VERSION,
            groups: IndexMap::new(),
        }
    }

    /// Adds (or replaces) a group's slot list.
    pub fn insert_group(&mut self, key: impl Into<String>, slots: Vec<ItemStack>) {
        self.groups.insert(key.into(), slots);
    }

    /// Builder form of [`insert_group`](Self::insert_group).
    #[must_use]
    pub fn with_group(mut self, key: impl Into<String>, slots: Vec<ItemStack>) -> Self {
        self.insert_group(key, slots);
        self
    }

    /// A record without any group carries no information worth writing.
    #[must_use]
    pub fn is_trivial(&self) -> bool {
        self.groups.is_empty()
    }

    /// Number of non-empty stacks across all groups.
    #[must_use]
    pub fn item_count(&self) -> usize {
        self.groups
            .values()
            .flat_map(|slots| slots.iter())
            .filter(|stack| !stack.is_empty())
            .count()
    }

    /// Extracts one group as a standalone partial record.
    #[must_use]
    pub fn group(&self, key: &str) -> Option<GroupRecord> {
        self.groups
            .get(key)
            .map(|slots| GroupRecord::new(key, slots.clone()))
    }

    /// Encodes the record as named MessagePack.
    pub fn encode(&self) -> Result<Vec<u8>> {
        Ok(rmp_serde::to_vec_named(self)?)
    }

    /// Decodes and structurally validates a record.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let record: Self = rmp_serde::from_slice(bytes)?;
        check_version(record.version)?;
        Ok(record)
    }
}

impl Default for CapabilityRecord {
    fn default() -> Self {
        Self::new()
    }
}

/// Serialized form of a single group, used for partial sync.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupRecord {
    pub version: u32,
    pub key: String,
    #[serde(default)]
    pub slots: Vec<ItemStack>,
}

impl GroupRecord {
    /// Creates a group record at the current version.
    #[must_use]
    pub fn new(key: impl Into<String>, slots: Vec<ItemStack>) -> Self {
        Self {
            version: RECORD_VERSION,
            key: key.into(),
            slots,
        }
    }

    /// Encodes the record as named MessagePack.
    pub fn encode(&self) -> Result<Vec<u8>> {
        Ok(rmp_serde::to_vec_named(self)?)
    }

    /// Decodes and structurally validates a group record.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let record: Self = rmp_serde::from_slice(bytes)?;
        check_version(record.version)?;
        Ok(record)
    }
}
