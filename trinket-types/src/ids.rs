//! Identifier types used throughout Trinket.
//!
//! Owners use UUID v7 so persisted file names sort by creation time. Items
//! and tags are namespaced `namespace:path` keys.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::Error;

/// Identity of the long-lived entity a capability is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OwnerId(Uuid);

impl OwnerId {
    /// Creates a new owner ID with the current timestamp.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Creates an owner ID from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> Uuid {
        self.0
    }

    /// Parses an owner ID from a string.
    pub fn parse(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

impl Default for OwnerId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for OwnerId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Validates and normalizes a `namespace:path` key.
///
/// A bare `path` gets the `minecraft` namespace, matching how item ids are
/// written in layout files.
fn normalize_key(raw: &str) -> Result<String, Error> {
    let key = raw.trim().to_ascii_lowercase();
    if key.is_empty() {
        return Err(Error::InvalidKey {
            key,
            reason: "key must not be empty",
        });
    }
    let (namespace, path) = match key.split_once(':') {
        Some((ns, path)) => (ns.to_string(), path.to_string()),
        None => ("minecraft".to_string(), key.clone()),
    };
    let valid = |s: &str, extra: &[char]| {
        !s.is_empty()
            && s.chars().all(|c| {
                c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '_' | '-' | '.') || extra.contains(&c)
            })
    };
    if !valid(&namespace, &[]) {
        return Err(Error::InvalidKey {
            key,
            reason: "namespace must match [a-z0-9_.-]+",
        });
    }
    if !valid(&path, &['/']) {
        return Err(Error::InvalidKey {
            key,
            reason: "path must match [a-z0-9_./-]+",
        });
    }
    Ok(format!("{namespace}:{path}"))
}

/// Namespaced identifier of an item type, e.g. `mymod:ruby_earring`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    /// Parses and normalizes an item id.
    pub fn parse(s: &str) -> Result<Self, Error> {
        normalize_key(s).map(Self)
    }

    /// Returns the normalized `namespace:path` form.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ItemId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Namespaced item classification tag, e.g. `mymod:earrings`.
///
/// Displayed with a leading `#`, the way tag references are written in
/// layout allow-lists.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TagKey(String);

impl TagKey {
    /// Parses a tag key; a leading `#` is accepted and stripped.
    pub fn parse(s: &str) -> Result<Self, Error> {
        normalize_key(s.trim().trim_start_matches('#')).map(Self)
    }

    /// Returns the normalized `namespace:path` form (without `#`).
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TagKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl FromStr for TagKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
