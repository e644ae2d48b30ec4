//! Last-pushed digests per owner.

use std::collections::HashMap;
use trinket_types::{Digest, OwnerId};

#[derive(Debug, Default)]
pub struct DigestTracker {
    full: HashMap<OwnerId, Digest>,
    groups: HashMap<OwnerId, HashMap<String, Digest>>,
}

impl DigestTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn full(&self, owner: OwnerId) -> Option<Digest> {
        self.full.get(&owner).copied()
    }

    pub fn set_full(&mut self, owner: OwnerId, digest: Digest) {
        self.full.insert(owner, digest);
    }

    /// Drops the full digest once the mirror has moved past it.
    pub fn clear_full(&mut self, owner: OwnerId) {
        self.full.remove(&owner);
    }

    pub fn group(&self, owner: OwnerId, key: &str) -> Option<Digest> {
        self.groups.get(&owner)?.get(key).copied()
    }

    pub fn set_group(&mut self, owner: OwnerId, key: &str, digest: Digest) {
        self.groups
            .entry(owner)
            .or_default()
            .insert(key.to_string(), digest);
    }

    /// Replaces every group digest for `owner`.
    pub fn replace_groups(&mut self, owner: OwnerId, digests: HashMap<String, Digest>) {
        self.groups.insert(owner, digests);
    }

    pub fn forget(&mut self, owner: OwnerId) {
        self.full.remove(&owner);
        self.groups.remove(&owner);
    }

    /// Number of owners with any cached digest.
    pub fn len(&self) -> usize {
        self.full
            .keys()
            .chain(self.groups.keys())
            .collect::<std::collections::HashSet<_>>()
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.full.is_empty() && self.groups.is_empty()
    }
}
