//! Consolidated bookkeeping for one capability.
//!
//! Dirty tracking is a pair of revisions: every mutation bumps `revision`,
//! and the persistence layer reports back the revision it wrote. A
//! capability is clean when the two meet. Staleness is tracked per group.

use indexmap::IndexSet;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapabilityState {
    revision: u64,
    saved_revision: u64,
    stale: IndexSet<String>,
    pending_normalization_ticks: u32,
    layout_generation: Option<u64>,
}

impl CapabilityState {
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn saved_revision(&self) -> u64 {
        self.saved_revision
    }

    /// Content changed since the last durable save.
    pub fn is_dirty(&self) -> bool {
        self.revision != self.saved_revision
    }

    pub(crate) fn bump(&mut self) -> u64 {
        self.revision += 1;
        self.revision
    }

    /// Records that `revision` reached disk. Older acknowledgements are
    /// ignored, as are revisions this state never produced.
    pub fn mark_saved(&mut self, revision: u64) {
        let revision = revision.min(self.revision);
        if revision > self.saved_revision {
            self.saved_revision = revision;
        }
    }

    /// Treats the current content as saved (e.g. right after loading it).
    pub(crate) fn mark_clean(&mut self) {
        self.saved_revision = self.revision;
    }

    pub fn is_stale(&self, key: &str) -> bool {
        self.stale.contains(key)
    }

    pub fn has_stale(&self) -> bool {
        !self.stale.is_empty()
    }

    /// Stale group keys in the order they went stale.
    pub fn stale_groups(&self) -> impl Iterator<Item = &str> {
        self.stale.iter().map(String::as_str)
    }

    pub(crate) fn mark_stale(&mut self, key: &str) {
        if !self.stale.contains(key) {
            self.stale.insert(key.to_string());
        }
    }

    /// Clears the stale flag for `key` after a successful push.
    pub fn clear_stale(&mut self, key: &str) {
        self.stale.shift_remove(key);
    }

    /// Removes and returns every stale key.
    pub fn take_stale(&mut self) -> Vec<String> {
        self.stale.drain(..).collect()
    }

    pub fn pending_normalization_ticks(&self) -> u32 {
        self.pending_normalization_ticks
    }

    pub(crate) fn schedule_normalization(&mut self, ticks: u32) {
        self.pending_normalization_ticks = self.pending_normalization_ticks.max(ticks);
    }

    /// Consumes one tick; returns false once the window has ended.
    pub(crate) fn consume_tick(&mut self) -> bool {
        if self.pending_normalization_ticks == 0 {
            return false;
        }
        self.pending_normalization_ticks -= 1;
        true
    }

    pub fn layout_generation(&self) -> Option<u64> {
        self.layout_generation
    }

    pub(crate) fn set_layout_generation(&mut self, generation: u64) {
        self.layout_generation = Some(generation);
    }
}
