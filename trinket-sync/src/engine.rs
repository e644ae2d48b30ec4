//! The sync engine: decides whether a push is needed and sends it.
//!
//! Digests are SHA-256 over the encoded payload. A push is skipped when the
//! digest matches the last one sent for the same owner (and group), so
//! repeated syncs of unchanged state produce no traffic.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};
use trinket_capability::EquipmentCapability;
use trinket_types::{Digest, GroupRecord, OwnerId};

use crate::config::SyncConfig;
use crate::error::{SyncError, SyncResult};
use crate::protocol::SyncMessage;
use crate::tracker::DigestTracker;
use crate::transport::SyncTransport;

/// What a sync call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    Pushed { digest: Digest },
    Unchanged,
}

impl SyncOutcome {
    pub fn is_pushed(&self) -> bool {
        matches!(self, Self::Pushed { .. })
    }
}

pub struct SyncEngine {
    transport: Arc<dyn SyncTransport>,
    config: SyncConfig,
    tracker: Mutex<DigestTracker>,
}

impl SyncEngine {
    pub fn new(transport: Arc<dyn SyncTransport>, config: SyncConfig) -> Self {
        Self {
            transport,
            config,
            tracker: Mutex::new(DigestTracker::new()),
        }
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Pushes the whole capability if it differs from the last full push.
    pub fn sync_full(&self, capability: &mut EquipmentCapability) -> SyncResult<SyncOutcome> {
        self.push_full(capability, false)
    }

    /// Pushes the whole capability unconditionally.
    pub fn force_sync_full(
        &self,
        capability: &mut EquipmentCapability,
    ) -> SyncResult<SyncOutcome> {
        self.push_full(capability, true)
    }

    fn push_full(
        &self,
        capability: &mut EquipmentCapability,
        force: bool,
    ) -> SyncResult<SyncOutcome> {
        let owner = capability.owner_id().ok_or(SyncError::NoOwner)?;
        let message = SyncMessage::full(owner, &capability.to_record())?;
        let digest = message.digest();

        if !force && self.tracker.lock().full(owner) == Some(digest) {
            debug!("Full sync for {} skipped: unchanged", owner);
            return Ok(SyncOutcome::Unchanged);
        }

        let groups = group_digests(capability)?;
        self.send(message)?;

        let mut tracker = self.tracker.lock();
        tracker.set_full(owner, digest);
        tracker.replace_groups(owner, groups);
        drop(tracker);
        capability.state_mut().take_stale();

        debug!("Pushed full record for {} ({})", owner, digest);
        Ok(SyncOutcome::Pushed { digest })
    }

    /// Pushes one group if it differs from the last push of that group.
    pub fn sync_group(
        &self,
        capability: &mut EquipmentCapability,
        key: &str,
    ) -> SyncResult<SyncOutcome> {
        let owner = capability.owner_id().ok_or(SyncError::NoOwner)?;
        let record = capability
            .group_record(key)
            .ok_or_else(|| SyncError::UnknownGroup(key.to_string()))?;
        let message = SyncMessage::partial(owner, &record)?;
        let digest = message.digest();

        if self.tracker.lock().group(owner, key) == Some(digest) {
            capability.state_mut().clear_stale(key);
            return Ok(SyncOutcome::Unchanged);
        }

        self.send(message)?;
        let mut tracker = self.tracker.lock();
        tracker.set_group(owner, key, digest);
        // The mirror no longer matches the last full push.
        tracker.clear_full(owner);
        drop(tracker);
        capability.state_mut().clear_stale(key);

        debug!("Pushed group `{}` for {} ({})", key, owner, digest);
        Ok(SyncOutcome::Pushed { digest })
    }

    /// Pushes every stale group. Stops at the first transport failure,
    /// leaving that group and the rest stale. Returns the number pushed.
    pub fn sync_stale(&self, capability: &mut EquipmentCapability) -> SyncResult<usize> {
        let stale: Vec<String> = capability
            .state()
            .stale_groups()
            .map(str::to_string)
            .collect();
        let mut pushed = 0;
        for key in stale {
            match self.sync_group(capability, &key) {
                Ok(outcome) => {
                    if outcome.is_pushed() {
                        pushed += 1;
                    }
                }
                Err(SyncError::UnknownGroup(_)) => {
                    // Pruned since it went stale.
                    capability.state_mut().clear_stale(&key);
                }
                Err(e) => return Err(e),
            }
        }
        Ok(pushed)
    }

    /// Drops cached digests so the next sync for `owner` always pushes.
    pub fn forget(&self, owner: OwnerId) {
        self.tracker.lock().forget(owner);
    }

    /// Number of owners with cached digests.
    pub fn tracked_owners(&self) -> usize {
        self.tracker.lock().len()
    }

    fn send(&self, message: SyncMessage) -> SyncResult<()> {
        let owner = message.owner;
        self.transport.send(message).inspect_err(|e| {
            warn!("Sync push for {} failed: {}", owner, e);
        })
    }
}

fn group_digests(capability: &EquipmentCapability) -> SyncResult<HashMap<String, Digest>> {
    capability
        .groups()
        .map(|(key, slots)| {
            let bytes = GroupRecord::new(key, slots.to_vec()).encode()?;
            Ok((key.to_string(), Digest::of(&bytes)))
        })
        .collect()
}
