//! Receiving side: applies pushed state to read-only mirror capabilities.

use std::collections::HashMap;
use tracing::debug;
use trinket_capability::{CapabilityConfig, EquipContext, EquipmentCapability, Owner};
use trinket_types::OwnerId;

use crate::error::{SyncError, SyncResult};
use crate::protocol::{SyncMessage, SyncPayload};

/// Mirror capabilities of remote owners, keyed by owner.
#[derive(Debug, Default)]
pub struct RemoteMirror {
    capabilities: HashMap<OwnerId, EquipmentCapability>,
    config: CapabilityConfig,
}

impl RemoteMirror {
    pub fn new(config: CapabilityConfig) -> Self {
        Self {
            capabilities: HashMap::new(),
            config,
        }
    }

    /// Applies a pushed message to the mirror of `owner`.
    ///
    /// Groups the local registry does not know are logged and skipped. The
    /// mirror is re-fitted to the local layouts and its effects re-applied
    /// to `owner` for immediate consistency.
    pub fn apply(
        &mut self,
        ctx: &EquipContext<'_>,
        message: &SyncMessage,
        owner: &mut dyn Owner,
    ) -> SyncResult<()> {
        let actual = owner.id();
        if message.owner != actual {
            return Err(SyncError::OwnerMismatch {
                expected: message.owner,
                actual,
            });
        }
        let payload = message.decode()?;

        let capability = self.capabilities.entry(actual).or_insert_with(|| {
            let mut capability = EquipmentCapability::new(self.config.clone());
            capability.set_owner(actual);
            capability
        });

        match payload {
            SyncPayload::Full(record) => capability.load_record(ctx, record),
            SyncPayload::Group(record) => {
                capability.load_group_record(ctx, record);
            }
        }

        let displaced = capability.initialize_groups_if_missing(ctx.registry);
        if !displaced.is_empty() {
            debug!(
                "Mirror of {} dropped {} item(s) that no longer fit",
                actual,
                displaced.len()
            );
        }
        capability.apply_all_attributes(ctx, owner);
        Ok(())
    }

    pub fn get(&self, owner: OwnerId) -> Option<&EquipmentCapability> {
        self.capabilities.get(&owner)
    }

    pub fn forget(&mut self, owner: OwnerId) -> Option<EquipmentCapability> {
        self.capabilities.remove(&owner)
    }

    pub fn len(&self) -> usize {
        self.capabilities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.capabilities.is_empty()
    }
}
