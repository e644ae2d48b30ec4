//! Owner sessions: the glue between host lifecycle events and the engine.
//!
//! A host creates one [`Sessions`] at startup, inside a tokio runtime, and
//! calls into it from its main thread: `connect` on login, `equip` from the
//! UI, `tick` every game tick, `autosave` on a timer and `disconnect` on
//! logout. Disk work happens on the persistence worker; the calling thread
//! only takes snapshots.

use std::sync::Arc;
use tracing::{debug, info, warn};
use trinket_capability::{
    CapabilityCache, EquipContext, EquipOutcome, EquipmentCapability, Owner, SharedCapability,
    WarnLimiter,
};
use trinket_model::{GroupRegistry, ItemCatalog, SlotLayoutDefinition};
use trinket_storage::{LoadSource, PersistenceService, StorageError};
use trinket_sync::{SyncEngine, SyncTransport};
use trinket_types::{CapabilityRecord, ItemStack, OwnerId};

use crate::config::HostConfig;
use crate::error::{SessionError, SessionResult};

pub struct Sessions {
    registry: GroupRegistry,
    catalog: Box<dyn ItemCatalog + Send + Sync>,
    limiter: WarnLimiter,
    cache: CapabilityCache,
    persistence: PersistenceService,
    sync: SyncEngine,
}

impl Sessions {
    /// Starts the persistence worker and returns an empty session table.
    pub fn start(
        config: HostConfig,
        catalog: impl ItemCatalog + Send + Sync + 'static,
        transport: Arc<dyn SyncTransport>,
    ) -> Self {
        let persistence = PersistenceService::spawn(config.store);
        info!(
            "Sessions started (records in {})",
            persistence.store().dir().display()
        );
        Self {
            registry: GroupRegistry::new(),
            catalog: Box::new(catalog),
            limiter: WarnLimiter::new(config.warn_interval),
            cache: CapabilityCache::new(config.capability),
            persistence,
            sync: SyncEngine::new(transport, config.sync),
        }
    }

    pub fn registry(&self) -> &GroupRegistry {
        &self.registry
    }

    pub fn cache(&self) -> &CapabilityCache {
        &self.cache
    }

    pub fn persistence(&self) -> &PersistenceService {
        &self.persistence
    }

    pub fn sync(&self) -> &SyncEngine {
        &self.sync
    }

    pub fn limiter(&self) -> &WarnLimiter {
        &self.limiter
    }

    pub fn ctx(&self) -> EquipContext<'_> {
        EquipContext::new(&self.registry, &*self.catalog, &self.limiter)
    }

    /// Replaces every layout. Live capabilities pick the change up on their
    /// owner's next tick or equip.
    pub fn reload_layouts(&mut self, definitions: impl IntoIterator<Item = SlotLayoutDefinition>) {
        self.registry.reload(definitions);
        info!(
            "Layouts reloaded: {} group(s), generation {}",
            self.registry.len(),
            self.registry.generation()
        );
    }

    /// Restores `owner`'s capability from disk (or starts it empty), fits it
    /// to the current layouts, reapplies its effects and pushes a full sync.
    ///
    /// An owner that is already live keeps its in-memory state; only the
    /// login reapply and the full sync run again. Fails only if the store
    /// could not be read at all; corrupt files fall back to backups or an
    /// empty capability.
    pub async fn connect(&self, owner: &mut dyn Owner) -> SessionResult<SharedCapability> {
        let id = owner.id();
        if let Some(shared) = self.cache.get(id).filter(|s| s.lock().is_active()) {
            debug!("{} is already live; keeping in-memory state", id);
            self.enter(&shared, owner, None);
            return Ok(shared);
        }

        let loaded = self.persistence.load(id).await?;
        match loaded.source {
            LoadSource::Main | LoadSource::Fresh => {}
            source => info!("Record for {} restored via {:?}", id, source),
        }

        let shared = self.cache.get_or_create(id);
        self.enter(&shared, owner, loaded.record);
        debug!("Connected {}", id);
        Ok(shared)
    }

    fn enter(
        &self,
        shared: &SharedCapability,
        owner: &mut dyn Owner,
        record: Option<CapabilityRecord>,
    ) {
        let ctx = self.ctx();
        let mut capability = shared.lock();
        if let Some(record) = record {
            capability.load_record(&ctx, record);
        }
        capability.reapply_on_login(&ctx, owner);
        if let Err(e) = self.sync.force_sync_full(&mut capability) {
            debug!("Initial sync for {} deferred: {}", owner.id(), e);
        }
    }

    fn shared(&self, owner: OwnerId) -> SessionResult<SharedCapability> {
        self.cache
            .get(owner)
            .ok_or(SessionError::NotConnected(owner))
    }

    /// Equips `item` into `key[slot]` for a connected owner.
    pub fn equip(
        &self,
        owner: &mut dyn Owner,
        key: &str,
        slot: usize,
        item: ItemStack,
    ) -> SessionResult<EquipOutcome> {
        let shared = self.shared(owner.id())?;
        let mut capability = shared.lock();
        let outcome = capability.set_item(&self.ctx(), owner, key, slot, item);
        if outcome.is_equipped() && self.sync.config().push_on_equip {
            self.push_stale(&mut capability);
        }
        Ok(outcome)
    }

    /// Per-tick upkeep: layout drift, health normalization, stale pushes.
    pub fn tick(&self, owner: &mut dyn Owner) -> SessionResult<()> {
        let shared = self.shared(owner.id())?;
        let mut capability = shared.lock();
        capability.tick(&self.ctx(), owner);
        if capability.state().has_stale() {
            self.push_stale(&mut capability);
        }
        Ok(())
    }

    pub fn respawn(&self, owner: &mut dyn Owner) -> SessionResult<()> {
        let shared = self.shared(owner.id())?;
        let mut capability = shared.lock();
        capability.reapply_on_respawn(&self.ctx(), owner);
        self.push_stale(&mut capability);
        Ok(())
    }

    fn push_stale(&self, capability: &mut EquipmentCapability) {
        // Failed groups stay stale and are retried on the next tick.
        if let Err(e) = self.sync.sync_stale(capability) {
            debug!("Stale push interrupted: {}", e);
        }
    }

    /// Queues a save for every dirty capability. Returns how many were
    /// queued; the rest stay dirty for the next round.
    pub fn autosave(&self) -> usize {
        let mut queued = 0;
        for id in self.cache.owners() {
            let Some(shared) = self.cache.get(id) else {
                continue;
            };
            let mut capability = shared.lock();
            self.persistence.reconcile(&mut capability);
            match self.persistence.save_if_dirty(&capability) {
                Ok(Some(_)) => queued += 1,
                Ok(None) => {}
                Err(StorageError::QueueFull) => {
                    warn!("Save queue full; remaining owners wait for the next autosave");
                    break;
                }
                Err(e) => warn!("Autosave for {} failed: {}", id, e),
            }
        }
        if queued > 0 {
            debug!("Autosave queued {} record(s)", queued);
        }
        queued
    }

    /// Snapshots and queues a save for one owner regardless of dirtiness.
    pub fn save_now(&self, owner: OwnerId) -> SessionResult<u64> {
        let shared = self.shared(owner)?;
        let capability = shared.lock();
        Ok(self.persistence.save_now(&capability)?)
    }

    /// Queues a final save, then drops every per-owner cache.
    ///
    /// The save is ordered before any later load of the same owner, so an
    /// immediate reconnect sees it. If the save cannot be queued the
    /// session is kept so the caller can retry.
    pub async fn disconnect(&self, owner: OwnerId) -> SessionResult<()> {
        let shared = self.shared(owner)?;
        let (record, revision) = {
            let capability = shared.lock();
            (capability.to_record(), capability.revision())
        };
        self.enqueue(owner, record, revision).await?;
        self.persistence.forget(owner).await?;

        self.cache.evict(owner);
        self.sync.forget(owner);
        self.limiter.clear_owner(owner);
        debug!("Disconnected {}", owner);
        Ok(())
    }

    /// Queues a save, waiting for the queue to drain once if it is full.
    async fn enqueue(
        &self,
        owner: OwnerId,
        record: CapabilityRecord,
        revision: u64,
    ) -> SessionResult<()> {
        match self.persistence.request_save(owner, record.clone(), revision) {
            Err(StorageError::QueueFull) => {
                self.persistence.flush().await?;
                self.persistence.request_save(owner, record, revision)?;
                Ok(())
            }
            result => Ok(result?),
        }
    }

    /// Saves every dirty capability and stops the persistence worker.
    pub async fn shutdown(&mut self) {
        for id in self.cache.owners() {
            let Some(shared) = self.cache.get(id) else {
                continue;
            };
            let snapshot = {
                let mut capability = shared.lock();
                self.persistence.reconcile(&mut capability);
                capability
                    .is_dirty()
                    .then(|| (capability.to_record(), capability.revision()))
            };
            if let Some((record, revision)) = snapshot {
                if let Err(e) = self.enqueue(id, record, revision).await {
                    warn!("Final save for {} failed: {}", id, e);
                }
            }
        }
        self.persistence.shutdown().await;
        info!("Sessions stopped");
    }
}
