//! Async persistence worker.
//!
//! A single consumer task drains a bounded queue. Each disk operation runs
//! on the blocking pool and is awaited before the next command is taken, so
//! writes for one owner land in submission order and an "unchanged" check
//! always compares against the latest completed write.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use trinket_capability::EquipmentCapability;
use trinket_types::{CapabilityRecord, OwnerId};

use crate::config::StoreConfig;
use crate::error::{StorageError, StorageResult};
use crate::store::{DurableStore, LoadOutcome, SaveOutcome};

/// Latest durably stored revision per owner.
type SavedRevisions = Arc<Mutex<HashMap<OwnerId, u64>>>;

enum Command {
    Save {
        owner: OwnerId,
        record: CapabilityRecord,
        revision: u64,
    },
    Load {
        owner: OwnerId,
        reply: oneshot::Sender<StorageResult<LoadOutcome>>,
    },
    Forget {
        owner: OwnerId,
    },
    Flush {
        reply: oneshot::Sender<()>,
    },
}

/// Handle to the persistence worker.
pub struct PersistenceService {
    store: Arc<DurableStore>,
    command_tx: Option<mpsc::Sender<Command>>,
    worker: Option<JoinHandle<()>>,
    saved: SavedRevisions,
    shutdown_timeout: Duration,
}

impl PersistenceService {
    /// Starts the worker on the current tokio runtime.
    pub fn spawn(config: StoreConfig) -> Self {
        let shutdown_timeout = config.shutdown_timeout;
        let (command_tx, command_rx) = mpsc::channel(config.queue_capacity.max(1));
        let store = Arc::new(DurableStore::new(config));
        let saved = SavedRevisions::default();

        let worker = tokio::spawn(Self::run_worker(
            Arc::clone(&store),
            command_rx,
            Arc::clone(&saved),
        ));
        info!("Persistence worker started for {}", store.dir().display());

        Self {
            store,
            command_tx: Some(command_tx),
            worker: Some(worker),
            saved,
            shutdown_timeout,
        }
    }

    /// The blocking store behind the worker.
    pub fn store(&self) -> &DurableStore {
        &self.store
    }

    pub fn is_running(&self) -> bool {
        self.command_tx
            .as_ref()
            .is_some_and(|tx| !tx.is_closed())
    }

    /// Enqueues a save without waiting. On error the caller's capability
    /// stays dirty and is retried on the next trigger.
    pub fn request_save(
        &self,
        owner: OwnerId,
        record: CapabilityRecord,
        revision: u64,
    ) -> StorageResult<()> {
        let tx = self.command_tx.as_ref().ok_or(StorageError::WorkerStopped)?;
        tx.try_send(Command::Save {
            owner,
            record,
            revision,
        })
        .map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => StorageError::QueueFull,
            mpsc::error::TrySendError::Closed(_) => StorageError::WorkerStopped,
        })
    }

    /// Snapshots `capability` on the calling thread and enqueues it.
    /// Returns the revision that will be acknowledged once written.
    pub fn save_now(&self, capability: &EquipmentCapability) -> StorageResult<u64> {
        let owner = capability.owner_id().ok_or(StorageError::NoOwner)?;
        let revision = capability.revision();
        self.request_save(owner, capability.to_record(), revision)?;
        Ok(revision)
    }

    /// [`save_now`](Self::save_now) if the capability has unsaved changes.
    pub fn save_if_dirty(&self, capability: &EquipmentCapability) -> StorageResult<Option<u64>> {
        if capability.is_dirty() {
            self.save_now(capability).map(Some)
        } else {
            Ok(None)
        }
    }

    /// Loads the owner's record after every previously queued command.
    ///
    /// Also resets the owner's acknowledged revision, since the loaded
    /// record starts a fresh capability.
    pub async fn load(&self, owner: OwnerId) -> StorageResult<LoadOutcome> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Load { owner, reply }).await?;
        rx.await.map_err(|_| StorageError::WorkerStopped)?
    }

    /// Waits until every command queued before this call has finished.
    pub async fn flush(&self) -> StorageResult<()> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Flush { reply }).await?;
        rx.await.map_err(|_| StorageError::WorkerStopped)
    }

    /// Drops the owner's acknowledged revision once every command queued
    /// before this call has run. Used when an owner leaves for good.
    pub async fn forget(&self, owner: OwnerId) -> StorageResult<()> {
        self.send(Command::Forget { owner }).await
    }

    async fn send(&self, command: Command) -> StorageResult<()> {
        let tx = self.command_tx.as_ref().ok_or(StorageError::WorkerStopped)?;
        tx.send(command)
            .await
            .map_err(|_| StorageError::WorkerStopped)
    }

    /// Latest revision acknowledged as stored for `owner`.
    pub fn saved_revision(&self, owner: OwnerId) -> Option<u64> {
        self.saved.lock().get(&owner).copied()
    }

    /// Marks `capability` clean up to its last acknowledged revision.
    pub fn reconcile(&self, capability: &mut EquipmentCapability) {
        let Some(owner) = capability.owner_id() else {
            return;
        };
        if let Some(revision) = self.saved_revision(owner) {
            capability.mark_saved(revision);
        }
    }

    /// Closes the queue and waits for the worker to drain, aborting it if
    /// it takes longer than the configured timeout.
    pub async fn shutdown(&mut self) {
        let Some(command_tx) = self.command_tx.take() else {
            return;
        };
        drop(command_tx);
        let Some(worker) = self.worker.take() else {
            return;
        };
        let abort = worker.abort_handle();
        match tokio::time::timeout(self.shutdown_timeout, worker).await {
            Ok(Ok(())) => info!("Persistence worker stopped"),
            Ok(Err(e)) => warn!("Persistence worker failed: {}", e),
            Err(_) => {
                warn!(
                    "Persistence worker did not drain within {:?}; aborting",
                    self.shutdown_timeout
                );
                abort.abort();
            }
        }
    }

    async fn run_worker(
        store: Arc<DurableStore>,
        mut command_rx: mpsc::Receiver<Command>,
        saved: SavedRevisions,
    ) {
        while let Some(command) = command_rx.recv().await {
            match command {
                Command::Save {
                    owner,
                    record,
                    revision,
                } => {
                    let task_store = Arc::clone(&store);
                    let result =
                        tokio::task::spawn_blocking(move || task_store.save(owner, &record)).await;
                    match result {
                        Ok(Ok(outcome)) => {
                            if let SaveOutcome::Written { digest } = outcome {
                                debug!("Wrote revision {} for {} ({})", revision, owner, digest);
                            }
                            let mut saved = saved.lock();
                            let entry = saved.entry(owner).or_insert(0);
                            *entry = (*entry).max(revision);
                        }
                        Ok(Err(e)) => warn!("Save for {} failed: {}", owner, e),
                        Err(e) => warn!("Save task for {} failed: {}", owner, e),
                    }
                }
                Command::Load { owner, reply } => {
                    let task_store = Arc::clone(&store);
                    let result = tokio::task::spawn_blocking(move || task_store.load(owner))
                        .await
                        .map_err(|e| StorageError::Task(e.to_string()))
                        .and_then(|loaded| loaded);
                    saved.lock().remove(&owner);
                    let _ = reply.send(result);
                }
                Command::Forget { owner } => {
                    saved.lock().remove(&owner);
                }
                Command::Flush { reply } => {
                    let _ = reply.send(());
                }
            }
        }
        debug!("Persistence queue closed; worker exiting");
    }
}
