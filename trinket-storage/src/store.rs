//! Blocking, crash-safe record store.
//!
//! Writes go temp file → backup rotation → atomic rename, so a reader never
//! sees a half-written main file and a crash at any step leaves either the
//! old or the new state recoverable. All methods block on disk I/O; async
//! callers go through [`PersistenceService`](crate::PersistenceService).

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{debug, info, warn};
use trinket_types::{CapabilityRecord, Digest, OwnerId};

use crate::codec;
use crate::config::StoreConfig;
use crate::error::{StorageError, StorageResult};
use crate::paths::RecordPaths;

/// Result of a save request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    /// The record replaced the main file.
    Written { digest: Digest },
    /// The record has no groups; nothing was written.
    SkippedEmpty,
    /// The main file already holds exactly these bytes.
    SkippedUnchanged { digest: Digest },
}

impl SaveOutcome {
    /// True if the disk now reflects the saved record.
    pub fn is_durable(&self) -> bool {
        !matches!(self, Self::SkippedEmpty)
    }
}

/// Which file a load was served from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadSource {
    Main,
    /// An orphaned temp file from an interrupted save was promoted to main.
    RecoveredTemp,
    /// `bakN` was the newest valid file and has been rewritten to main.
    Backup(usize),
    /// Nothing usable on disk.
    Fresh,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadOutcome {
    pub record: Option<CapabilityRecord>,
    pub source: LoadSource,
}

/// Health of one file in an owner's file set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileStatus {
    Missing,
    Valid {
        digest: Digest,
        groups: usize,
        items: usize,
    },
    Corrupt {
        digest: Digest,
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileReport {
    pub path: PathBuf,
    pub status: FileStatus,
}

#[derive(Debug, Clone)]
pub struct DurableStore {
    config: StoreConfig,
    dir: PathBuf,
}

impl DurableStore {
    pub fn new(config: StoreConfig) -> Self {
        let dir = config.kind_dir();
        Self { config, dir }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Directory holding this store's files.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn paths(&self, owner: OwnerId) -> RecordPaths {
        RecordPaths::new(&self.dir, owner, self.config.backup_retention)
    }

    /// Writes `record` for `owner` unless it is trivial or unchanged.
    pub fn save(&self, owner: OwnerId, record: &CapabilityRecord) -> StorageResult<SaveOutcome> {
        if record.is_trivial() {
            debug!("Skipping save for {}: record has no groups", owner);
            return Ok(SaveOutcome::SkippedEmpty);
        }

        let bytes = codec::encode(record)?;
        let digest = Digest::of(&bytes);
        let paths = self.paths(owner);

        if read_digest(&paths.main)? == Some(digest) {
            debug!("Skipping save for {}: unchanged ({})", owner, digest);
            return Ok(SaveOutcome::SkippedUnchanged { digest });
        }

        self.stage(owner, &bytes)?;
        self.rotate_backups(&paths)?;
        fs::rename(&paths.tmp, &paths.main)?;
        self.prune_backups(&paths);

        debug!(
            "Saved {} ({} bytes, {} items, {})",
            owner,
            bytes.len(),
            record.item_count(),
            digest
        );
        Ok(SaveOutcome::Written { digest })
    }

    /// Writes encoded bytes to the owner's temp file and syncs them.
    ///
    /// This is the first step of [`save`](Self::save). A temp file left
    /// behind by a crash is promoted on the next [`load`](Self::load).
    pub fn stage(&self, owner: OwnerId, bytes: &[u8]) -> StorageResult<PathBuf> {
        fs::create_dir_all(&self.dir)?;
        let tmp = self.paths(owner).tmp;
        write_synced(&tmp, bytes)?;
        Ok(tmp)
    }

    /// Shifts `bakN` to `bakN+1` (dropping the oldest) and copies the
    /// current main file to `bak1`.
    fn rotate_backups(&self, paths: &RecordPaths) -> io::Result<()> {
        if paths.backups.is_empty() || !paths.main.exists() {
            return Ok(());
        }
        remove_if_exists(&paths.backups[paths.backups.len() - 1])?;
        for n in (1..paths.backups.len()).rev() {
            let from = &paths.backups[n - 1];
            if from.exists() {
                fs::rename(from, &paths.backups[n])?;
            }
        }
        fs::copy(&paths.main, &paths.backups[0])?;
        Ok(())
    }

    /// Deletes backups older than the configured age, oldest first, but
    /// never the last remaining one. Failures are only logged.
    fn prune_backups(&self, paths: &RecordPaths) {
        let Some(cutoff) = SystemTime::now().checked_sub(self.config.backup_max_age) else {
            return;
        };
        let existing: Vec<&PathBuf> = paths.backups.iter().filter(|p| p.exists()).collect();
        let mut remaining = existing.len();

        for path in existing.into_iter().rev() {
            if remaining <= 1 {
                break;
            }
            let expired = match fs::metadata(path).and_then(|m| m.modified()) {
                Ok(modified) => modified < cutoff,
                Err(e) => {
                    warn!("Cannot read age of {}: {}", path.display(), e);
                    continue;
                }
            };
            if !expired {
                continue;
            }
            match fs::remove_file(path) {
                Ok(()) => {
                    debug!("Pruned expired backup {}", path.display());
                    remaining -= 1;
                }
                Err(e) => warn!("Failed to prune {}: {}", path.display(), e),
            }
        }
    }

    /// Loads the newest valid record for `owner`.
    ///
    /// Recovers orphaned temp files first, then tries main and the backups
    /// newest-first. A backup winner is written back to main. Never fails
    /// because of corrupt data; only unexpected I/O errors are returned.
    pub fn load(&self, owner: OwnerId) -> StorageResult<LoadOutcome> {
        let paths = self.paths(owner);
        let recovered = match self.recover_orphans(&paths) {
            Ok(recovered) => recovered,
            Err(e) => {
                warn!("Crash recovery for {} failed: {}", owner, e);
                false
            }
        };

        let mut seen_any = false;
        match read_candidate(&paths.main) {
            Ok(Some((record, _))) => {
                let source = if recovered {
                    LoadSource::RecoveredTemp
                } else {
                    LoadSource::Main
                };
                return Ok(LoadOutcome {
                    record: Some(record),
                    source,
                });
            }
            Ok(None) => {}
            Err(e) => {
                seen_any = true;
                warn!("Main record for {} unusable: {}", owner, e);
            }
        }

        for (index, backup) in paths.backups.iter().enumerate() {
            match read_candidate(backup) {
                Ok(Some((record, bytes))) => {
                    let slot = index + 1;
                    info!("Restoring {} from backup {}", owner, slot);
                    self.stage(owner, &bytes)?;
                    fs::rename(&paths.tmp, &paths.main)?;
                    return Ok(LoadOutcome {
                        record: Some(record),
                        source: LoadSource::Backup(slot),
                    });
                }
                Ok(None) => {}
                Err(e) => {
                    seen_any = true;
                    warn!("Backup {} for {} unusable: {}", index + 1, owner, e);
                }
            }
        }

        if seen_any {
            warn!("No valid record for {}; starting with an empty capability", owner);
        } else {
            debug!("No record for {} yet", owner);
        }
        Ok(LoadOutcome {
            record: None,
            source: LoadSource::Fresh,
        })
    }

    /// Promotes a valid orphaned temp file to main; deletes invalid ones.
    /// Returns true if main was replaced.
    fn recover_orphans(&self, paths: &RecordPaths) -> StorageResult<bool> {
        let mut recovered = false;
        for orphan in [&paths.recovered, &paths.tmp] {
            let bytes = match fs::read(orphan) {
                Ok(bytes) => bytes,
                Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
                Err(e) => return Err(e.into()),
            };
            if let Err(e) = codec::decode(orphan, &bytes) {
                warn!("Discarding unreadable orphan {}: {}", orphan.display(), e);
                remove_if_exists(orphan)?;
                continue;
            }
            if orphan != &paths.recovered {
                fs::rename(orphan, &paths.recovered)?;
            }
            self.rotate_backups(paths)?;
            fs::rename(&paths.recovered, &paths.main)?;
            info!(
                "Recovered interrupted save into {}",
                paths.main.display()
            );
            recovered = true;
        }
        Ok(recovered)
    }

    /// Reports the state of every file in the owner's set. Read-only.
    pub fn inspect(&self, owner: OwnerId) -> StorageResult<Vec<FileReport>> {
        self.paths(owner)
            .all()
            .map(|path| -> StorageResult<FileReport> {
                let status = match fs::read(path) {
                    Ok(bytes) => {
                        let digest = Digest::of(&bytes);
                        match codec::decode(path, &bytes) {
                            Ok(record) => FileStatus::Valid {
                                digest,
                                groups: record.groups.len(),
                                items: record.item_count(),
                            },
                            Err(e) => FileStatus::Corrupt {
                                digest,
                                reason: e.to_string(),
                            },
                        }
                    }
                    Err(e) if e.kind() == io::ErrorKind::NotFound => FileStatus::Missing,
                    Err(e) => return Err(StorageError::Io(e)),
                };
                Ok(FileReport {
                    path: path.to_path_buf(),
                    status,
                })
            })
            .collect()
    }
}

fn write_synced(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(bytes)?;
    file.sync_all()
}

fn remove_if_exists(path: &Path) -> io::Result<()> {
    match fs::remove_file(path) {
        Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
        _ => Ok(()),
    }
}

fn read_digest(path: &Path) -> io::Result<Option<Digest>> {
    match fs::read(path) {
        Ok(bytes) => Ok(Some(Digest::of(&bytes))),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}

/// `Ok(None)` if the file is absent, `Err` if it exists but is unusable.
fn read_candidate(path: &Path) -> StorageResult<Option<(CapabilityRecord, Vec<u8>)>> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(StorageError::Io(e)),
    };
    let record = codec::decode(path, &bytes)?;
    Ok(Some((record, bytes)))
}
