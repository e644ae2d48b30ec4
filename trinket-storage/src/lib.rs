//! Durable storage for Trinket capability records.
//!
//! Each owner's record lives in a small file set under `<root>/<kind>/`:
//!
//! - `<owner>.dat` — the current record (gzip-compressed MessagePack)
//! - `<owner>.dat.tmp` — an in-flight write
//! - `<owner>.dat.bak1` … `bak5` — rotating backups, newest first
//! - `<owner>.dat.recovered.tmp` — transient, only during crash recovery
//!
//! [`DurableStore`] implements the blocking save and load paths;
//! [`PersistenceService`] runs them on a single background worker so the
//! host thread never waits on the disk.

pub mod codec;
mod config;
mod error;
mod paths;
mod service;
mod store;

pub use config::StoreConfig;
pub use error::{StorageError, StorageResult};
pub use paths::RecordPaths;
pub use service::PersistenceService;
pub use store::{DurableStore, FileReport, FileStatus, LoadOutcome, LoadSource, SaveOutcome};
