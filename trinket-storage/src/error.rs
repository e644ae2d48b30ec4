//! Error types for the storage layer.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur in storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// IO error (file system).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Record could not be encoded or failed structural validation.
    #[error("record error: {0}")]
    Record(#[from] trinket_types::Error),

    /// A stored file is not a readable record.
    #[error("corrupt record at {}: {reason}", path.display())]
    Corrupt { path: PathBuf, reason: String },

    /// The capability has no owner yet, so there is nowhere to save it.
    #[error("capability has no owner")]
    NoOwner,

    /// The worker queue is full; the caller should retry later.
    #[error("persistence queue is full")]
    QueueFull,

    /// The worker has shut down.
    #[error("persistence worker has stopped")]
    WorkerStopped,

    /// A blocking disk task panicked or was cancelled.
    #[error("background task failed: {0}")]
    Task(String),
}
