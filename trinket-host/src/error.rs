//! Error types for owner sessions.

use thiserror::Error;
use trinket_storage::StorageError;
use trinket_sync::SyncError;
use trinket_types::OwnerId;

/// Result type for session operations.
pub type SessionResult<T> = Result<T, SessionError>;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("sync error: {0}")]
    Sync(#[from] SyncError),

    /// The owner has no live session.
    #[error("owner {0} is not connected")]
    NotConnected(OwnerId),
}
