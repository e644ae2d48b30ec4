//! Error types for the sync layer.

use thiserror::Error;
use trinket_types::OwnerId;

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that can occur while pushing or applying state.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Payload could not be encoded or decoded.
    #[error("record error: {0}")]
    Record(#[from] trinket_types::Error),

    /// The transport refused or lost the message.
    #[error("transport error: {0}")]
    Transport(String),

    /// Message does not fit its envelope.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// The capability has no owner attached yet.
    #[error("capability has no owner")]
    NoOwner,

    /// The capability holds no group with this key.
    #[error("no group `{0}` to sync")]
    UnknownGroup(String),

    /// A message was addressed to a different owner.
    #[error("message for {expected} delivered to {actual}")]
    OwnerMismatch { expected: OwnerId, actual: OwnerId },

    /// Channel closed.
    #[error("channel closed")]
    ChannelClosed,
}
