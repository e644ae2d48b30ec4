//! Errors reported by the host while applying derived effects.

use thiserror::Error;
use trinket_model::StatId;

/// Result type for host callbacks.
pub type HostResult<T> = Result<T, HostError>;

/// A host callback refused or failed an operation.
///
/// These never escape the capability: they are logged once per cause and
/// the remaining modifiers are still applied.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum HostError {
    /// The owner has no such stat.
    #[error("owner has no stat `{0}`")]
    MissingStat(StatId),

    /// A modifier with the same key is already applied.
    #[error("modifier `{0}` is already applied")]
    DuplicateModifier(String),

    /// The host rejected the modifier for its own reasons.
    #[error("modifier `{key}` rejected: {reason}")]
    Rejected { key: String, reason: String },
}
